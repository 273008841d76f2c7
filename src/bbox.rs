// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::document::{Junction, Record};
use crate::errors::{ConsistencyError, EntityClass, FormatError, SubnetError};
use ahash::AHashSet as HashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive keep rectangle in net coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            xmin: 5000.0,
            xmax: 8000.0,
            ymin: 5000.0,
            ymax: 8000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Keep,
    Remove,
}

impl BoundingBox {
    pub fn validate(&self) -> Result<(), SubnetError> {
        let bounds = [self.xmin, self.xmax, self.ymin, self.ymax];
        if bounds.iter().any(|bound| !bound.is_finite()) {
            return Err(SubnetError::Config(format!(
                "bounding box bounds must be finite, got {:?}",
                self
            )));
        }
        if self.xmin > self.xmax || self.ymin > self.ymax {
            return Err(SubnetError::Config(format!(
                "bounding box is empty: x [{}, {}] y [{}, {}]",
                self.xmin, self.xmax, self.ymin, self.ymax
            )));
        }
        Ok(())
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    pub fn classify(&self, junction: &Junction) -> Placement {
        if self.contains(junction.x, junction.y) {
            Placement::Keep
        } else {
            Placement::Remove
        }
    }
}

/// Keep and remove sets for one entity class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition<K: Ord> {
    pub keep: BTreeSet<K>,
    pub remove: BTreeSet<K>,
}

impl<K: Ord> Default for Partition<K> {
    fn default() -> Self {
        Self {
            keep: BTreeSet::new(),
            remove: BTreeSet::new(),
        }
    }
}

impl<K: Ord + Clone> Partition<K> {
    /// Removal wins: anything in both sets leaves `keep`.
    pub fn resolve_conflicts(&mut self) {
        let remove = &self.remove;
        self.keep.retain(|id| !remove.contains(id));
    }

    pub fn overlap(&self) -> Vec<K> {
        self.keep.intersection(&self.remove).cloned().collect()
    }
}

impl<K: Ord + Clone + ToString> Partition<K> {
    pub fn ensure_disjoint(&self, class: EntityClass) -> Result<(), ConsistencyError> {
        let overlap = self.overlap();
        match overlap.first() {
            Some(example) => Err(ConsistencyError::OverlappingSets {
                class,
                count: overlap.len(),
                example: example.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Classifies every junction exactly once.
pub fn partition_junctions(
    bbox: &BoundingBox,
    junctions: &[Record<Junction>],
) -> Result<Partition<String>, FormatError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(junctions.len());
    let mut partition = Partition::default();

    for record in junctions {
        let junction = &record.data;

        if !seen.insert(junction.id.as_str()) {
            return Err(FormatError::DuplicateId {
                class: EntityClass::Junction,
                id: junction.id.clone(),
                line: record.line,
            });
        }

        match bbox.classify(junction) {
            Placement::Keep => partition.keep.insert(junction.id.clone()),
            Placement::Remove => partition.remove.insert(junction.id.clone()),
        };
    }

    Ok(partition)
}
