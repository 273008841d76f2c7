// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::document::{NetDocument, Record, Shape};
use crate::errors::{ConsistencyError, EntityClass};
use crate::propagation::RemovalPlan;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use tracing::info;

/// One element scheduled for removal.
#[derive(Clone, Debug, PartialEq)]
pub struct Deletion {
    pub class: EntityClass,
    pub label: String,
    pub shape: Shape,
    pub span: Range<usize>,
    pub line: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeletionCounts {
    pub simple: usize,
    pub nested: usize,
}

impl DeletionCounts {
    pub fn total(&self) -> usize {
        self.simple + self.nested
    }
}

/// Diagnostic counts of what was cut, per entity class.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub counts: BTreeMap<EntityClass, DeletionCounts>,
}

impl PruneReport {
    pub fn from_deletions(deletions: &[Deletion]) -> Self {
        let mut counts: BTreeMap<EntityClass, DeletionCounts> = BTreeMap::new();
        for deletion in deletions {
            let entry = counts.entry(deletion.class).or_default();
            match deletion.shape {
                Shape::Simple => entry.simple += 1,
                Shape::Nested => entry.nested += 1,
            }
        }
        Self { counts }
    }

    pub fn removed(&self, class: EntityClass) -> DeletionCounts {
        self.counts.get(&class).copied().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct Pruned {
    pub xml: String,
    pub report: PruneReport,
}

/// Rebuilds the net document without every element named by `plan`.
///
/// All five passes read the same plan and only schedule spans; the text is
/// assembled once at the end, so the result does not depend on pass order.
pub fn prune(
    doc: &NetDocument,
    plan: &RemovalPlan,
    verbose: bool,
) -> Result<Pruned, ConsistencyError> {
    let mut deletions = Vec::new();

    let junctions = schedule(
        EntityClass::Junction,
        &doc.junctions,
        |_, junction| plan.junctions.remove.contains(&junction.id),
        |_, junction| junction.id.clone(),
        &mut deletions,
    );
    expect_count(
        EntityClass::Junction,
        plan.junctions.remove.len(),
        junctions.len(),
    )?;

    let tl_scheduled = schedule(
        EntityClass::TrafficLight,
        &doc.tl_programs,
        |_, program| plan.tl_programs.remove.contains(&program.id),
        |_, program| match &program.program_id {
            Some(program_id) => format!("{} ({})", program.id, program_id),
            None => program.id.clone(),
        },
        &mut deletions,
    );
    // several programs may share one id
    let tl_ids: BTreeSet<&str> = tl_scheduled
        .iter()
        .map(|&index| doc.tl_programs[index].data.id.as_str())
        .collect();
    expect_count(
        EntityClass::TrafficLight,
        plan.tl_programs.remove.len(),
        tl_ids.len(),
    )?;

    let edges = schedule(
        EntityClass::Edge,
        &doc.edges,
        |_, edge| plan.edges.remove.contains(&edge.id),
        |_, edge| edge.id.clone(),
        &mut deletions,
    );
    expect_count(EntityClass::Edge, plan.edges.remove.len(), edges.len())?;

    let connections = schedule(
        EntityClass::Connection,
        &doc.connections,
        |index, _| plan.connections.remove.contains(&index),
        |_, connection| connection.label(),
        &mut deletions,
    );
    expect_count(
        EntityClass::Connection,
        plan.connections.remove.len(),
        connections.len(),
    )?;

    let roundabouts = schedule(
        EntityClass::Roundabout,
        &doc.roundabouts,
        |index, _| plan.roundabouts.remove.contains(&index),
        |_, roundabout| roundabout.nodes.join(" "),
        &mut deletions,
    );
    expect_count(
        EntityClass::Roundabout,
        plan.roundabouts.remove.len(),
        roundabouts.len(),
    )?;

    let report = PruneReport::from_deletions(&deletions);
    let xml = splice(doc.source(), &mut deletions, verbose)?;

    Ok(Pruned { xml, report })
}

fn schedule<T>(
    class: EntityClass,
    records: &[Record<T>],
    removed: impl Fn(usize, &T) -> bool,
    label: impl Fn(usize, &T) -> String,
    deletions: &mut Vec<Deletion>,
) -> Vec<usize> {
    let mut scheduled = Vec::new();
    for (index, record) in records.iter().enumerate() {
        if removed(index, &record.data) {
            deletions.push(Deletion {
                class,
                label: label(index, &record.data),
                shape: record.shape,
                span: record.span.clone(),
                line: record.line,
            });
            scheduled.push(index);
        }
    }
    scheduled
}

fn expect_count(
    class: EntityClass,
    expected: usize,
    actual: usize,
) -> Result<(), ConsistencyError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConsistencyError::DeletionCountMismatch {
            class,
            expected,
            actual,
        })
    }
}

/// Copies `source` minus every deletion span. Spans must not overlap; each
/// one is cut exactly once.
pub(crate) fn splice(
    source: &str,
    deletions: &mut [Deletion],
    verbose: bool,
) -> Result<String, ConsistencyError> {
    deletions.sort_by_key(|deletion| deletion.span.start);

    let removed_bytes: usize = deletions.iter().map(|d| d.span.len()).sum();
    let mut output = String::with_capacity(source.len().saturating_sub(removed_bytes));
    let mut cursor = 0;

    for deletion in deletions.iter() {
        if deletion.span.start < cursor {
            return Err(ConsistencyError::OverlappingSpan {
                class: deletion.class,
                label: deletion.label.clone(),
                start: deletion.span.start,
            });
        }

        if verbose {
            info!(
                "Removing {} '{}' (line {}):\n{}",
                deletion.class,
                deletion.label,
                deletion.line,
                source[deletion.span.clone()].trim_end()
            );
        }

        output.push_str(&source[cursor..deletion.span.start]);
        cursor = deletion.span.end;
    }
    output.push_str(&source[cursor..]);

    Ok(output)
}

/// Checks a re-parsed pruned document against the plan that produced it:
/// nothing removed is still present and no survivor points at a removed
/// junction, edge, lane or traffic light.
pub fn verify_net_closure(
    pruned: &NetDocument,
    plan: &RemovalPlan,
) -> Result<(), ConsistencyError> {
    for record in &pruned.junctions {
        let junction = &record.data;
        if plan.junctions.remove.contains(&junction.id) {
            return Err(ConsistencyError::StillPresent {
                class: EntityClass::Junction,
                label: junction.id.clone(),
            });
        }
    }

    for record in &pruned.tl_programs {
        let program = &record.data;
        if plan.tl_programs.remove.contains(&program.id) {
            return Err(ConsistencyError::StillPresent {
                class: EntityClass::TrafficLight,
                label: program.id.clone(),
            });
        }
    }

    for record in &pruned.edges {
        let edge = &record.data;
        if plan.edges.remove.contains(&edge.id) {
            return Err(ConsistencyError::StillPresent {
                class: EntityClass::Edge,
                label: edge.id.clone(),
            });
        }
        let endpoints = [&edge.from, &edge.to].into_iter().flatten();
        check_refs(
            EntityClass::Edge,
            &edge.id,
            EntityClass::Junction,
            endpoints,
            &plan.junctions.remove,
        )?;
        check_refs(
            EntityClass::Edge,
            &edge.id,
            EntityClass::Lane,
            edge.lanes.iter(),
            &plan.lanes.remove,
        )?;
    }

    for record in &pruned.connections {
        let connection = &record.data;
        let label = connection.label();
        check_refs(
            EntityClass::Connection,
            &label,
            EntityClass::Edge,
            [&connection.from, &connection.to].into_iter(),
            &plan.edges.remove,
        )?;
        check_refs(
            EntityClass::Connection,
            &label,
            EntityClass::Lane,
            connection.lane_ids().iter(),
            &plan.lanes.remove,
        )?;
        check_refs(
            EntityClass::Connection,
            &label,
            EntityClass::TrafficLight,
            connection.tl.iter(),
            &plan.tl_programs.remove,
        )?;
        // the program may live in an additional file, the id is still a junction id
        check_refs(
            EntityClass::Connection,
            &label,
            EntityClass::TrafficLight,
            connection.tl.iter(),
            &plan.junctions.remove,
        )?;
    }

    for record in &pruned.roundabouts {
        let roundabout = &record.data;
        let label = roundabout.nodes.join(" ");
        check_refs(
            EntityClass::Roundabout,
            &label,
            EntityClass::Junction,
            roundabout.nodes.iter(),
            &plan.junctions.remove,
        )?;
        check_refs(
            EntityClass::Roundabout,
            &label,
            EntityClass::Edge,
            roundabout.edges.iter(),
            &plan.edges.remove,
        )?;
    }

    Ok(())
}

fn check_refs<'a>(
    class: EntityClass,
    label: &str,
    target: EntityClass,
    mut ids: impl Iterator<Item = &'a String>,
    removed: &BTreeSet<String>,
) -> Result<(), ConsistencyError> {
    match ids.find(|id| removed.contains(*id)) {
        Some(target_id) => Err(ConsistencyError::DanglingSurvivor {
            class,
            label: label.to_string(),
            target,
            target_id: target_id.clone(),
        }),
        None => Ok(()),
    }
}
