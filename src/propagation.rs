// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Expands the junction removal set to every dependent entity.
//!
//! Each class is decided in one forward sweep and only ever reads the final
//! sets of the classes decided before it:
//! junction -> lane -> edge -> traffic light -> connection -> roundabout.

use crate::bbox::Partition;
use crate::document::NetDocument;
use crate::errors::{ConsistencyError, DanglingReference, EntityClass};
use ahash::AHashSet as HashSet;
use tracing::debug;

/// Final keep/remove decisions for one net document. Connections and
/// roundabouts have no id of their own and are keyed by document ordinal.
#[derive(Clone, Debug, Default)]
pub struct RemovalPlan {
    pub junctions: Partition<String>,
    pub lanes: Partition<String>,
    pub edges: Partition<String>,
    pub tl_programs: Partition<String>,
    pub connections: Partition<usize>,
    pub roundabouts: Partition<usize>,
    pub warnings: Vec<DanglingReference>,
}

pub fn propagate(doc: &NetDocument, junctions: Partition<String>) -> RemovalPlan {
    let lane_owners = doc.lane_owners();
    let mut warnings = Vec::new();

    // junction -> lane
    let mut lanes: Partition<String> = Partition::default();
    for record in &doc.junctions {
        let junction = &record.data;
        let removed = junctions.remove.contains(&junction.id);

        for lane in junction.lanes() {
            if removed {
                if !lane_owners.contains_key(lane.as_str()) {
                    warnings.push(DanglingReference {
                        class: EntityClass::Lane,
                        id: lane.clone(),
                        referenced_by: format!("junction '{}'", junction.id),
                    });
                }
                lanes.remove.insert(lane.clone());
            } else {
                lanes.keep.insert(lane.clone());
            }
        }
    }
    lanes.resolve_conflicts();

    // lane/junction -> edge. Any removed lane takes the whole edge with it.
    let mut edges: Partition<String> = Partition::default();
    for record in &doc.edges {
        let edge = &record.data;
        let endpoint_removed = [&edge.from, &edge.to]
            .into_iter()
            .flatten()
            .any(|junction| junctions.remove.contains(junction));
        let lane_removed = edge.lanes.iter().any(|lane| lanes.remove.contains(lane));

        if endpoint_removed || lane_removed {
            edges.remove.insert(edge.id.clone());
            lanes.remove.extend(edge.lanes.iter().cloned());
        } else {
            edges.keep.insert(edge.id.clone());
            lanes.keep.extend(edge.lanes.iter().cloned());
        }
    }
    lanes.resolve_conflicts();

    // junction -> traffic light
    let mut tl_programs: Partition<String> = Partition::default();
    for record in &doc.tl_programs {
        let id = &record.data.id;
        if junctions.remove.contains(id) {
            tl_programs.remove.insert(id.clone());
        } else {
            tl_programs.keep.insert(id.clone());
        }
    }

    // edge/lane/traffic light -> connection. A tl id is a junction id even
    // when its program is not in this document.
    let defined_edges: HashSet<&str> = doc.edges.iter().map(|e| e.data.id.as_str()).collect();
    let mut connections: Partition<usize> = Partition::default();
    for (index, record) in doc.connections.iter().enumerate() {
        let connection = &record.data;

        for edge in [&connection.from, &connection.to] {
            if !defined_edges.contains(edge.as_str()) {
                warnings.push(DanglingReference {
                    class: EntityClass::Edge,
                    id: edge.clone(),
                    referenced_by: format!("connection '{}'", connection.label()),
                });
            }
        }

        let removed = edges.remove.contains(&connection.from)
            || edges.remove.contains(&connection.to)
            || connection
                .lane_ids()
                .iter()
                .any(|lane| lanes.remove.contains(lane))
            || connection.tl.as_ref().is_some_and(|tl| {
                tl_programs.remove.contains(tl) || junctions.remove.contains(tl)
            });

        if removed {
            connections.remove.insert(index);
        } else {
            connections.keep.insert(index);
        }
    }

    // junction/edge -> roundabout
    let mut roundabouts: Partition<usize> = Partition::default();
    for (index, record) in doc.roundabouts.iter().enumerate() {
        let roundabout = &record.data;
        let removed = roundabout
            .nodes
            .iter()
            .any(|node| junctions.remove.contains(node))
            || roundabout
                .edges
                .iter()
                .any(|edge| edges.remove.contains(edge));

        if removed {
            roundabouts.remove.insert(index);
        } else {
            roundabouts.keep.insert(index);
        }
    }

    debug!(
        "Propagated removals: {} lanes, {} edges, {} traffic lights, {} connections, {} roundabouts",
        lanes.remove.len(),
        edges.remove.len(),
        tl_programs.remove.len(),
        connections.remove.len(),
        roundabouts.remove.len()
    );

    RemovalPlan {
        junctions,
        lanes,
        edges,
        tl_programs,
        connections,
        roundabouts,
        warnings,
    }
}

impl RemovalPlan {
    /// Keep and remove must be disjoint for every class.
    pub fn check_disjoint(&self) -> Result<(), ConsistencyError> {
        self.junctions.ensure_disjoint(EntityClass::Junction)?;
        self.lanes.ensure_disjoint(EntityClass::Lane)?;
        self.edges.ensure_disjoint(EntityClass::Edge)?;
        self.tl_programs.ensure_disjoint(EntityClass::TrafficLight)?;
        self.connections.ensure_disjoint(EntityClass::Connection)?;
        self.roundabouts.ensure_disjoint(EntityClass::Roundabout)?;
        Ok(())
    }
}
