// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::bbox::Partition;
use crate::document::{Record, RouteDocument, RouteEntry};
use crate::errors::{ConsistencyError, DanglingReference, EntityClass};
use crate::pruning::{Deletion, PruneReport, splice};
use ahash::AHashSet as HashSet;
use std::collections::BTreeSet;
use tracing::debug;

/// What survived the net pruning. Route entries may only use these.
#[derive(Clone, Copy, Debug)]
pub struct KeptNetwork<'a> {
    pub edges: &'a BTreeSet<String>,
    pub lanes: &'a BTreeSet<String>,
}

#[derive(Clone, Debug)]
pub struct FilteredRoutes {
    pub xml: String,
    pub report: PruneReport,
    /// Route and route distribution ids.
    pub routes: Partition<String>,
    /// Every top-level entry by document ordinal.
    pub entries: Partition<usize>,
    pub warnings: Vec<DanglingReference>,
}

/// Removes every entry that uses an edge or lane outside `kept`, or a route
/// that was itself removed.
///
/// Routes and distributions may reference each other in any document
/// order, so their removals are repeated until no more route ids fall.
/// Vehicles and the other users of routes are decided once afterwards,
/// so an entry never outlives a route it depends on.
pub fn filter_routes(
    doc: &RouteDocument,
    kept: KeptNetwork<'_>,
    verbose: bool,
) -> Result<FilteredRoutes, ConsistencyError> {
    let mut routes: Partition<String> = Partition::default();
    let mut entries: Partition<usize> = Partition::default();
    let mut warnings = Vec::new();

    loop {
        let before = entries.remove.len();
        for (index, record) in doc.entries.iter().enumerate() {
            let entry = &record.data;
            if !entry.kind.defines_routes() || entries.remove.contains(&index) {
                continue;
            }
            if is_unusable(entry, kept, &routes.remove) {
                entries.remove.insert(index);
                routes.remove.extend(entry.defines.iter().cloned());
            }
        }
        if entries.remove.len() == before {
            break;
        }
    }

    for (index, record) in doc.entries.iter().enumerate() {
        let entry = &record.data;
        if !entry.kind.defines_routes() && is_unusable(entry, kept, &routes.remove) {
            entries.remove.insert(index);
        }
    }

    for (index, record) in doc.entries.iter().enumerate() {
        if !entries.remove.contains(&index) {
            entries.keep.insert(index);
            routes.keep.extend(record.data.defines.iter().cloned());
        }
    }
    routes.resolve_conflicts();
    routes.ensure_disjoint(EntityClass::Route)?;
    entries.ensure_disjoint(EntityClass::RouteEntry)?;

    let defined: HashSet<&str> = doc
        .entries
        .iter()
        .flat_map(|record| record.data.defines.iter().map(|id| id.as_str()))
        .collect();
    for record in &doc.entries {
        for route in &record.data.route_refs {
            if !defined.contains(route.as_str()) {
                warnings.push(DanglingReference {
                    class: EntityClass::Route,
                    id: route.clone(),
                    referenced_by: record.data.label(),
                });
            }
        }
    }

    let mut deletions: Vec<Deletion> = entries
        .remove
        .iter()
        .map(|&index| deletion_for(&doc.entries[index]))
        .collect();

    let report = PruneReport::from_deletions(&deletions);
    let xml = splice(doc.source(), &mut deletions, verbose)?;

    debug!(
        "Route filter kept {} and removed {} entries",
        entries.keep.len(),
        entries.remove.len()
    );

    Ok(FilteredRoutes {
        xml,
        report,
        routes,
        entries,
        warnings,
    })
}

fn is_unusable(
    entry: &RouteEntry,
    kept: KeptNetwork<'_>,
    removed_routes: &BTreeSet<String>,
) -> bool {
    entry.edges.iter().any(|edge| !kept.edges.contains(edge))
        || entry.lanes.iter().any(|lane| !kept.lanes.contains(lane))
        || entry
            .route_refs
            .iter()
            .any(|route| removed_routes.contains(route))
}

fn deletion_for(record: &Record<RouteEntry>) -> Deletion {
    let class = if record.data.kind.defines_routes() {
        EntityClass::Route
    } else {
        EntityClass::RouteEntry
    };

    Deletion {
        class,
        label: record.data.label(),
        shape: record.shape,
        span: record.span.clone(),
        line: record.line,
    }
}

/// Every entry of a filtered document only uses kept edges, kept lanes and
/// routes that were not removed.
pub fn verify_route_closure(
    filtered: &RouteDocument,
    kept: KeptNetwork<'_>,
    removed_routes: &BTreeSet<String>,
) -> Result<(), ConsistencyError> {
    for record in &filtered.entries {
        let entry = &record.data;

        let dangling = entry
            .edges
            .iter()
            .find(|edge| !kept.edges.contains(*edge))
            .map(|edge| (EntityClass::Edge, edge))
            .or_else(|| {
                entry
                    .lanes
                    .iter()
                    .find(|lane| !kept.lanes.contains(*lane))
                    .map(|lane| (EntityClass::Lane, lane))
            })
            .or_else(|| {
                entry
                    .route_refs
                    .iter()
                    .find(|route| removed_routes.contains(*route))
                    .map(|route| (EntityClass::Route, route))
            });

        if let Some((target, target_id)) = dangling {
            return Err(ConsistencyError::DanglingSurvivor {
                class: EntityClass::RouteEntry,
                label: entry.label(),
                target,
                target_id: target_id.clone(),
            });
        }
    }
    Ok(())
}
