// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Drives one subnetwork extraction from source text to pruned text.
//!
//! Nothing here touches the filesystem. Either every document comes back
//! pruned or the first fatal error is returned and nothing is produced.

use crate::bbox::partition_junctions;
use crate::config::SubnetConfig;
use crate::document::{NetDocument, RouteDocument};
use crate::errors::{DanglingReference, EntityClass, SubnetError};
use crate::propagation::{RemovalPlan, propagate};
use crate::pruning::{PruneReport, prune, verify_net_closure};
use crate::route_filter::{FilteredRoutes, KeptNetwork, filter_routes, verify_route_closure};
use itertools::Itertools;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct NetworkOutcome {
    pub xml: String,
    pub plan: RemovalPlan,
    pub report: PruneReport,
}

impl NetworkOutcome {
    pub fn kept(&self) -> KeptNetwork<'_> {
        KeptNetwork {
            edges: &self.plan.edges.keep,
            lanes: &self.plan.lanes.keep,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SubnetOutput {
    pub net: NetworkOutcome,
    /// One per input route document, in input order.
    pub routes: Vec<FilteredRoutes>,
    pub warnings: Vec<DanglingReference>,
}

pub fn prune_network(
    config: &SubnetConfig,
    net_xml: &str,
) -> Result<NetworkOutcome, SubnetError> {
    config.validate()?;

    let bbox = &config.bbox;
    info!(
        "Using boundary box: x = [{}, {}] y = [{}, {}]",
        bbox.xmin, bbox.xmax, bbox.ymin, bbox.ymax
    );

    let doc = NetDocument::parse(net_xml)?;

    let junctions = partition_junctions(bbox, &doc.junctions)?;
    info!(
        "Number of junctions kept: {} vs. removed: {}",
        junctions.keep.len(),
        junctions.remove.len()
    );

    let plan = propagate(&doc, junctions);
    plan.check_disjoint()?;

    let pruned = prune(&doc, &plan, config.verbose_removal_logging)?;

    if config.strict_format_checks {
        let reparsed = NetDocument::parse(&pruned.xml)?;
        verify_net_closure(&reparsed, &plan)?;
    }

    for class in [
        EntityClass::Junction,
        EntityClass::TrafficLight,
        EntityClass::Edge,
        EntityClass::Connection,
        EntityClass::Roundabout,
    ] {
        let counts = pruned.report.removed(class);
        info!(
            "Removed {} {} elements: {} simple vs. {} nested",
            counts.total(),
            class,
            counts.simple,
            counts.nested
        );
    }

    Ok(NetworkOutcome {
        xml: pruned.xml,
        plan,
        report: pruned.report,
    })
}

pub fn filter_route_document(
    config: &SubnetConfig,
    net: &NetworkOutcome,
    routes_xml: &str,
) -> Result<FilteredRoutes, SubnetError> {
    let doc = RouteDocument::parse(routes_xml)?;
    let filtered = filter_routes(&doc, net.kept(), config.verbose_removal_logging)?;

    if config.strict_format_checks {
        let reparsed = RouteDocument::parse(&filtered.xml)?;
        verify_route_closure(&reparsed, net.kept(), &filtered.routes.remove)?;
    }

    info!(
        "Number of route entries kept: {} vs. removed: {}",
        filtered.entries.keep.len(),
        filtered.entries.remove.len()
    );

    Ok(filtered)
}

/// Prunes the net document, then filters every route document against it.
pub fn run(
    config: &SubnetConfig,
    net_xml: &str,
    route_xmls: &[&str],
) -> Result<SubnetOutput, SubnetError> {
    let net = prune_network(config, net_xml)?;

    let routes = route_xmls
        .iter()
        .map(|routes_xml| filter_route_document(config, &net, routes_xml))
        .collect::<Result<Vec<_>, _>>()?;

    let warnings: Vec<DanglingReference> = net
        .plan
        .warnings
        .iter()
        .chain(routes.iter().flat_map(|filtered| filtered.warnings.iter()))
        .cloned()
        .sorted()
        .dedup()
        .collect();

    if !warnings.is_empty() {
        warn!(
            "{} dangling references (first: {})",
            warnings.len(),
            warnings.iter().take(5).join("; ")
        );
    }

    Ok(SubnetOutput {
        net,
        routes,
        warnings,
    })
}
