// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use super::{ElementReader, Record, split_ids};
use crate::errors::FormatError;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteEntryKind {
    Route,
    RouteDistribution,
    Vehicle,
    Trip,
    Flow,
    Person,
    PersonFlow,
    Container,
    ContainerFlow,
}

impl RouteEntryKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "route" => Some(RouteEntryKind::Route),
            "routeDistribution" => Some(RouteEntryKind::RouteDistribution),
            "vehicle" => Some(RouteEntryKind::Vehicle),
            "trip" => Some(RouteEntryKind::Trip),
            "flow" => Some(RouteEntryKind::Flow),
            "person" => Some(RouteEntryKind::Person),
            "personFlow" => Some(RouteEntryKind::PersonFlow),
            "container" => Some(RouteEntryKind::Container),
            "containerFlow" => Some(RouteEntryKind::ContainerFlow),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            RouteEntryKind::Route => "route",
            RouteEntryKind::RouteDistribution => "routeDistribution",
            RouteEntryKind::Vehicle => "vehicle",
            RouteEntryKind::Trip => "trip",
            RouteEntryKind::Flow => "flow",
            RouteEntryKind::Person => "person",
            RouteEntryKind::PersonFlow => "personFlow",
            RouteEntryKind::Container => "container",
            RouteEntryKind::ContainerFlow => "containerFlow",
        }
    }

    /// Entries other entries can point at through `route="..."`.
    pub fn defines_routes(&self) -> bool {
        matches!(
            self,
            RouteEntryKind::Route | RouteEntryKind::RouteDistribution
        )
    }
}

/// A top-level element of a route document with everything it refers to,
/// gathered from the element and all of its descendants.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteEntry {
    pub kind: RouteEntryKind,
    pub id: String,
    pub edges: Vec<String>,
    pub lanes: Vec<String>,
    /// Ids of routes or route distributions this entry uses.
    pub route_refs: Vec<String>,
    /// Route ids this entry makes available to others.
    pub defines: Vec<String>,
}

impl RouteEntry {
    pub fn label(&self) -> String {
        format!("{} {}", self.kind.tag(), self.id)
    }
}

const EDGE_LIST_ATTRIBUTES: [&str; 5] = ["edges", "from", "to", "via", "edge"];

#[derive(Clone, Debug)]
pub struct RouteDocument {
    source: String,
    pub entries: Vec<Record<RouteEntry>>,
}

impl RouteDocument {
    pub fn parse(source: &str) -> Result<RouteDocument, FormatError> {
        let doc = roxmltree::Document::parse(source)?;
        let root = doc.root_element();

        if !root.has_tag_name("routes") {
            return Err(FormatError::UnexpectedRoot {
                expected: "routes",
                found: root.tag_name().name().to_string(),
            });
        }

        let mut entries = Vec::new();

        for node in root.children().filter(|node| node.is_element()) {
            let Some(kind) = RouteEntryKind::from_tag(node.tag_name().name()) else {
                continue;
            };

            let reader = ElementReader::new(node, kind.tag());
            let id = reader.required("id")?.to_string();

            let mut entry = RouteEntry {
                kind,
                id: id.clone(),
                edges: Vec::new(),
                lanes: Vec::new(),
                route_refs: Vec::new(),
                defines: Vec::new(),
            };

            if kind.defines_routes() {
                entry.defines.push(id);
            }

            for element in node.descendants().filter(|d| d.is_element()) {
                for attribute in EDGE_LIST_ATTRIBUTES {
                    if let Some(value) = element.attribute(attribute) {
                        entry.edges.extend(split_ids(value));
                    }
                }
                if let Some(lane) = element.attribute("lane") {
                    entry.lanes.extend(split_ids(lane));
                }
                if let Some(route) = element.attribute("route") {
                    entry.route_refs.extend(split_ids(route));
                }
                if let Some(route) = element.attribute("refId") {
                    entry.route_refs.extend(split_ids(route));
                }
                if kind == RouteEntryKind::RouteDistribution
                    && element != node
                    && element.has_tag_name("route")
                {
                    if let Some(nested_id) = element.attribute("id") {
                        entry.defines.push(nested_id.to_string());
                    }
                }
            }

            entries.push(reader.record(source, entry));
        }

        debug!("Parsed route document: {} entries", entries.len());

        Ok(RouteDocument {
            source: source.to_string(),
            entries,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}
