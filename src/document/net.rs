// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use super::{ElementReader, Record, split_ids};
use crate::errors::{EntityClass, FormatError};
use ahash::AHashMap as HashMap;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct Junction {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub inc_lanes: Vec<String>,
    pub int_lanes: Vec<String>,
}

impl Junction {
    /// Incoming lanes followed by internal lanes.
    pub fn lanes(&self) -> impl Iterator<Item = &String> {
        self.inc_lanes.iter().chain(self.int_lanes.iter())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: String,
    /// Junction ids. Internal edges (`function="internal"`) have neither.
    pub from: Option<String>,
    pub to: Option<String>,
    pub function: Option<String>,
    pub lanes: Vec<String>,
}

impl Edge {
    pub fn is_internal(&self) -> bool {
        self.function.as_deref() == Some("internal")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TlProgram {
    /// Id of the junction the program controls.
    pub id: String,
    pub program_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub from: String,
    pub to: String,
    pub from_lane: Option<String>,
    pub to_lane: Option<String>,
    pub via: Option<String>,
    pub tl: Option<String>,
}

impl Connection {
    pub fn from_lane_id(&self) -> Option<String> {
        self.from_lane
            .as_ref()
            .map(|index| format!("{}_{}", self.from, index))
    }

    pub fn to_lane_id(&self) -> Option<String> {
        self.to_lane
            .as_ref()
            .map(|index| format!("{}_{}", self.to, index))
    }

    /// Every lane id the connection depends on.
    pub fn lane_ids(&self) -> Vec<String> {
        let mut lanes = Vec::with_capacity(3);
        lanes.extend(self.from_lane_id());
        lanes.extend(self.to_lane_id());
        lanes.extend(self.via.iter().cloned());
        lanes
    }

    pub fn label(&self) -> String {
        match (&self.from_lane, &self.to_lane) {
            (Some(from_lane), Some(to_lane)) => {
                format!("{}_{}->{}_{}", self.from, from_lane, self.to, to_lane)
            }
            _ => format!("{}->{}", self.from, self.to),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Roundabout {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
}

/// The parsed network document. Immutable once built: the pruning engine
/// only ever reads it.
#[derive(Clone, Debug)]
pub struct NetDocument {
    source: String,
    pub junctions: Vec<Record<Junction>>,
    pub edges: Vec<Record<Edge>>,
    pub tl_programs: Vec<Record<TlProgram>>,
    pub connections: Vec<Record<Connection>>,
    pub roundabouts: Vec<Record<Roundabout>>,
}

impl NetDocument {
    pub fn parse(source: &str) -> Result<NetDocument, FormatError> {
        let doc = roxmltree::Document::parse(source)?;
        let root = doc.root_element();

        if !root.has_tag_name("net") {
            return Err(FormatError::UnexpectedRoot {
                expected: "net",
                found: root.tag_name().name().to_string(),
            });
        }

        let mut junctions = Vec::new();
        let mut edges = Vec::new();
        let mut tl_programs = Vec::new();
        let mut connections = Vec::new();
        let mut roundabouts = Vec::new();
        let mut edge_lines: HashMap<String, u32> = HashMap::new();

        for node in root.children().filter(|node| node.is_element()) {
            match node.tag_name().name() {
                "junction" => {
                    let reader = ElementReader::new(node, "junction");
                    let junction = Junction {
                        id: reader.required("id")?.to_string(),
                        x: reader.number("x")?,
                        y: reader.number("y")?,
                        inc_lanes: reader.id_list("incLanes")?,
                        int_lanes: reader.id_list("intLanes")?,
                    };
                    junctions.push(reader.record(source, junction));
                }
                "edge" => {
                    let reader = ElementReader::new(node, "edge");
                    let id = reader.required("id")?.to_string();

                    if edge_lines.insert(id.clone(), reader.line()).is_some() {
                        return Err(FormatError::DuplicateId {
                            class: EntityClass::Edge,
                            id,
                            line: reader.line(),
                        });
                    }

                    let mut lanes = Vec::new();
                    for lane in node.children().filter(|c| c.has_tag_name("lane")) {
                        let lane_reader = ElementReader::new(lane, "lane");
                        lanes.push(lane_reader.required("id")?.to_string());
                    }

                    let edge = Edge {
                        id,
                        from: reader.optional("from").map(|x| x.to_string()),
                        to: reader.optional("to").map(|x| x.to_string()),
                        function: reader.optional("function").map(|x| x.to_string()),
                        lanes,
                    };
                    edges.push(reader.record(source, edge));
                }
                "tlLogic" => {
                    let reader = ElementReader::new(node, "tlLogic");
                    let program = TlProgram {
                        id: reader.required("id")?.to_string(),
                        program_id: reader.optional("programID").map(|x| x.to_string()),
                    };
                    tl_programs.push(reader.record(source, program));
                }
                "connection" => {
                    let reader = ElementReader::new(node, "connection");
                    let connection = Connection {
                        from: reader.required("from")?.to_string(),
                        to: reader.required("to")?.to_string(),
                        from_lane: reader.optional("fromLane").map(|x| x.to_string()),
                        to_lane: reader.optional("toLane").map(|x| x.to_string()),
                        via: reader
                            .optional("via")
                            .and_then(|via| split_ids(via).into_iter().next()),
                        tl: reader
                            .optional("tl")
                            .filter(|tl| !tl.is_empty())
                            .map(|x| x.to_string()),
                    };
                    connections.push(reader.record(source, connection));
                }
                "roundabout" => {
                    let reader = ElementReader::new(node, "roundabout");
                    let roundabout = Roundabout {
                        nodes: reader.id_list("nodes")?,
                        edges: reader.id_list("edges")?,
                    };
                    roundabouts.push(reader.record(source, roundabout));
                }
                _ => {}
            }
        }

        debug!(
            "Parsed net document: {} junctions, {} edges, {} traffic light programs, {} connections, {} roundabouts",
            junctions.len(),
            edges.len(),
            tl_programs.len(),
            connections.len(),
            roundabouts.len()
        );

        Ok(NetDocument {
            source: source.to_string(),
            junctions,
            edges,
            tl_programs,
            connections,
            roundabouts,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Lane id to owning edge id.
    pub fn lane_owners(&self) -> HashMap<&str, &str> {
        let mut owners = HashMap::new();
        for edge in &self.edges {
            for lane in &edge.data.lanes {
                owners.insert(lane.as_str(), edge.data.id.as_str());
            }
        }
        owners
    }
}
