// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every kind of element the pipeline reasons about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityClass {
    Junction,
    Lane,
    Edge,
    TrafficLight,
    Connection,
    Roundabout,
    Route,
    RouteEntry,
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityClass::Junction => "junction",
            EntityClass::Lane => "lane",
            EntityClass::Edge => "edge",
            EntityClass::TrafficLight => "traffic light",
            EntityClass::Connection => "connection",
            EntityClass::Roundabout => "roundabout",
            EntityClass::Route => "route",
            EntityClass::RouteEntry => "route entry",
        };
        f.write_str(name)
    }
}

/// The input does not follow the expected SUMO dialect.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("expected root element <{expected}> but found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },
    #[error("<{element}> at line {line} is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
        line: u32,
    },
    #[error("<{element}> at line {line}: '{value}' is not a valid number for '{attribute}'")]
    BadNumber {
        element: &'static str,
        attribute: &'static str,
        value: String,
        line: u32,
    },
    #[error("duplicate {class} id '{id}' at line {line}")]
    DuplicateId {
        class: EntityClass,
        id: String,
        line: u32,
    },
}

/// A post-stage invariant failed. Always a logic or input-shape bug.
#[derive(Error, Debug)]
pub enum ConsistencyError {
    #[error("{class} keep and remove sets share {count} ids (first: '{example}')")]
    OverlappingSets {
        class: EntityClass,
        count: usize,
        example: String,
    },
    #[error("deleted {actual} {class} elements but the removal set predicts {expected}")]
    DeletionCountMismatch {
        class: EntityClass,
        expected: usize,
        actual: usize,
    },
    #[error("span of {class} '{label}' at byte {start} overlaps an earlier deletion")]
    OverlappingSpan {
        class: EntityClass,
        label: String,
        start: usize,
    },
    #[error("removed {class} '{label}' is still present in the output")]
    StillPresent { class: EntityClass, label: String },
    #[error("surviving {class} '{label}' still references removed {target} '{target_id}'")]
    DanglingSurvivor {
        class: EntityClass,
        label: String,
        target: EntityClass,
        target_id: String,
    },
}

/// Top level error for a pipeline run.
#[derive(Error, Debug)]
pub enum SubnetError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An id referenced by some element but defined nowhere in the document.
/// Never fatal; the id still takes part in propagation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DanglingReference {
    pub class: EntityClass,
    pub id: String,
    pub referenced_by: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' referenced by {} is not defined",
            self.class, self.id, self.referenced_by
        )
    }
}
