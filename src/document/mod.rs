// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Shared record machinery for the net and route documents.
//!
//! Both documents are parsed read-only with `roxmltree`. Each element the
//! pipeline cares about becomes a [`Record`] carrying its typed attributes,
//! the byte span it occupies in the source text and the shape it was written
//! in. Deleting an element is then just dropping its span when the document
//! is rebuilt, so everything else stays byte-identical.

pub mod net;
pub mod routes;

use crate::errors::FormatError;
use std::ops::Range;

pub use net::{Connection, Edge, Junction, NetDocument, Roundabout, TlProgram};
pub use routes::{RouteDocument, RouteEntry, RouteEntryKind};

/// How an element was written in the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// `<junction ... />` with no element children.
    Simple,
    /// `<junction ...> <request .../> </junction>` spanning several lines.
    Nested,
}

/// A parsed element and where it lives in the source text.
#[derive(Clone, Debug, PartialEq)]
pub struct Record<T> {
    pub data: T,
    pub shape: Shape,
    /// Byte range to cut when the element is removed. Widened to whole
    /// lines when the element sits alone on its lines.
    pub span: Range<usize>,
    /// 1-based line of the opening tag.
    pub line: u32,
}

/// Attribute access for one element, producing `FormatError`s that point
/// at the element and line.
pub(crate) struct ElementReader<'a, 'input: 'a> {
    node: roxmltree::Node<'a, 'input>,
    element: &'static str,
    line: u32,
}

impl<'a, 'input: 'a> ElementReader<'a, 'input> {
    pub(crate) fn new(node: roxmltree::Node<'a, 'input>, element: &'static str) -> Self {
        let line = node.document().text_pos_at(node.range().start).row;
        Self {
            node,
            element,
            line,
        }
    }

    pub(crate) fn line(&self) -> u32 {
        self.line
    }

    pub(crate) fn optional(&self, attribute: &str) -> Option<&'a str> {
        self.node.attribute(attribute)
    }

    pub(crate) fn required(&self, attribute: &'static str) -> Result<&'a str, FormatError> {
        self.node
            .attribute(attribute)
            .ok_or(FormatError::MissingAttribute {
                element: self.element,
                attribute,
                line: self.line,
            })
    }

    pub(crate) fn number(&self, attribute: &'static str) -> Result<f64, FormatError> {
        let value = self.required(attribute)?;
        match value.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(number),
            _ => Err(FormatError::BadNumber {
                element: self.element,
                attribute,
                value: value.to_string(),
                line: self.line,
            }),
        }
    }

    /// A required, whitespace separated list of ids. Empty lists are valid.
    pub(crate) fn id_list(&self, attribute: &'static str) -> Result<Vec<String>, FormatError> {
        Ok(split_ids(self.required(attribute)?))
    }

    pub(crate) fn record<T>(&self, source: &str, data: T) -> Record<T> {
        let shape = if self.node.children().any(|child| child.is_element()) {
            Shape::Nested
        } else {
            Shape::Simple
        };

        Record {
            data,
            shape,
            span: whole_line_span(source, self.node.range()),
            line: self.line,
        }
    }
}

pub(crate) fn split_ids(value: &str) -> Vec<String> {
    value.split_whitespace().map(|id| id.to_string()).collect()
}

/// Widens `range` to cover its indentation and trailing newline when
/// nothing else shares those lines, so that removing it leaves no blank
/// line behind.
pub(crate) fn whole_line_span(source: &str, range: Range<usize>) -> Range<usize> {
    let bytes = source.as_bytes();

    let mut start = range.start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    let starts_line = start == 0 || bytes[start - 1] == b'\n';

    let mut end = range.end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t' | b'\r') {
        end += 1;
    }
    let ends_line = end == bytes.len() || bytes[end] == b'\n';

    if starts_line && ends_line {
        if end < bytes.len() {
            end += 1;
        }
        start..end
    } else {
        range
    }
}
