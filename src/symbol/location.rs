//! Source ranges and locations.

use serde::{Deserialize, Serialize};

/// Byte-offset range inside a document. Containment is inclusive on both ends
/// so that a cursor sitting right after the last character still hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

impl Range {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn from_node(node: &tree_sitter::Node) -> Self {
        Self {
            start: node.start_byte() as u32,
            end: node.end_byte() as u32,
        }
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset <= self.end
    }

    /// True when `other` lies entirely inside this range.
    pub fn encloses(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// LSP-style position. `character` counts UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Where a symbol or reference lives. Either part may be missing for
/// symbols synthesised outside of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub uri: Option<String>,
    pub range: Option<Range>,
}

impl Location {
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Self {
            uri: Some(uri.into()),
            range: Some(range),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.uri.is_none() || self.range.is_none()
    }

    pub fn uri(&self) -> &str {
        self.uri.as_deref().unwrap_or("")
    }

    pub fn start(&self) -> u32 {
        self.range.map(|r| r.start).unwrap_or(0)
    }

    pub fn contains(&self, offset: u32) -> bool {
        self.range.is_some_and(|r| r.contains(offset))
    }
}
