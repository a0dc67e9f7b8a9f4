//! Core type definitions for the multigraph
//!
//! Every cross-reference in the store (edge endpoints, back-references, graph
//! membership) is one of the ids below rather than a pointer. Ids carry a
//! generation so that an id kept past its owner's deletion never resolves to
//! whatever later reuses the slot.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn new(index: u32, generation: u32) -> Self {
        NodeId { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EdgeId {
    index: u32,
    generation: u32,
}

impl EdgeId {
    pub fn new(index: u32, generation: u32) -> Self {
        EdgeId { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({}v{})", self.index, self.generation)
    }
}

/// Unique identifier for a graph (membership container)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct GraphId {
    index: u32,
    generation: u32,
}

impl GraphId {
    pub fn new(index: u32, generation: u32) -> Self {
        GraphId { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphId({}v{})", self.index, self.generation)
    }
}

/// Label attached to a node, edge or graph (e.g., "bond", "carbon")
///
/// Labels have no meaning to the store beyond set membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Label(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for Label {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label(s)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label(s.to_string())
    }
}

/// Caller-managed structural flags shared by nodes and edges
///
/// Leaf and bridge classification is not computed by the store; the flags are
/// reserved for algorithms layered on top of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructuralFlags {
    pub leaf: bool,
    pub bridge: bool,
    pub visited: bool,
}

impl StructuralFlags {
    /// Reset all flags to false
    pub fn clear(&mut self) {
        *self = StructuralFlags::default();
    }
}
