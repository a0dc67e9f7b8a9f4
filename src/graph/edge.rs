//! Edge implementation
//!
//! An edge is a plain directed relation between two node ids. It is owned by
//! its source node, and the store is the only thing that creates or destroys
//! edges, so the record itself carries no ownership logic.

use super::error::{GraphError, GraphResult};
use super::types::{EdgeId, Label, NodeId, StructuralFlags};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

/// A directed, labeled edge
///
/// The endpoints are fixed at construction; only the name, labels and flags
/// can change afterwards.
#[derive(Debug, Clone)]
pub struct Edge {
    id: EdgeId,

    /// Display name (e.g., "bond")
    name: String,

    /// Ordered label set
    labels: IndexSet<Label, FxBuildHasher>,

    /// Edge goes FROM this node, which owns it
    source: NodeId,

    /// Edge goes TO this node, which holds a back-reference
    sink: NodeId,

    flags: StructuralFlags,
}

impl Edge {
    /// Create a new directed edge, rejecting self-loops
    pub fn new(
        id: EdgeId,
        name: impl Into<String>,
        source: NodeId,
        sink: NodeId,
    ) -> GraphResult<Self> {
        if source == sink {
            return Err(GraphError::SelfLoop(source));
        }

        Ok(Edge {
            id,
            name: name.into(),
            labels: IndexSet::default(),
            source,
            sink,
            flags: StructuralFlags::default(),
        })
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    /// Add a label; returns false if it was already present
    pub fn add_label(&mut self, label: impl Into<Label>) -> bool {
        self.labels.insert(label.into())
    }

    pub fn remove_label(&mut self, label: &str) -> bool {
        self.labels.shift_remove(label)
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn flags(&self) -> StructuralFlags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut StructuralFlags {
        &mut self.flags
    }

    /// Check if this edge connects two specific nodes (in either direction)
    pub fn connects(&self, node1: NodeId, node2: NodeId) -> bool {
        (self.source == node1 && self.sink == node2)
            || (self.source == node2 && self.sink == node1)
    }

    /// Check if this edge goes FROM a specific node
    pub fn starts_from(&self, node: NodeId) -> bool {
        self.source == node
    }

    /// Check if this edge goes TO a specific node
    pub fn ends_at(&self, node: NodeId) -> bool {
        self.sink == node
    }

    /// The endpoint opposite `node`, if `node` is an endpoint at all
    pub fn opposite(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.sink)
        } else if self.sink == node {
            Some(self.source)
        } else {
            None
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
