//! Node implementation
//!
//! A node exclusively owns the edges listed in `out_edges` and holds
//! non-owning back-references to the edges listed in `in_edges`. Both lists
//! are only ever changed by the store, which keeps them symmetric with the
//! opposite endpoint; callers holding `&mut Node` can rename, relabel and
//! flag the node but not touch its topology.

use super::types::{EdgeId, GraphId, Label, NodeId, StructuralFlags};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

/// A node in the multigraph
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,

    /// Display name
    name: String,

    /// Ordered label set
    labels: IndexSet<Label, FxBuildHasher>,

    flags: StructuralFlags,

    /// Edges owned by this node, in insertion order
    out_edges: Vec<EdgeId>,

    /// Back-references to edges owned by other nodes
    in_edges: Vec<EdgeId>,

    /// Graphs holding this node
    graphs: Vec<GraphId>,

    /// Holds taken by the application rather than a graph
    external_holds: usize,
}

impl Node {
    /// Create a new node carrying one external hold for its creator
    pub(crate) fn new(id: NodeId, name: impl Into<String>) -> Self {
        Node {
            id,
            name: name.into(),
            labels: IndexSet::default(),
            flags: StructuralFlags::default(),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
            graphs: Vec::new(),
            external_holds: 1,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Add a label; returns false if it was already present
    pub fn add_label(&mut self, label: impl Into<Label>) -> bool {
        self.labels.insert(label.into())
    }

    /// Add several labels, skipping ones already present
    pub fn add_labels<I, L>(&mut self, labels: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
    }

    /// Replace the whole label set
    pub fn set_labels<I, L>(&mut self, labels: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.labels.clear();
        self.add_labels(labels);
    }

    pub fn remove_label(&mut self, label: &str) -> bool {
        self.labels.shift_remove(label)
    }

    /// Exact-match membership test
    pub fn contains_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// True if any of `labels` is present
    pub fn contains_any_label<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> bool {
        labels.into_iter().any(|label| self.contains_label(label))
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

    pub fn out_edges(&self) -> &[EdgeId] {
        &self.out_edges
    }

    pub fn in_edges(&self) -> &[EdgeId] {
        &self.in_edges
    }

    pub fn out_degree(&self) -> usize {
        self.out_edges.len()
    }

    pub fn in_degree(&self) -> usize {
        self.in_edges.len()
    }

    pub fn degree(&self) -> usize {
        self.out_edges.len() + self.in_edges.len()
    }

    /// Graphs this node is a member of
    pub fn graphs(&self) -> &[GraphId] {
        &self.graphs
    }

    pub fn external_holds(&self) -> usize {
        self.external_holds
    }

    /// External holds plus one per graph membership
    pub fn strong_holds(&self) -> usize {
        self.external_holds + self.graphs.len()
    }

    pub(crate) fn has_out_edge(&self, edge: EdgeId) -> bool {
        self.out_edges.contains(&edge)
    }

    pub(crate) fn has_in_edge(&self, edge: EdgeId) -> bool {
        self.in_edges.contains(&edge)
    }

    pub(crate) fn push_out_edge(&mut self, edge: EdgeId) {
        self.out_edges.push(edge);
    }

    pub(crate) fn push_in_edge(&mut self, edge: EdgeId) {
        self.in_edges.push(edge);
    }

    /// Release ownership of an out-edge, keeping the order of the rest
    pub(crate) fn remove_out_edge(&mut self, edge: EdgeId) -> bool {
        match self.out_edges.iter().position(|&e| e == edge) {
            Some(pos) => {
                self.out_edges.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_in_edge(&mut self, edge: EdgeId) -> bool {
        match self.in_edges.iter().position(|&e| e == edge) {
            Some(pos) => {
                self.in_edges.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn join_graph(&mut self, graph: GraphId) {
        self.graphs.push(graph);
    }

    pub(crate) fn leave_graph(&mut self, graph: GraphId) -> bool {
        match self.graphs.iter().position(|&g| g == graph) {
            Some(pos) => {
                self.graphs.remove(pos);
                true
            }
            None => false,
        }
    }

    pub(crate) fn retain(&mut self) {
        self.external_holds += 1;
    }

    /// Drop one external hold; false if there was none
    pub(crate) fn release(&mut self) -> bool {
        if self.external_holds == 0 {
            return false;
        }
        self.external_holds -= 1;
        true
    }

    #[cfg(test)]
    pub(crate) fn in_edges_mut(&mut self) -> &mut Vec<EdgeId> {
        &mut self.in_edges
    }

    #[cfg(test)]
    pub(crate) fn out_edges_mut(&mut self) -> &mut Vec<EdgeId> {
        &mut self.out_edges
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
