//! Named membership containers over nodes
//!
//! A [`Graph`] groups nodes for bookkeeping and iteration. It never owns or
//! scopes edges: a node's edges are the same whichever graphs list it.

use super::types::{GraphId, Label, NodeId};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

#[derive(Debug, Clone)]
pub struct Graph {
    id: GraphId,

    /// Display name
    name: String,

    /// Ordered label set
    labels: IndexSet<Label, FxBuildHasher>,

    /// Member nodes in insertion order; each entry is one strong hold
    members: IndexSet<NodeId, FxBuildHasher>,
}

impl Graph {
    pub(crate) fn new(id: GraphId, name: impl Into<String>) -> Self {
        Graph {
            id,
            name: name.into(),
            labels: IndexSet::default(),
            members: IndexSet::default(),
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn add_label(&mut self, label: impl Into<Label>) -> bool {
        self.labels.insert(label.into())
    }

    pub fn add_labels<I, L>(&mut self, labels: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
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

    /// Identity-based membership test
    ///
    /// Does not refresh, so it may still report a member that the next
    /// [`GraphStore::graph_nodes`](super::GraphStore::graph_nodes) call purges.
    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    /// Members as currently recorded, without a refresh
    pub fn members(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn insert(&mut self, node: NodeId) -> bool {
        self.members.insert(node)
    }

    pub(crate) fn remove(&mut self, node: NodeId) -> bool {
        self.members.shift_remove(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_is_ordered_and_unique() {
        let mut g = Graph::new(GraphId::new(0, 0), "water");
        let o = NodeId::new(0, 0);
        let h1 = NodeId::new(1, 0);
        let h2 = NodeId::new(2, 0);

        assert!(g.insert(o));
        assert!(g.insert(h1));
        assert!(g.insert(h2));
        assert!(!g.insert(h1));

        assert_eq!(g.members().collect::<Vec<_>>(), vec![o, h1, h2]);
        assert!(g.remove(h1));
        assert!(!g.contains(h1));
        assert_eq!(g.members().collect::<Vec<_>>(), vec![o, h2]);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn test_identity_not_content() {
        let mut g = Graph::new(GraphId::new(0, 0), "g");
        g.insert(NodeId::new(4, 0));

        // Same slot, later generation: a different node
        assert!(!g.contains(NodeId::new(4, 1)));
    }

    #[test]
    fn test_graph_labels_and_name() {
        let mut g = Graph::new(GraphId::new(1, 0), "benzene");
        g.add_labels(["molecule", "aromatic"]);
        assert!(g.contains_label("aromatic"));
        assert!(g.remove_label("aromatic"));
        assert!(!g.contains_label("aromatic"));

        g.set_name("toluene");
        assert_eq!(g.name(), "toluene");
        assert!(g.is_empty());
    }
}
