//! In-memory graph storage
//!
//! `GraphStore` is the single owner of every node, edge and graph record.
//! Records refer to each other only through ids, so removing one never leaves
//! a dangling pointer behind; at worst a stale id stops resolving.
//!
//! Edge ownership still follows the node model: an edge belongs to its
//! source node (listed in the source's `out_edges`) and its sink keeps a
//! back-reference (listed in `in_edges`). Every structural mutation goes
//! through this type, validates and plans first, and only then applies, so a
//! failed call leaves the store exactly as it found it.

use super::arena::Arena;
use super::config::{EdgeMultiplicity, StoreConfig};
use super::diagnostics::{ChannelSink, DiagnosticEvent, DiagnosticSink, Severity, TracingSink};
use super::edge::Edge;
use super::error::{GraphError, GraphResult};
use super::membership::Graph;
use super::node::Node;
use super::types::{EdgeId, GraphId, NodeId};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use std::fmt::Write as _;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{debug, info};

type EdgeSet = IndexSet<EdgeId, FxBuildHasher>;

/// In-memory multigraph storage
///
/// - nodes: NodeId -> Node (owns out-edge ids, holds in-edge back-references)
/// - edges: EdgeId -> Edge
/// - graphs: GraphId -> Graph (membership sets)
#[derive(Debug)]
pub struct GraphStore {
    nodes: Arena<NodeId, Node>,
    edges: Arena<EdgeId, Edge>,
    graphs: Arena<GraphId, Graph>,
    config: StoreConfig,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl GraphStore {
    /// Create a new empty store with the default configuration
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::with_diagnostics(config, TracingSink)
    }

    pub fn with_diagnostics(config: StoreConfig, sink: impl DiagnosticSink + 'static) -> Self {
        GraphStore {
            nodes: Arena::with_capacity(config.node_capacity),
            edges: Arena::with_capacity(config.edge_capacity),
            graphs: Arena::with_capacity(config.graph_capacity),
            config,
            diagnostics: Box::new(sink),
        }
    }

    /// Create a store whose diagnostics are queued on a channel
    pub fn with_diagnostics_channel() -> (Self, UnboundedReceiver<DiagnosticEvent>) {
        let (tx, rx) = unbounded_channel();
        let store = Self::with_diagnostics(StoreConfig::default(), ChannelSink::new(tx));
        (store, rx)
    }

    pub fn set_diagnostics(&mut self, sink: impl DiagnosticSink + 'static) {
        self.diagnostics = Box::new(sink);
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ============================================================
    // Diagnostics
    // ============================================================

    fn report(&self, severity: Severity, operation: &'static str, message: impl Into<String>) {
        self.diagnostics
            .emit(DiagnosticEvent::new(severity, operation, message));
    }

    /// Pass a result through, reporting it if it failed
    fn checked<T>(&self, operation: &'static str, result: GraphResult<T>) -> GraphResult<T> {
        if let Err(err) = &result {
            let severity = if err.is_consistency() {
                Severity::Fatal
            } else {
                Severity::Warning
            };
            self.report(severity, operation, err.to_string());
        }
        result
    }

    fn node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.get(id).ok_or(GraphError::NodeNotFound(id))
    }

    fn graph(&self, id: GraphId) -> GraphResult<&Graph> {
        self.graphs.get(id).ok_or(GraphError::GraphNotFound(id))
    }

    // ============================================================
    // Nodes
    // ============================================================

    /// Create a node; the caller receives its first external hold
    pub fn create_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.nodes.insert_with(|id| Node::new(id, name));
        debug!("Created node {}", id);
        id
    }

    /// Create a node under the configured default name
    pub fn create_default_node(&mut self) -> NodeId {
        let name = self.config.default_node_name.clone();
        let id = self.create_node(name);
        self.report(
            Severity::Warning,
            "create_default_node",
            format!("Created node {} with no name", id),
        );
        id
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's name, labels and flags
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn all_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().map(|(_, node)| node).collect()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.ids()
    }

    /// Take one more external hold on a node
    pub fn retain_node(&mut self, id: NodeId) -> GraphResult<()> {
        let result = match self.nodes.get_mut(id) {
            Some(node) => {
                node.retain();
                Ok(())
            }
            None => Err(GraphError::NodeNotFound(id)),
        };
        self.checked("retain_node", result)
    }

    /// Drop one external hold on a node
    ///
    /// If that was the node's last strong hold (no other external holder and
    /// no graph membership) the node is destroyed. Returns whether it was.
    pub fn release_node(&mut self, id: NodeId) -> GraphResult<bool> {
        let result = self.try_release_node(id);
        self.checked("release_node", result)
    }

    fn try_release_node(&mut self, id: NodeId) -> GraphResult<bool> {
        let node = self.node(id)?;
        if node.external_holds() == 0 {
            return Err(GraphError::NoExternalHold(id));
        }

        if node.strong_holds() > 1 {
            if let Some(node) = self.nodes.get_mut(id) {
                node.release();
            }
            return Ok(false);
        }

        let plan = self.plan_detach(&[id])?;
        self.reclaim(&[id], &plan);
        Ok(true)
    }

    /// Delete a node and all its connected edges
    ///
    /// The node is removed from every graph regardless of remaining holds.
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let result = self.try_delete_node(id);
        self.checked("delete_node", result)
    }

    fn try_delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        self.node(id)?;
        let plan = self.plan_detach(&[id])?;
        self.reclaim(&[id], &plan)
            .pop()
            .ok_or(GraphError::NodeNotFound(id))
    }

    // ============================================================
    // Edges
    // ============================================================

    /// Add `child` as a child of `node` through a new edge `node -> child`
    ///
    /// The new edge is owned by `node`; `child` receives a back-reference.
    pub fn add_child(
        &mut self,
        node: NodeId,
        edge_name: impl Into<String>,
        child: NodeId,
    ) -> GraphResult<EdgeId> {
        let result = self.try_add_child(node, edge_name.into(), child);
        self.checked("add_child", result)
    }

    /// Add `parent` as a parent of `node`; same as `add_child(parent, .., node)`
    pub fn add_parent(
        &mut self,
        node: NodeId,
        edge_name: impl Into<String>,
        parent: NodeId,
    ) -> GraphResult<EdgeId> {
        let result = self.try_add_child(parent, edge_name.into(), node);
        self.checked("add_parent", result)
    }

    fn try_add_child(&mut self, node: NodeId, edge_name: String, child: NodeId) -> GraphResult<EdgeId> {
        let source = self
            .nodes
            .get(node)
            .ok_or(GraphError::InvalidEdgeSource(node))?;
        if !self.nodes.contains(child) {
            return Err(GraphError::InvalidEdgeTarget(child));
        }

        if self.config.edge_multiplicity == EdgeMultiplicity::Unique
            && node != child
            && self.out_connecting(source, child).next().is_some()
        {
            return Err(GraphError::DuplicateEdge {
                from: node,
                to: child,
            });
        }

        let edge_id = self
            .edges
            .try_insert_with(|id| Edge::new(id, edge_name, node, child))?;

        if let Some(source) = self.nodes.get_mut(node) {
            source.push_out_edge(edge_id);
        }
        if let Some(sink) = self.nodes.get_mut(child) {
            sink.push_in_edge(edge_id);
        }

        debug!("Added edge {}: {} -> {}", edge_id, node, child);
        Ok(edge_id)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Mutable access to an edge's name, labels and flags
    pub fn get_edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    pub fn has_edge(&self, id: EdgeId) -> bool {
        self.edges.contains(id)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get all outgoing edges of a node
    pub fn get_outgoing_edges(&self, node: NodeId) -> Vec<&Edge> {
        self.nodes
            .get(node)
            .map(|n| {
                n.out_edges()
                    .iter()
                    .filter_map(|&id| self.edges.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get all incoming edges of a node
    pub fn get_incoming_edges(&self, node: NodeId) -> Vec<&Edge> {
        self.nodes
            .get(node)
            .map(|n| {
                n.in_edges()
                    .iter()
                    .filter_map(|&id| self.edges.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Delete a single edge
    ///
    /// Both endpoints must agree on the edge before it is unlinked.
    pub fn delete_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let result = self.try_delete_edge(id);
        self.checked("delete_edge", result)
    }

    fn try_delete_edge(&mut self, id: EdgeId) -> GraphResult<Edge> {
        let edge = self.edges.get(id).ok_or(GraphError::EdgeNotFound(id))?;
        let (source, sink) = (edge.source(), edge.sink());
        let dangling = |endpoint: NodeId| GraphError::Consistency {
            node: endpoint,
            detail: format!("edge {} has a missing endpoint", id),
        };
        let from = self.nodes.get(source).ok_or_else(|| dangling(source))?;
        let to = self.nodes.get(sink).ok_or_else(|| dangling(sink))?;

        if !self.verified_edges(from, to)?.contains(&id) {
            return Err(GraphError::Consistency {
                node: source,
                detail: format!("edge {} is not owned by its source", id),
            });
        }

        let edge = edge.clone();
        self.remove_edges(&[id]);
        Ok(edge)
    }

    // ============================================================
    // Adjacency queries
    // ============================================================

    /// Sinks of every owned edge, in edge order
    pub fn children(&self, node: NodeId) -> GraphResult<Vec<NodeId>> {
        let result = self.node(node).map(|n| {
            n.out_edges()
                .iter()
                .filter_map(|&id| self.edges.get(id))
                .map(Edge::sink)
                .collect()
        });
        self.checked("children", result)
    }

    /// Sources of every back-referenced edge, in edge order
    pub fn parents(&self, node: NodeId) -> GraphResult<Vec<NodeId>> {
        let result = self.node(node).map(|n| {
            n.in_edges()
                .iter()
                .filter_map(|&id| self.edges.get(id))
                .map(Edge::source)
                .collect()
        });
        self.checked("parents", result)
    }

    /// Children followed by parents; a node linked by several edges appears
    /// once per edge
    pub fn neighbors(&self, node: NodeId) -> GraphResult<Vec<NodeId>> {
        let mut neighbors = self.children(node)?;
        neighbors.extend(self.parents(node)?);
        Ok(neighbors)
    }

    /// True if `node` is a child of `other` (some edge runs `other -> node`)
    pub fn is_child(&self, node: NodeId, other: NodeId) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| self.in_connecting(n, other).next().is_some())
    }

    /// True if `node` is a parent of `other` (some edge runs `node -> other`)
    pub fn is_parent(&self, node: NodeId, other: NodeId) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| self.out_connecting(n, other).next().is_some())
    }

    /// True if an edge runs between the two nodes in either direction
    pub fn is_neighbor(&self, node: NodeId, other: NodeId) -> bool {
        self.is_child(node, other) || self.is_parent(node, other)
    }

    /// Edges `node -> other`
    pub fn out_connecting_edges(&self, node: NodeId, other: NodeId) -> Vec<EdgeId> {
        self.nodes
            .get(node)
            .map(|n| self.out_connecting(n, other).collect())
            .unwrap_or_default()
    }

    /// Edges `other -> node`
    pub fn in_connecting_edges(&self, node: NodeId, other: NodeId) -> Vec<EdgeId> {
        self.nodes
            .get(node)
            .map(|n| self.in_connecting(n, other).collect())
            .unwrap_or_default()
    }

    /// Edges between the two nodes in either direction, outgoing first
    pub fn connecting_edges(&self, node: NodeId, other: NodeId) -> Vec<EdgeId> {
        let mut edges = self.out_connecting_edges(node, other);
        edges.extend(self.in_connecting_edges(node, other));
        edges
    }

    /// The single edge `source -> sink`
    ///
    /// For callers that assume at most one connecting edge: parallel edges
    /// are reported instead of picking one arbitrarily.
    pub fn edge_between(&self, source: NodeId, sink: NodeId) -> GraphResult<EdgeId> {
        let result = self.node(source).and_then(|n| {
            let edges: Vec<EdgeId> = self.out_connecting(n, sink).collect();
            match edges.as_slice() {
                [] => Err(GraphError::NotConnected {
                    from: source,
                    to: sink,
                }),
                [edge] => Ok(*edge),
                _ => Err(GraphError::MultipleEdges {
                    from: source,
                    to: sink,
                    count: edges.len(),
                }),
            }
        });
        self.checked("edge_between", result)
    }

    pub fn contains_label(&self, node: NodeId, label: &str) -> bool {
        self.nodes.get(node).is_some_and(|n| n.contains_label(label))
    }

    /// True if the node carries at least one of `labels`
    pub fn contains_any_label<'a>(&self, node: NodeId, labels: impl IntoIterator<Item = &'a str>) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| n.contains_any_label(labels))
    }

    fn out_connecting<'a>(&'a self, node: &'a Node, other: NodeId) -> impl Iterator<Item = EdgeId> + 'a {
        node.out_edges()
            .iter()
            .copied()
            .filter(move |&id| self.edges.get(id).is_some_and(|e| e.ends_at(other)))
    }

    fn in_connecting<'a>(&'a self, node: &'a Node, other: NodeId) -> impl Iterator<Item = EdgeId> + 'a {
        node.in_edges()
            .iter()
            .copied()
            .filter(move |&id| self.edges.get(id).is_some_and(|e| e.starts_from(other)))
    }

    /// Human-readable summary of a node's edges
    pub fn describe_edges(&self, node: NodeId) -> String {
        let Some(n) = self.nodes.get(node) else {
            return format!("node {} not found", node);
        };

        let name_of = |id: &EdgeId| {
            self.edges
                .get(*id)
                .map(|e| e.name().to_string())
                .unwrap_or_else(|| format!("<missing {}>", id))
        };

        let mut out = String::new();
        let _ = writeln!(out, "edges of {} ({})", n.name(), node);
        let _ = writeln!(
            out,
            "  in ({}): {}",
            n.in_degree(),
            n.in_edges().iter().map(name_of).collect::<Vec<_>>().join(", ")
        );
        let _ = write!(
            out,
            "  out ({}): {}",
            n.out_degree(),
            n.out_edges().iter().map(name_of).collect::<Vec<_>>().join(", ")
        );
        out
    }

    // ============================================================
    // Edge deletion
    // ============================================================

    /// Delete every edge `node -> child`; returns how many were removed
    pub fn delete_edges_to_child(&mut self, node: NodeId, child: NodeId) -> GraphResult<usize> {
        let result = self.try_delete_directed(node, child);
        self.checked("delete_edges_to_child", result)
    }

    /// Delete every edge `parent -> node`; returns how many were removed
    pub fn delete_edges_to_parent(&mut self, node: NodeId, parent: NodeId) -> GraphResult<usize> {
        let result = self.try_delete_directed(parent, node);
        self.checked("delete_edges_to_parent", result)
    }

    fn try_delete_directed(&mut self, source: NodeId, sink: NodeId) -> GraphResult<usize> {
        let edges = self.verified_edges(self.node(source)?, self.node(sink)?)?;
        if edges.is_empty() {
            self.report(
                Severity::Info,
                "delete_edges",
                format!("No edges {} -> {} to delete", source, sink),
            );
        }
        self.remove_edges(&edges);
        Ok(edges.len())
    }

    /// Delete every edge between two neighbors, in both directions
    pub fn delete_edges_between(&mut self, node: NodeId, other: NodeId) -> GraphResult<usize> {
        let result = self.try_delete_between(node, other);
        self.checked("delete_edges_between", result)
    }

    fn try_delete_between(&mut self, node: NodeId, other: NodeId) -> GraphResult<usize> {
        let a = self.node(node)?;
        let b = self.node(other)?;
        if !self.is_neighbor(node, other) {
            return Err(GraphError::NotNeighbors(node, other));
        }

        // Both directions are checked before either is touched
        let mut edges = self.verified_edges(a, b)?;
        edges.extend(self.verified_edges(b, a)?);

        self.remove_edges(&edges);
        debug!("Deleted {} edges between {} and {}", edges.len(), node, other);
        Ok(edges.len())
    }

    /// Delete every edge incident to a node; returns how many were removed
    pub fn delete_all_edges(&mut self, node: NodeId) -> GraphResult<usize> {
        let result = self.try_delete_all(node);
        self.checked("delete_all_edges", result)
    }

    fn try_delete_all(&mut self, node: NodeId) -> GraphResult<usize> {
        self.node(node)?;
        let plan = self.plan_detach(&[node])?;
        if plan.is_empty() {
            self.report(
                Severity::Info,
                "delete_all_edges",
                format!("Node {} has no edges", node),
            );
            return Ok(0);
        }

        debug!("Removing all edges around {}\n{}", node, self.describe_edges(node));
        let edges: Vec<EdgeId> = plan.into_iter().collect();
        self.remove_edges(&edges);
        Ok(edges.len())
    }

    /// Edges `source -> sink`, after checking both endpoints agree on them
    ///
    /// The source's owned list and the sink's back-references must name the
    /// same edges with the same multiplicity (exactly once each), and every
    /// edge record must point at this pair.
    fn verified_edges(&self, source: &Node, sink: &Node) -> GraphResult<Vec<EdgeId>> {
        let inconsistent = |detail: String| GraphError::Consistency {
            node: source.id(),
            detail,
        };

        let mut owned = Vec::new();
        for &id in source.out_edges() {
            let edge = self
                .edges
                .get(id)
                .ok_or_else(|| inconsistent(format!("owned edge {} has no record", id)))?;
            if !edge.starts_from(source.id()) {
                return Err(inconsistent(format!("owned edge {} starts elsewhere", id)));
            }
            if edge.ends_at(sink.id()) {
                owned.push(id);
            }
        }

        let mut referenced = Vec::new();
        for &id in sink.in_edges() {
            let edge = self.edges.get(id).ok_or_else(|| {
                inconsistent(format!("back-reference {} in {} has no record", id, sink.id()))
            })?;
            if !edge.ends_at(sink.id()) {
                return Err(inconsistent(format!(
                    "back-reference {} in {} ends elsewhere",
                    id,
                    sink.id()
                )));
            }
            if edge.starts_from(source.id()) {
                referenced.push(id);
            }
        }

        let mut owned_sorted = owned.clone();
        owned_sorted.sort_unstable();
        referenced.sort_unstable();

        if owned_sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(inconsistent(format!(
                "an edge to {} is owned more than once",
                sink.id()
            )));
        }
        if owned_sorted != referenced {
            return Err(inconsistent(format!(
                "owns {} edges to {} but {} back-references them {} times",
                owned_sorted.len(),
                sink.id(),
                sink.id(),
                referenced.len()
            )));
        }

        Ok(owned)
    }

    /// Every edge incident to `targets`, verified pair by pair
    ///
    /// Neighbors are snapshotted before anything is checked, and nothing is
    /// mutated here.
    fn plan_detach(&self, targets: &[NodeId]) -> GraphResult<EdgeSet> {
        let mut plan = EdgeSet::default();

        for &target in targets {
            let node = self.node(target)?;
            let mut neighbors: IndexSet<NodeId, FxBuildHasher> = IndexSet::default();
            for &id in node.out_edges().iter().chain(node.in_edges()) {
                let edge = self.edges.get(id).ok_or_else(|| GraphError::Consistency {
                    node: target,
                    detail: format!("edge {} has no record", id),
                })?;
                let other = edge.opposite(target).ok_or_else(|| GraphError::Consistency {
                    node: target,
                    detail: format!("edge {} does not touch this node", id),
                })?;
                neighbors.insert(other);
            }

            let mut found = 0;
            for &other in &neighbors {
                let neighbor = self.nodes.get(other).ok_or_else(|| GraphError::Consistency {
                    node: target,
                    detail: format!("edge leads to missing node {}", other),
                })?;
                let outgoing = self.verified_edges(node, neighbor)?;
                let incoming = self.verified_edges(neighbor, node)?;
                found += outgoing.len() + incoming.len();
                plan.extend(outgoing);
                plan.extend(incoming);
            }

            if found != node.degree() {
                return Err(GraphError::Consistency {
                    node: target,
                    detail: format!("degree {} but {} edges accounted for", node.degree(), found),
                });
            }
        }

        Ok(plan)
    }

    /// Unlink and drop edges
    ///
    /// For each edge the sink's back-reference goes first, then the source's
    /// owned entry, then the record itself.
    fn remove_edges(&mut self, edges: &[EdgeId]) {
        for &id in edges {
            let Some(edge) = self.edges.get(id) else {
                continue;
            };
            let (source, sink) = (edge.source(), edge.sink());

            if let Some(node) = self.nodes.get_mut(sink) {
                node.remove_in_edge(id);
            }
            if let Some(node) = self.nodes.get_mut(source) {
                node.remove_out_edge(id);
            }
            self.edges.remove(id);
            debug!("Deleted edge {}: {} -> {}", id, source, sink);
        }
    }

    /// Destroy nodes whose edges were planned by `plan_detach`
    fn reclaim(&mut self, targets: &[NodeId], plan: &EdgeSet) -> Vec<Node> {
        let edges: Vec<EdgeId> = plan.iter().copied().collect();
        self.remove_edges(&edges);

        let mut reclaimed = Vec::with_capacity(targets.len());
        for &id in targets {
            let Some(node) = self.nodes.remove(id) else {
                continue;
            };
            for &graph in node.graphs() {
                if let Some(g) = self.graphs.get_mut(graph) {
                    g.remove(id);
                }
            }
            info!("Removed node {} ({})", node.name(), id);
            reclaimed.push(node);
        }
        reclaimed
    }

    // ============================================================
    // Graphs
    // ============================================================

    pub fn create_graph(&mut self, name: impl Into<String>) -> GraphId {
        let id = self.graphs.insert_with(|id| Graph::new(id, name));
        debug!("Created graph {}", id);
        id
    }

    /// Create a graph under the configured default name
    pub fn create_default_graph(&mut self) -> GraphId {
        let name = self.config.default_graph_name.clone();
        let id = self.create_graph(name);
        self.report(
            Severity::Warning,
            "create_default_graph",
            format!("Created graph {} with the default name", id),
        );
        id
    }

    pub fn get_graph(&self, id: GraphId) -> Option<&Graph> {
        self.graphs.get(id)
    }

    /// Mutable access to a graph's name and labels
    pub fn get_graph_mut(&mut self, id: GraphId) -> Option<&mut Graph> {
        self.graphs.get_mut(id)
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn graph_ids(&self) -> Vec<GraphId> {
        self.graphs.ids()
    }

    /// Add a node to a graph, giving the graph one strong hold on it
    pub fn add_to_graph(&mut self, graph: GraphId, node: NodeId) -> GraphResult<()> {
        let result = self.try_add_to_graph(graph, node);
        self.checked("add_to_graph", result)
    }

    fn try_add_to_graph(&mut self, graph: GraphId, node: NodeId) -> GraphResult<()> {
        self.try_refresh(graph)?;
        self.node(node)?;
        if self.graph(graph)?.contains(node) {
            return Err(GraphError::AlreadyMember { graph, node });
        }

        if let Some(g) = self.graphs.get_mut(graph) {
            g.insert(node);
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.join_graph(graph);
        }
        debug!("Added node {} to graph {}", node, graph);
        Ok(())
    }

    /// Remove a node from a graph without touching its edges
    ///
    /// If the graph held the node's last strong hold the node is destroyed.
    pub fn remove_from_graph(&mut self, graph: GraphId, node: NodeId) -> GraphResult<()> {
        let result = self.try_remove_from_graph(graph, node);
        self.checked("remove_from_graph", result)
    }

    fn try_remove_from_graph(&mut self, graph: GraphId, node: NodeId) -> GraphResult<()> {
        // A member held only by this graph is destroyed by the refresh itself
        if self.try_refresh(graph)?.contains(&node) {
            return Ok(());
        }
        if !self.graph(graph)?.contains(node) {
            return Err(GraphError::NotAMember { graph, node });
        }

        if let Some(g) = self.graphs.get_mut(graph) {
            g.remove(node);
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.leave_graph(graph);
        }
        debug!("Removed node {} from graph {}", node, graph);
        Ok(())
    }

    /// Delete all edges of a member node, keeping it in the graph
    pub fn delete_incident_edges(&mut self, graph: GraphId, node: NodeId) -> GraphResult<usize> {
        let result = self.try_delete_incident_edges(graph, node);
        self.checked("delete_incident_edges", result)
    }

    fn try_delete_incident_edges(&mut self, graph: GraphId, node: NodeId) -> GraphResult<usize> {
        self.try_refresh(graph)?;
        if !self.graph(graph)?.contains(node) {
            return Err(GraphError::NotAMember { graph, node });
        }
        self.try_delete_all(node)
    }

    /// Identity-based membership test; does not refresh
    pub fn graph_contains(&self, graph: GraphId, node: NodeId) -> bool {
        self.graphs.get(graph).is_some_and(|g| g.contains(node))
    }

    /// Members of a graph, after a refresh
    pub fn graph_nodes(&mut self, graph: GraphId) -> GraphResult<Vec<NodeId>> {
        let result = self
            .try_refresh(graph)
            .and_then(|_| self.graph(graph))
            .map(|g| g.members().collect());
        self.checked("graph_nodes", result)
    }

    /// Purge members held by nothing but this graph
    ///
    /// A member with no external hold and no other graph membership is
    /// unreachable from outside; it is dropped from the graph and destroyed.
    /// Returns the purged ids.
    pub fn refresh(&mut self, graph: GraphId) -> GraphResult<Vec<NodeId>> {
        let result = self.try_refresh(graph);
        self.checked("refresh", result)
    }

    fn try_refresh(&mut self, graph: GraphId) -> GraphResult<Vec<NodeId>> {
        let orphans: Vec<NodeId> = self
            .graph(graph)?
            .members()
            .filter(|&id| {
                self.nodes
                    .get(id)
                    .map_or(true, |n| n.external_holds() == 0 && n.graphs() == [graph])
            })
            .collect();

        if orphans.is_empty() {
            return Ok(orphans);
        }

        let live: Vec<NodeId> = orphans
            .iter()
            .copied()
            .filter(|&id| self.nodes.contains(id))
            .collect();
        let plan = self.plan_detach(&live)?;

        if let Some(g) = self.graphs.get_mut(graph) {
            for &id in &orphans {
                g.remove(id);
            }
        }
        for node in self.reclaim(&live, &plan) {
            debug!("Refresh purged node {} from graph {}", node.id(), graph);
        }
        Ok(orphans)
    }

    /// Delete a graph, releasing the hold it had on each member
    ///
    /// Members left with no strong hold are destroyed; their ids are
    /// returned.
    pub fn delete_graph(&mut self, graph: GraphId) -> GraphResult<Vec<NodeId>> {
        let result = self.try_delete_graph(graph);
        self.checked("delete_graph", result)
    }

    fn try_delete_graph(&mut self, graph: GraphId) -> GraphResult<Vec<NodeId>> {
        let members: Vec<NodeId> = self.graph(graph)?.members().collect();
        let orphans: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|&id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| n.external_holds() == 0 && n.graphs() == [graph])
            })
            .collect();
        let plan = self.plan_detach(&orphans)?;

        for &id in &members {
            if let Some(n) = self.nodes.get_mut(id) {
                n.leave_graph(graph);
            }
        }
        if let Some(g) = self.graphs.remove(graph) {
            info!("Deleted graph {} ({})", g.name(), graph);
        }

        self.reclaim(&orphans, &plan);
        Ok(orphans)
    }

    // ============================================================
    // Whole-store operations
    // ============================================================

    /// Check every ownership invariant across the whole store
    pub fn verify_integrity(&self) -> GraphResult<()> {
        let result = self.try_verify_integrity();
        self.checked("verify_integrity", result)
    }

    fn try_verify_integrity(&self) -> GraphResult<()> {
        let inconsistent = |node: NodeId, detail: String| GraphError::Consistency { node, detail };

        for (id, edge) in self.edges.iter() {
            let source = edge.source();
            let sink = edge.sink();
            if source == sink {
                return Err(inconsistent(source, format!("edge {} is a self-loop", id)));
            }

            let owners = self
                .nodes
                .iter()
                .filter(|(_, n)| n.has_out_edge(id))
                .map(|(nid, n)| (nid, n.out_edges().iter().filter(|&&e| e == id).count()))
                .collect::<Vec<_>>();
            if owners != [(source, 1)] {
                return Err(inconsistent(
                    source,
                    format!("edge {} is owned by {:?}, expected only its source", id, owners),
                ));
            }

            let holders = self
                .nodes
                .iter()
                .filter(|(_, n)| n.has_in_edge(id))
                .map(|(nid, n)| (nid, n.in_edges().iter().filter(|&&e| e == id).count()))
                .collect::<Vec<_>>();
            if holders != [(sink, 1)] {
                return Err(inconsistent(
                    sink,
                    format!("edge {} is back-referenced by {:?}, expected only its sink", id, holders),
                ));
            }
        }

        for (id, node) in self.nodes.iter() {
            for &edge in node.out_edges().iter().chain(node.in_edges()) {
                if !self.edges.contains(edge) {
                    return Err(inconsistent(id, format!("edge {} has no record", edge)));
                }
            }
            for &graph in node.graphs() {
                if !self.graph_contains(graph, id) {
                    return Err(inconsistent(id, format!("not listed by graph {}", graph)));
                }
            }
        }

        for (graph_id, graph) in self.graphs.iter() {
            for member in graph.members() {
                let listed = self
                    .nodes
                    .get(member)
                    .is_some_and(|n| n.graphs().contains(&graph_id));
                if !listed {
                    return Err(inconsistent(
                        member,
                        format!("member of graph {} without knowing it", graph_id),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Clear all data from the store
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.graphs.clear();
        info!("Cleared graph store");
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
