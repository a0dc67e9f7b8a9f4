//! Multigraph
//!
//! A directed, labeled multigraph in which every node owns its outgoing edges
//! and keeps back-references to its incoming ones. Named graphs group nodes
//! and keep them alive; a lazy refresh destroys members nothing else holds.
//!
//! # Architecture
//!
//! - All records live in one [`GraphStore`], addressed by generational ids
//! - Every mutation validates and plans before it applies, so a failed call
//!   changes nothing
//! - Edge removal checks that both endpoints agree on the edge first
//! - Diagnostics go through an injected [`DiagnosticSink`] (tracing by default)
//!
//! # Example
//!
//! ```rust
//! use multigraph::GraphStore;
//!
//! let mut store = GraphStore::new();
//!
//! let o = store.create_node("O");
//! let h1 = store.create_node("H");
//! let h2 = store.create_node("H");
//!
//! store.add_child(o, "bond", h1).unwrap();
//! store.add_child(o, "bond", h2).unwrap();
//!
//! assert_eq!(store.children(o).unwrap(), vec![h1, h2]);
//! assert_eq!(store.parents(h1).unwrap(), vec![o]);
//!
//! let water = store.create_graph("water");
//! for n in [o, h1, h2] {
//!     store.add_to_graph(water, n).unwrap();
//! }
//! assert_eq!(store.graph_nodes(water).unwrap().len(), 3);
//! ```

pub mod graph;

// Re-export main types for convenience
pub use graph::{
    ChannelSink, ConfigError, DiagnosticEvent, DiagnosticSink, Edge, EdgeId, EdgeMultiplicity,
    ErrorKind, Graph, GraphError, GraphId, GraphResult, GraphStore, Label, Node, NodeId, NullSink,
    Severity, StoreConfig, StructuralFlags, TracingSink,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
