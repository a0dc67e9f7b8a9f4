//! Core multigraph implementation
//!
//! This module implements the ownership model with:
//! - Nodes that own their outgoing edges and back-reference incoming ones
//! - Directed, named, labeled edges; parallel edges allowed by default
//! - Graphs as membership containers that hold their nodes alive
//! - Arena storage with generational ids, so stale ids never resolve

pub(crate) mod arena;
pub mod config;
pub mod diagnostics;
pub mod edge;
pub mod error;
pub mod membership;
pub mod node;
pub mod store;
pub mod types;

// Re-export main types
pub use config::{ConfigError, EdgeMultiplicity, StoreConfig};
pub use diagnostics::{ChannelSink, DiagnosticEvent, DiagnosticSink, NullSink, Severity, TracingSink};
pub use edge::Edge;
pub use error::{ErrorKind, GraphError, GraphResult};
pub use membership::Graph;
pub use node::Node;
pub use store::GraphStore;
pub use types::{EdgeId, GraphId, Label, NodeId, StructuralFlags};
