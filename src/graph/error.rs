//! Errors that can occur during graph operations

use super::types::{EdgeId, GraphId, NodeId};
use thiserror::Error;

/// Broad classification of a [`GraphError`]
///
/// `Validation` and `NotFound` are expected during normal use and leave the
/// store untouched. `Consistency` means the two-sided edge bookkeeping
/// disagreed, which only happens if something bypassed the store's API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Consistency,
}

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Graph {0} not found")]
    GraphNotFound(GraphId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Invalid edge: node {0} cannot be linked to itself")]
    SelfLoop(NodeId),

    #[error("An edge {from} -> {to} already exists")]
    DuplicateEdge { from: NodeId, to: NodeId },

    #[error("Expected a single edge {from} -> {to}, found {count}")]
    MultipleEdges {
        from: NodeId,
        to: NodeId,
        count: usize,
    },

    #[error("No edge {from} -> {to}")]
    NotConnected { from: NodeId, to: NodeId },

    #[error("Nodes {0} and {1} are not neighbors")]
    NotNeighbors(NodeId, NodeId),

    #[error("Node {node} is already a member of graph {graph}")]
    AlreadyMember { graph: GraphId, node: NodeId },

    #[error("Node {node} is not a member of graph {graph}")]
    NotAMember { graph: GraphId, node: NodeId },

    #[error("Node {0} has no external hold to release")]
    NoExternalHold(NodeId),

    #[error("Bookkeeping around node {node} is inconsistent: {detail}")]
    Consistency { node: NodeId, detail: String },
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::NodeNotFound(_)
            | GraphError::EdgeNotFound(_)
            | GraphError::GraphNotFound(_)
            | GraphError::NotAMember { .. }
            | GraphError::NotConnected { .. } => ErrorKind::NotFound,
            GraphError::Consistency { .. } => ErrorKind::Consistency,
            GraphError::InvalidEdgeSource(_)
            | GraphError::InvalidEdgeTarget(_)
            | GraphError::SelfLoop(_)
            | GraphError::DuplicateEdge { .. }
            | GraphError::MultipleEdges { .. }
            | GraphError::NotNeighbors(_, _)
            | GraphError::AlreadyMember { .. }
            | GraphError::NoExternalHold(_) => ErrorKind::Validation,
        }
    }

    pub fn is_consistency(&self) -> bool {
        self.kind() == ErrorKind::Consistency
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let n = NodeId::new(1, 0);
        let m = NodeId::new(2, 0);

        assert_eq!(GraphError::SelfLoop(n).kind(), ErrorKind::Validation);
        assert_eq!(GraphError::NotNeighbors(n, m).kind(), ErrorKind::Validation);
        assert_eq!(GraphError::NodeNotFound(n).kind(), ErrorKind::NotFound);
        assert_eq!(
            GraphError::NotAMember {
                graph: GraphId::new(0, 0),
                node: n
            }
            .kind(),
            ErrorKind::NotFound
        );

        let corrupt = GraphError::Consistency {
            node: n,
            detail: "mismatch".to_string(),
        };
        assert!(corrupt.is_consistency());
    }

    #[test]
    fn test_error_messages() {
        let n = NodeId::new(3, 1);
        assert_eq!(
            GraphError::SelfLoop(n).to_string(),
            "Invalid edge: node NodeId(3v1) cannot be linked to itself"
        );
        assert_eq!(
            GraphError::NodeNotFound(n).to_string(),
            "Node NodeId(3v1) not found"
        );
    }
}
