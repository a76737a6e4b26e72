//! Error types for the compute flow engine
//!
//! Only programmer-level faults and I/O end up here. Rejected
//! connections, incomplete documents and cyclic graphs are reported as
//! values by the validator, serializer and planner.

use thiserror::Error;

/// Result type alias using ComputeFlowError
pub type Result<T> = std::result::Result<T, ComputeFlowError>;

/// Errors that can occur in the compute flow engine
#[derive(Debug, Error)]
pub enum ComputeFlowError {
    /// An edge references a node that is not part of the graph
    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    UnknownNode { edge_id: String, node_id: String },

    /// A lookup by node ID found nothing
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComputeFlowError {
    /// Create an unknown node error for an edge endpoint
    pub fn unknown_node(edge_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self::UnknownNode {
            edge_id: edge_id.into(),
            node_id: node_id.into(),
        }
    }
}
