//! Error types for graph store operations.
//!
//! Every mutating call validates before it commits, so an `Err` always
//! means the store is unchanged.

use crate::model::NodeType;
use std::fmt;
use thiserror::Error;

/// Result type for graph store operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// The entity class an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Edge,
    Group,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Node => "node",
            EntityKind::Edge => "edge",
            EntityKind::Group => "group",
        })
    }
}

/// Errors raised by the graph store and its collaborators.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The operation would break a structural invariant.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The operation targets an id that does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// JSON interchange error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FlowError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        FlowError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FlowError::NotFound { .. })
    }
}

/// Structural violations rejected before any mutation commits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("edge {edge} references missing node {node}")]
    DanglingEdge { edge: String, node: String },

    #[error("node {node} references missing group {group}")]
    DanglingGroup { node: String, group: String },

    #[error("group {group} lists missing node {node}")]
    MissingMember { group: String, node: String },

    #[error("node {node} already belongs to group {group}")]
    AlreadyGrouped { node: String, group: String },

    #[error("node {node} and group {group} disagree about membership")]
    MembershipMismatch { node: String, group: String },

    #[error("node {node} is a {expected}, cannot take {found} props")]
    PropsMismatch {
        node: String,
        expected: NodeType,
        found: NodeType,
    },

    #[error("unknown node type: {0:?}")]
    UnknownNodeType(String),

    #[error("invalid {node_type} props: {reason}")]
    InvalidProps { node_type: NodeType, reason: String },
}
