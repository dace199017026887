//! Store Layer Error Types

use thiserror::Error;

/// Errors from tree-store mutations.
///
/// Queries degrade to `Option`/empty results instead of erroring; only
/// mutations that were handed an invalid reference fail, and callers are
/// expected to treat failure as a no-op rather than a crash.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Referenced node does not exist
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Referenced parent does not exist (caller error: reject, don't create)
    #[error("Invalid parent node: {parent_id}")]
    InvalidParent { parent_id: String },

    /// Referenced sibling does not exist or lives under a different parent
    #[error("Invalid sibling node: {sibling_id}")]
    InvalidSibling { sibling_id: String },

    /// Moving a node under its own descendant
    #[error("Circular move: '{node_id}' cannot become a descendant of itself")]
    CircularMove { node_id: String },
}

impl StoreError {
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    pub fn invalid_parent(parent_id: impl Into<String>) -> Self {
        Self::InvalidParent {
            parent_id: parent_id.into(),
        }
    }

    pub fn invalid_sibling(sibling_id: impl Into<String>) -> Self {
        Self::InvalidSibling {
            sibling_id: sibling_id.into(),
        }
    }

    pub fn circular_move(node_id: impl Into<String>) -> Self {
        Self::CircularMove {
            node_id: node_id.into(),
        }
    }
}
