//! Error types for composite tree-edit operations.
//!
//! Every variant is a recoverable precondition failure: callers treat an
//! error as "nothing happened" and leave the document untouched. None of
//! these surface to the user as a dialog.

use thiserror::Error;

use crate::store::error::StoreError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("node not found: {id}")]
    NotFound { id: String },

    #[error("operation requires a collapsed text caret")]
    NotTextCaret,

    #[error("nodes do not share a parent")]
    MixedParents,

    #[error("node has no parent")]
    NoParent,

    #[error("operation would cross the buffer boundary")]
    BufferBoundary,

    #[error("no previous sibling to indent under")]
    NoIndentTarget,

    #[error("merging {id} would orphan its children")]
    WouldOrphan { id: String },

    #[error("no merge target for {id}")]
    NoMergeTarget { id: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl OperationError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn would_orphan(id: impl Into<String>) -> Self {
        Self::WouldOrphan { id: id.into() }
    }

    pub fn no_merge_target(id: impl Into<String>) -> Self {
        Self::NoMergeTarget { id: id.into() }
    }
}
