//! Node Data Structures
//!
//! This module defines the core `Node` struct and the `ParentLink` edge that
//! places a node in the outline tree.
//!
//! # Architecture
//!
//! - **Flat arena**: nodes exist independently of tree position and are
//!   addressed by stable string ids, never by live references
//! - **Link table**: parent/child/sibling relationships are derived from the
//!   `ParentLink` table by query, not by traversing a pointer graph
//! - **Dense ordering**: siblings are totally ordered by a fractional-index
//!   position string (see [`crate::store::fractional_index`])

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of content in the outline: the buffer title or a block.
///
/// A `Node` carries identity and timestamps only. Its text lives in the
/// per-node text log, and its place in the tree lives in a [`ParentLink`].
/// A node therefore exists independently of tree position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier (UUID v4 string)
    pub id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl Node {
    /// Create a new node with an auto-generated UUID.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Create a new node with an explicit id (tests, deterministic fixtures).
    pub fn with_id(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

/// Edge from a child node to its parent, with sibling ordering.
///
/// Each child has at most one parent link. `parent_id = None` marks a root
/// node. The `position` string totally orders siblings lexicographically;
/// it is generated by the fractional-indexing scheme so arbitrarily many
/// insertions can land between any two existing siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentLink {
    /// The child this link positions
    pub child_id: String,

    /// Parent node id, or `None` for root nodes
    pub parent_id: Option<String>,

    /// Fractional-index position among siblings (lexicographic order)
    pub position: String,

    /// Hidden links are excluded from child listings and visible order
    pub is_hidden: bool,
}

impl ParentLink {
    /// Create a visible link.
    pub fn new(
        child_id: impl Into<String>,
        parent_id: Option<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            child_id: child_id.into(),
            parent_id,
            position: position.into(),
            is_hidden: false,
        }
    }
}
