//! Selection Data Structures
//!
//! The buffer's selection is a proper sum type: a text caret/range inside one
//! node, a contiguous multi-block range, or nothing. Modeling the variants as
//! enums lets navigation match exhaustively instead of null-checking fields.

use serde::{Deserialize, Serialize};

/// A location in a node's text, in codepoint offsets.
///
/// Offsets are clamped to the node's current text length by the selection
/// service whenever a selection is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaretPoint {
    pub node_id: String,
    pub offset: usize,
}

impl CaretPoint {
    pub fn new(node_id: impl Into<String>, offset: usize) -> Self {
        Self {
            node_id: node_id.into(),
            offset,
        }
    }
}

/// Association of a caret sitting exactly on a visual-line wrap boundary.
///
/// At a wrap the same offset is both the end of line N and the start of line
/// N+1. The association decides which line the caret is on, which in turn
/// decides whether a vertical move stays inside the node or exits it.
///
/// Selections set without an explicit association use [`Assoc::Unset`],
/// which is documented to behave as [`Assoc::Downstream`] (start of the next
/// line) at wrap boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Assoc {
    /// Attached to the end of the previous visual line
    Upstream,
    /// No explicit association; ties break downstream
    #[default]
    Unset,
    /// Attached to the start of the next visual line
    Downstream,
}

impl Assoc {
    /// Whether a wrap-boundary caret belongs to the earlier line.
    pub fn sticks_upstream(self) -> bool {
        matches!(self, Assoc::Upstream)
    }
}

/// Which visual line of a node a cross-node vertical move landed on.
///
/// Recorded when a vertical move enters a node, so follow-up moves know the
/// caret's line without re-deriving it from an ambiguous offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalLine {
    First,
    Last,
}

/// Caret or range inside text-edit mode.
///
/// `goal_x` is the pixel column a vertical move tries to preserve; it is only
/// meaningful immediately after a vertical move and is cleared by horizontal
/// moves and edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSelection {
    pub anchor: CaretPoint,
    pub focus: CaretPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_line: Option<GoalLine>,
    #[serde(default)]
    pub assoc: Assoc,
}

impl TextSelection {
    /// Collapsed caret at one point.
    pub fn caret(node_id: impl Into<String>, offset: usize) -> Self {
        let point = CaretPoint::new(node_id, offset);
        Self {
            anchor: point.clone(),
            focus: point,
            goal_x: None,
            goal_line: None,
            assoc: Assoc::Unset,
        }
    }

    /// Range selection; anchor stays fixed while focus moves.
    pub fn range(anchor: CaretPoint, focus: CaretPoint) -> Self {
        Self {
            anchor,
            focus,
            goal_x: None,
            goal_line: None,
            assoc: Assoc::Unset,
        }
    }

    pub fn with_assoc(mut self, assoc: Assoc) -> Self {
        self.assoc = assoc;
        self
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.focus
    }
}

/// A contiguous multi-block range in visible order.
///
/// The anchor stays fixed while the focus moves during shift-extension.
/// `last_focused_id` survives selection clearing so a later arrow key can
/// resume navigation from the same block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSelection {
    /// Selected block ids as a visible-order run
    pub members: Vec<String>,
    pub anchor_id: String,
    pub focus_id: String,
    pub last_focused_id: String,
}

impl BlockSelection {
    /// Select a single block (anchor = focus).
    pub fn single(block_id: impl Into<String>) -> Self {
        let id = block_id.into();
        Self {
            members: vec![id.clone()],
            anchor_id: id.clone(),
            focus_id: id.clone(),
            last_focused_id: id,
        }
    }

    /// Range of blocks; `members` must be the visible-order run covering
    /// anchor and focus.
    pub fn range(members: Vec<String>, anchor_id: String, focus_id: String) -> Self {
        let last_focused_id = focus_id.clone();
        Self {
            members,
            anchor_id,
            focus_id,
            last_focused_id,
        }
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m == id)
    }
}

/// The buffer's current selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    None,
    Text(TextSelection),
    Blocks(BlockSelection),
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }
}

/// Which surface owns focus. Exactly one buffer-scoped target is active at a
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActiveTarget {
    #[default]
    None,
    /// Editing the buffer's title node
    Title { buffer_id: String },
    /// Editing text inside one block
    Block { block_id: String },
    /// The buffer itself, acting as a block-selection surface
    BufferSurface { buffer_id: String },
}
