//! Tree Edit Operations
//!
//! Composite edits built from the tree store, the text store and the
//! selection service: split on Enter, indent, outdent and the two merges.
//! Each one is a short transaction over the stores that preserves the
//! no-orphan invariant (a structural edit never removes a node whose
//! children would be left without a valid parent) and moves formatted runs
//! rather than plain strings, so marks straddling a split or merge point
//! survive.
//!
//! All preconditions are reported as typed errors and leave the document
//! untouched; callers treat an error as a no-op.

pub mod error;

pub use error::OperationError;

use crate::models::Selection;
use crate::services::selection::SelectionService;
use crate::store::text::TextStore;
use crate::store::tree::{AnchorPolicy, TreeStore};

/// One editing session's view over the stores, borrowed per keystroke.
pub struct EditOperations<'a> {
    tree: &'a mut TreeStore,
    text: &'a mut TextStore,
    selection: &'a mut SelectionService,
}

impl<'a> EditOperations<'a> {
    pub fn new(
        tree: &'a mut TreeStore,
        text: &'a mut TextStore,
        selection: &'a mut SelectionService,
    ) -> Self {
        Self {
            tree,
            text,
            selection,
        }
    }

    /// Enter in text-edit mode: split the focused node's text at the caret.
    ///
    /// The text after the caret moves, formatting intact, into a new node.
    /// When the split node has children the new node becomes its first child
    /// (the same rule the title uses); otherwise it becomes the next
    /// sibling. The caret lands at offset 0 of the new node. Returns the new
    /// node's id.
    ///
    /// # Errors
    ///
    /// - `NotTextCaret` when the selection is not a collapsed text caret
    /// - `NotFound` when the focused node no longer exists
    pub fn split_on_enter(&mut self) -> Result<String, OperationError> {
        let caret = match self.selection.selection() {
            Selection::Text(sel) if sel.is_caret() => sel.focus.clone(),
            _ => return Err(OperationError::NotTextCaret),
        };
        let node = caret.node_id;
        if !self.tree.exists(&node) {
            return Err(OperationError::not_found(&node));
        }
        let total = self.text.len(&node);
        let offset = caret.offset.min(total);
        let tail = self.text.deltas_in_range(&node, offset, total - offset);

        let new_id = if self.tree.children(Some(&node)).is_empty() {
            let parent = self.tree.parent(&node).map(str::to_string);
            self.tree
                .insert_or_move(None, parent.as_deref(), AnchorPolicy::After, Some(&node))?
        } else {
            self.tree
                .insert_or_move(None, Some(&node), AnchorPolicy::Before, None)?
        };

        self.text.delete(&node, offset, total - offset);
        if !tail.is_empty() {
            self.text.insert_runs(&new_id, 0, &tail);
        }
        self.selection.set_caret(self.tree, self.text, &new_id, 0);
        tracing::debug!(from = %node, to = %new_id, offset, "split node");
        Ok(new_id)
    }

    /// Tab: a contiguous run of siblings becomes trailing children of the
    /// previous sibling, keeping their relative order.
    ///
    /// # Errors
    ///
    /// - `NotFound` when any node is missing
    /// - `MixedParents` when the nodes do not share a parent
    /// - `NoIndentTarget` when there is no previous sibling to indent under
    pub fn indent(&mut self, ids: &[String]) -> Result<(), OperationError> {
        let Some(ordered) = self.sibling_run(ids)? else {
            return Ok(());
        };
        let parent = self.tree.parent(&ordered[0]).map(str::to_string);
        let siblings = self.tree.children(parent.as_deref());
        let first_idx = siblings
            .iter()
            .position(|s| *s == ordered[0])
            .ok_or(OperationError::MixedParents)?;
        let target = first_idx
            .checked_sub(1)
            .map(|i| siblings[i].clone())
            .ok_or(OperationError::NoIndentTarget)?;

        for id in &ordered {
            self.tree
                .insert_or_move(Some(id), Some(&target), AnchorPolicy::After, None)?;
        }
        Ok(())
    }

    /// Shift+Tab: a contiguous run of siblings moves out to sit immediately
    /// after their parent, keeping relative order (moved in reverse so each
    /// lands before the previously moved one).
    ///
    /// # Errors
    ///
    /// - `NotFound` when any node is missing
    /// - `MixedParents` when the nodes do not share a parent
    /// - `NoParent` when the nodes have no parent at all
    /// - `BufferBoundary` when the parent is the buffer root or has no
    ///   parent itself (outdenting past the buffer is disallowed)
    pub fn outdent(&mut self, ids: &[String]) -> Result<(), OperationError> {
        let Some(ordered) = self.sibling_run(ids)? else {
            return Ok(());
        };
        let parent = self
            .tree
            .parent(&ordered[0])
            .map(str::to_string)
            .ok_or(OperationError::NoParent)?;
        if parent == self.selection.buffer_root() {
            return Err(OperationError::BufferBoundary);
        }
        let grandparent = self
            .tree
            .parent(&parent)
            .map(str::to_string)
            .ok_or(OperationError::BufferBoundary)?;

        for id in ordered.iter().rev() {
            self.tree.insert_or_move(
                Some(id),
                Some(&grandparent),
                AnchorPolicy::After,
                Some(&parent),
            )?;
        }
        Ok(())
    }

    /// Delete at the end of a node's text: pull the merge target's formatted
    /// text into this node and delete the target.
    ///
    /// The target is the node's first child when it has expanded children,
    /// otherwise its next sibling. Either way the target must itself be
    /// childless, so the merge can never orphan grandchildren, and a merge
    /// never reaches across a subtree boundary. The caret lands at the join
    /// point. Returns the deleted target's id.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the node is missing
    /// - `NoMergeTarget` when there is nothing to merge (no next sibling)
    /// - `WouldOrphan` when the target has children of its own
    pub fn merge_forward(&mut self, node_id: &str) -> Result<String, OperationError> {
        if !self.tree.exists(node_id) {
            return Err(OperationError::not_found(node_id));
        }
        let children = self.tree.children(Some(node_id));
        let target = if self.tree.is_expanded(node_id) && !children.is_empty() {
            children[0].clone()
        } else {
            let parent = self.tree.parent(node_id).map(str::to_string);
            let siblings = self.tree.children(parent.as_deref());
            let idx = siblings
                .iter()
                .position(|s| s == node_id)
                .ok_or_else(|| OperationError::not_found(node_id))?;
            siblings
                .get(idx + 1)
                .cloned()
                .ok_or_else(|| OperationError::no_merge_target(node_id))?
        };
        if !self.tree.children(Some(&target)).is_empty() {
            return Err(OperationError::would_orphan(&target));
        }

        let join = self.text.len(node_id);
        let target_len = self.text.len(&target);
        let runs = self.text.deltas_in_range(&target, 0, target_len);
        if !runs.is_empty() {
            self.text.insert_runs(node_id, join, &runs);
        }
        self.tree.delete_subtree(&target);
        self.text.remove(&target);
        self.selection.set_caret(self.tree, self.text, node_id, join);
        tracing::debug!(into = node_id, from = %target, join, "merged forward");
        Ok(target)
    }

    /// Backspace at offset 0: merge this node into the previous visible
    /// node, which is a forward merge performed from that node. The same
    /// no-orphan guards apply. Returns the deleted node's id (this one).
    ///
    /// # Errors
    ///
    /// Same as [`EditOperations::merge_forward`], plus `NoMergeTarget` when
    /// there is no previous visible node.
    pub fn merge_backward(&mut self, node_id: &str) -> Result<String, OperationError> {
        if !self.tree.exists(node_id) {
            return Err(OperationError::not_found(node_id));
        }
        let root = self.selection.buffer_root().to_string();
        let prev = self
            .tree
            .prev_visible(&root, node_id)
            .ok_or_else(|| OperationError::no_merge_target(node_id))?;
        self.merge_forward(&prev)
    }

    /// Validate a same-parent node set and return it in sibling order.
    /// `Ok(None)` means an empty input (a no-op for every caller).
    fn sibling_run(&self, ids: &[String]) -> Result<Option<Vec<String>>, OperationError> {
        let Some(first) = ids.first() else {
            return Ok(None);
        };
        for id in ids {
            if !self.tree.exists(id) {
                return Err(OperationError::not_found(id));
            }
        }
        let parent = self.tree.parent(first).map(str::to_string);
        if ids
            .iter()
            .any(|id| self.tree.parent(id) != parent.as_deref())
        {
            return Err(OperationError::MixedParents);
        }
        let siblings = self.tree.children(parent.as_deref());
        let ordered: Vec<String> = siblings
            .into_iter()
            .filter(|s| ids.contains(s))
            .collect();
        if ordered.len() != ids.len() {
            return Err(OperationError::MixedParents);
        }
        Ok(Some(ordered))
    }
}
