//! Focus Coordinator
//!
//! Routes Escape and Enter between the two selection modes. Escape steps
//! outward (text caret to block selection, block selection to a cleared
//! buffer surface); Enter steps back inward (block selection to a caret at
//! the end of the focused block's text).

use crate::models::{BlockSelection, Selection};
use crate::services::selection::SelectionService;
use crate::store::text::TextStore;
use crate::store::tree::TreeStore;

/// Stateless mode-transition logic over the selection service.
pub struct FocusCoordinator;

impl FocusCoordinator {
    /// Escape steps one level outward. From a text selection inside a block
    /// the whole block becomes selected; from the title there is no block
    /// to select, so the selection clears to the buffer surface. From a
    /// block selection the selection clears while the resume anchor stays,
    /// so arrow keys pick navigation back up at the same spot. With nothing
    /// selected Escape does nothing.
    pub fn escape(svc: &mut SelectionService, tree: &mut TreeStore) {
        match svc.selection().clone() {
            Selection::Text(sel) => {
                if sel.focus.node_id == svc.buffer_root() {
                    svc.clear_keeping_anchor();
                } else {
                    svc.set_block_selection(tree, BlockSelection::single(sel.focus.node_id));
                }
            }
            Selection::Blocks(_) => svc.clear_keeping_anchor(),
            Selection::None => {}
        }
    }

    /// Enter on a block selection drops into text editing with a caret at
    /// the end of the focused block's text. In any other state Enter is not
    /// a focus transition and is left to the edit layer.
    pub fn enter(svc: &mut SelectionService, tree: &mut TreeStore, text: &TextStore) {
        if let Selection::Blocks(sel) = svc.selection().clone() {
            let end = text.len(&sel.focus_id);
            svc.set_caret(tree, text, &sel.focus_id, end);
        }
    }
}
