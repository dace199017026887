//! Selection Model
//!
//! Owns the buffer's current selection (text caret/range, block range, or
//! nothing) and the active focus target. All offsets are clamped against the
//! current text logs, every referenced node gets its collapsed ancestors
//! expanded so the UI can actually show the selection, and re-setting an
//! identical value is a no-op that emits no change notification.

use crate::models::{
    ActiveTarget, BlockSelection, CaretPoint, Selection, TextSelection,
};
use crate::store::events::{DomainEvent, EventBus};
use crate::store::text::TextStore;
use crate::store::tree::TreeStore;

/// Buffer-scoped selection state.
pub struct SelectionService {
    buffer_root: String,
    selection: Selection,
    active_target: ActiveTarget,
    /// Block to resume navigation at after the selection was cleared.
    /// Clearing and "where to re-enter" are deliberately separate.
    resume_block_id: Option<String>,
    events: EventBus,
}

impl SelectionService {
    pub fn new(buffer_root: impl Into<String>, events: EventBus) -> Self {
        Self {
            buffer_root: buffer_root.into(),
            selection: Selection::None,
            active_target: ActiveTarget::None,
            resume_block_id: None,
            events,
        }
    }

    pub fn buffer_root(&self) -> &str {
        &self.buffer_root
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_target(&self) -> &ActiveTarget {
        &self.active_target
    }

    /// Block to restore when an arrow key follows a cleared selection.
    pub fn resume_block_id(&self) -> Option<&str> {
        self.resume_block_id.as_deref()
    }

    /// Set a collapsed caret. Degrades to a no-op when the node is gone.
    pub fn set_caret(
        &mut self,
        tree: &mut TreeStore,
        text: &TextStore,
        node_id: &str,
        offset: usize,
    ) {
        self.set_text_selection(tree, text, TextSelection::caret(node_id, offset));
    }

    /// Set an anchor/focus range. Degrades to a no-op when either node is
    /// gone.
    pub fn set_range(
        &mut self,
        tree: &mut TreeStore,
        text: &TextStore,
        anchor: CaretPoint,
        focus: CaretPoint,
    ) {
        self.set_text_selection(tree, text, TextSelection::range(anchor, focus));
    }

    /// Set a full text selection: clamps offsets, expands collapsed
    /// ancestors (deduplicated across anchor and focus), updates the active
    /// target, and notifies only when something actually changed.
    pub fn set_text_selection(
        &mut self,
        tree: &mut TreeStore,
        text: &TextStore,
        mut sel: TextSelection,
    ) {
        if !tree.exists(&sel.anchor.node_id) || !tree.exists(&sel.focus.node_id) {
            tracing::debug!(
                anchor = %sel.anchor.node_id,
                focus = %sel.focus.node_id,
                "text selection references missing node; ignoring"
            );
            return;
        }
        sel.anchor.offset = sel.anchor.offset.min(text.len(&sel.anchor.node_id));
        sel.focus.offset = sel.focus.offset.min(text.len(&sel.focus.node_id));

        tree.expand_ancestors_of_all(
            [sel.anchor.node_id.as_str(), sel.focus.node_id.as_str()].into_iter(),
        );

        let target = if sel.focus.node_id == self.buffer_root {
            ActiveTarget::Title {
                buffer_id: self.buffer_root.clone(),
            }
        } else {
            ActiveTarget::Block {
                block_id: sel.focus.node_id.clone(),
            }
        };
        self.apply(Selection::Text(sel), target);
    }

    /// Set a block selection: expands collapsed ancestors of every member
    /// (shared ancestors walked once), remembers the focus for later
    /// restoration, and notifies only on change.
    pub fn set_block_selection(&mut self, tree: &mut TreeStore, sel: BlockSelection) {
        if sel.members.is_empty() {
            self.clear_keeping_anchor();
            return;
        }
        if sel.members.iter().any(|m| !tree.exists(m)) {
            tracing::debug!("block selection references missing node; ignoring");
            return;
        }
        tree.expand_ancestors_of_all(sel.members.iter().map(String::as_str));

        self.resume_block_id = Some(sel.focus_id.clone());
        let target = ActiveTarget::BufferSurface {
            buffer_id: self.buffer_root.clone(),
        };
        self.apply(Selection::Blocks(sel), target);
    }

    /// Point focus at a surface directly (focus handoff from the shell)
    /// without touching the selection.
    pub fn set_active_target(&mut self, target: ActiveTarget) {
        let selection = self.selection.clone();
        self.apply(selection, target);
    }

    /// Clear the selection while keeping the buffer active and preserving
    /// the resume anchor, so a subsequent arrow key can pick navigation back
    /// up at the last focused block.
    pub fn clear_keeping_anchor(&mut self) {
        let target = ActiveTarget::BufferSurface {
            buffer_id: self.buffer_root.clone(),
        };
        self.apply(Selection::None, target);
    }

    /// Full reset: selection, focus target and resume anchor.
    pub fn clear(&mut self) {
        self.resume_block_id = None;
        self.apply(Selection::None, ActiveTarget::None);
    }

    /// Replace selection and target, emitting one notification per field
    /// that actually changed.
    fn apply(&mut self, selection: Selection, target: ActiveTarget) {
        if self.selection != selection {
            self.selection = selection;
            self.events.emit(DomainEvent::SelectionChanged {
                selection: self.selection.clone(),
            });
        }
        if self.active_target != target {
            self.active_target = target;
            self.events.emit(DomainEvent::ActiveTargetChanged {
                target: self.active_target.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextAttrs;
    use crate::store::tree::AnchorPolicy;

    struct Fixture {
        tree: TreeStore,
        text: TextStore,
        svc: SelectionService,
        rx: tokio::sync::broadcast::Receiver<DomainEvent>,
        root: String,
        a: String,
        a1: String,
    }

    fn fixture() -> Fixture {
        let events = EventBus::new();
        let mut tree = TreeStore::new(events.clone());
        let mut text = TextStore::new(events.clone());
        let root = tree.create_node(None, AnchorPolicy::After, None).unwrap();
        let a = tree
            .create_node(Some(&root), AnchorPolicy::After, None)
            .unwrap();
        let a1 = tree.create_node(Some(&a), AnchorPolicy::After, None).unwrap();
        text.insert(&a, 0, "hello", TextAttrs::none());
        let svc = SelectionService::new(root.clone(), events.clone());
        let rx = events.subscribe();
        Fixture {
            tree,
            text,
            svc,
            rx,
            root,
            a,
            a1,
        }
    }

    fn selection_events(rx: &mut tokio::sync::broadcast::Receiver<DomainEvent>) -> usize {
        let mut count = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, DomainEvent::SelectionChanged { .. }) {
                count += 1;
            }
        }
        count
    }

    #[test]
    fn test_set_caret_clamps_offset() {
        let mut f = fixture();
        f.svc.set_caret(&mut f.tree, &f.text, &f.a, 99);
        match f.svc.selection() {
            Selection::Text(sel) => assert_eq!(sel.focus.offset, 5),
            other => panic!("unexpected selection: {other:?}"),
        }
    }

    #[test]
    fn test_set_caret_updates_active_target() {
        let mut f = fixture();
        f.svc.set_caret(&mut f.tree, &f.text, &f.a, 0);
        assert_eq!(
            f.svc.active_target(),
            &ActiveTarget::Block {
                block_id: f.a.clone()
            }
        );

        let root = f.root.clone();
        f.svc.set_caret(&mut f.tree, &f.text, &root, 0);
        assert_eq!(
            f.svc.active_target(),
            &ActiveTarget::Title { buffer_id: root }
        );
    }

    #[test]
    fn test_idempotent_set_emits_once() {
        let mut f = fixture();
        f.svc.set_caret(&mut f.tree, &f.text, &f.a, 2);
        f.svc.set_caret(&mut f.tree, &f.text, &f.a, 2);
        assert_eq!(selection_events(&mut f.rx), 1);
    }

    #[test]
    fn test_missing_node_is_noop() {
        let mut f = fixture();
        f.svc.set_caret(&mut f.tree, &f.text, "ghost", 0);
        assert!(f.svc.selection().is_none());
        assert_eq!(selection_events(&mut f.rx), 0);
    }

    #[test]
    fn test_selection_expands_collapsed_ancestors() {
        let mut f = fixture();
        f.tree.set_collapsed(&f.a, true);
        f.tree.set_collapsed(&f.root, true);
        let a1 = f.a1.clone();
        f.svc.set_caret(&mut f.tree, &f.text, &a1, 0);
        assert!(f.tree.is_expanded(&f.a));
        assert!(f.tree.is_expanded(&f.root));
    }

    #[test]
    fn test_clear_keeps_resume_anchor() {
        let mut f = fixture();
        let sel = BlockSelection::single(f.a.clone());
        f.svc.set_block_selection(&mut f.tree, sel);
        f.svc.clear_keeping_anchor();
        assert!(f.svc.selection().is_none());
        assert_eq!(f.svc.resume_block_id(), Some(f.a.as_str()));
        assert_eq!(
            f.svc.active_target(),
            &ActiveTarget::BufferSurface {
                buffer_id: f.root.clone()
            }
        );
    }

    #[test]
    fn test_full_clear_drops_anchor() {
        let mut f = fixture();
        let sel = BlockSelection::single(f.a.clone());
        f.svc.set_block_selection(&mut f.tree, sel);
        f.svc.clear();
        assert!(f.svc.resume_block_id().is_none());
        assert_eq!(f.svc.active_target(), &ActiveTarget::None);
    }
}
