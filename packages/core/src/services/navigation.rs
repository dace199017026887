//! Navigation Engine
//!
//! Computes the next selection state from the current state, a navigation
//! intent (arrow key + modifiers) and geometry facts supplied by the
//! rendering layer. The engine never measures pixels itself; it asks the
//! line-geometry oracle for visual line bounds and offset/pixel mappings
//! against already-rendered layout.
//!
//! Vertical moves preserve a horizontal goal position (`goal_x`) across
//! consecutive moves, so repeated ArrowDown keeps the visual column stable
//! even when it crosses nodes of different indentation or proportional
//! width. Horizontal moves and edits clear the goal.
//!
//! Every operation degrades to a no-op when its preconditions fail (empty
//! document, node deleted out from under the selection, geometry not yet
//! available); navigation never errors at the user.

use crate::models::{
    Assoc, BlockSelection, CaretPoint, GoalLine, Selection, TextSelection,
};
use crate::services::selection::SelectionService;
use crate::store::text::TextStore;
use crate::store::tree::TreeStore;

/// Geometry oracle backed by the rendering layer.
///
/// A `line_count` of 0 means layout for that node is not available yet; the
/// engine treats the whole move as a no-op and the caller retries after the
/// next paint.
pub trait LineGeometry {
    /// Number of visual lines in the node's rendered text.
    fn line_count(&self, node_id: &str) -> usize;

    /// Codepoint bounds `(start, end)` of one visual line. For soft wraps
    /// the end of line N equals the start of line N+1.
    fn line_bounds(&self, node_id: &str, line: usize) -> (usize, usize);

    /// Pixel x-position of a codepoint offset.
    fn x_for_offset(&self, node_id: &str, offset: usize) -> f32;

    /// Codepoint offset on `line` nearest to pixel `x`.
    fn offset_for_x(&self, node_id: &str, line: usize, x: f32) -> usize;
}

/// Fire-and-forget scroll requests toward the rendering layer. Never
/// awaited.
pub trait ScrollSink {
    fn scroll_into_view(&self, node_id: &str);
}

/// Sink that drops all scroll requests (headless use, tests).
pub struct NoopScroll;

impl ScrollSink for NoopScroll {
    fn scroll_into_view(&self, _node_id: &str) {}
}

/// Navigation keys the engine understands. Enter and Escape are mode
/// transitions owned by the focus coordinator; the engine leaves them
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
    Delete,
    /// Cmd/Meta+A
    SelectAll,
}

/// A navigation intent: key plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavIntent {
    pub key: NavKey,
    pub shift: bool,
    pub meta: bool,
}

impl NavIntent {
    pub fn key(key: NavKey) -> Self {
        Self {
            key,
            shift: false,
            meta: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

/// Per-keystroke navigation context over the stores and the geometry
/// oracle.
pub struct NavigationEngine<'a, G: LineGeometry + ?Sized, S: ScrollSink + ?Sized> {
    tree: &'a mut TreeStore,
    text: &'a mut TextStore,
    geometry: &'a G,
    scroll: &'a S,
}

impl<'a, G: LineGeometry + ?Sized, S: ScrollSink + ?Sized> NavigationEngine<'a, G, S> {
    pub fn new(
        tree: &'a mut TreeStore,
        text: &'a mut TextStore,
        geometry: &'a G,
        scroll: &'a S,
    ) -> Self {
        Self {
            tree,
            text,
            geometry,
            scroll,
        }
    }

    /// Apply one navigation intent to the current selection.
    pub fn move_by_intent(&mut self, svc: &mut SelectionService, intent: NavIntent) {
        match svc.selection().clone() {
            Selection::Text(sel) => self.text_mode(svc, sel, intent),
            Selection::Blocks(sel) => self.block_mode(svc, sel, intent),
            Selection::None => self.empty_mode(svc, intent),
        }
    }

    // ---- text-edit mode ---------------------------------------------------

    fn text_mode(&mut self, svc: &mut SelectionService, sel: TextSelection, intent: NavIntent) {
        match intent.key {
            NavKey::ArrowUp => self.vertical_move(svc, sel, false, intent.shift),
            NavKey::ArrowDown => self.vertical_move(svc, sel, true, intent.shift),
            NavKey::ArrowLeft => self.horizontal_move(svc, sel, false, intent.shift),
            NavKey::ArrowRight => self.horizontal_move(svc, sel, true, intent.shift),
            NavKey::SelectAll => {
                let node = sel.focus.node_id.clone();
                let len = self.text.len(&node);
                svc.set_range(
                    self.tree,
                    self.text,
                    CaretPoint::new(node.clone(), 0),
                    CaretPoint::new(node, len),
                );
            }
            // Mode transitions and edits are not the engine's to make.
            NavKey::Enter | NavKey::Escape | NavKey::Delete => {}
        }
    }

    fn vertical_move(
        &mut self,
        svc: &mut SelectionService,
        sel: TextSelection,
        down: bool,
        shift: bool,
    ) {
        let node = sel.focus.node_id.clone();
        if !self.tree.exists(&node) {
            return;
        }
        let lines = self.geometry.line_count(&node);
        if lines == 0 {
            tracing::debug!(node = %node, "geometry not ready; vertical move dropped");
            return;
        }
        let line = self.line_of_offset(&node, sel.focus.offset, sel.assoc, sel.goal_line, lines);
        // Capture a fresh goal from the current pixel position unless one is
        // already active from an earlier vertical move.
        let goal_x = sel
            .goal_x
            .unwrap_or_else(|| self.geometry.x_for_offset(&node, sel.focus.offset));

        let stays_inside = if down { line + 1 < lines } else { line > 0 };
        if stays_inside {
            let target_line = if down { line + 1 } else { line - 1 };
            let offset = self.offset_on_line(&node, target_line, goal_x);
            let assoc = self.assoc_for(&node, target_line, offset, lines);
            self.land(svc, &sel, CaretPoint::new(node, offset), goal_x, None, assoc, shift);
            return;
        }

        let root = svc.buffer_root().to_string();
        let neighbor = if down {
            self.tree.next_visible(&root, &node)
        } else {
            self.tree.prev_visible(&root, &node)
        };
        match neighbor {
            Some(target) => {
                let target_lines = self.geometry.line_count(&target);
                if target_lines == 0 {
                    tracing::debug!(node = %target, "geometry not ready; vertical move dropped");
                    return;
                }
                let (target_line, goal_line) = if down {
                    (0, GoalLine::First)
                } else {
                    (target_lines - 1, GoalLine::Last)
                };
                let offset = self.offset_on_line(&target, target_line, goal_x);
                let assoc = self.assoc_for(&target, target_line, offset, target_lines);
                self.scroll.scroll_into_view(&target);
                self.land(
                    svc,
                    &sel,
                    CaretPoint::new(target, offset),
                    goal_x,
                    Some(goal_line),
                    assoc,
                    shift,
                );
            }
            None => {
                // Past the document edge: clamp to the text edge of the
                // current node, no-op if already there.
                let edge = if down { self.text.len(&node) } else { 0 };
                if sel.focus.offset == edge && sel.is_caret() {
                    return;
                }
                self.land(
                    svc,
                    &sel,
                    CaretPoint::new(node, edge),
                    goal_x,
                    None,
                    Assoc::Unset,
                    shift,
                );
            }
        }
    }

    /// Commit a vertical-move landing, preserving the goal column.
    #[allow(clippy::too_many_arguments)]
    fn land(
        &mut self,
        svc: &mut SelectionService,
        old: &TextSelection,
        focus: CaretPoint,
        goal_x: f32,
        goal_line: Option<GoalLine>,
        assoc: Assoc,
        shift: bool,
    ) {
        let anchor = if shift { old.anchor.clone() } else { focus.clone() };
        let mut sel = TextSelection::range(anchor, focus);
        sel.goal_x = Some(goal_x);
        sel.goal_line = goal_line;
        sel.assoc = assoc;
        svc.set_text_selection(self.tree, self.text, sel);
    }

    fn horizontal_move(
        &mut self,
        svc: &mut SelectionService,
        sel: TextSelection,
        right: bool,
        shift: bool,
    ) {
        let node = sel.focus.node_id.clone();
        if !self.tree.exists(&node) {
            return;
        }
        let len = self.text.len(&node);

        if shift {
            // Extend inside the node; the anchor stays put.
            let offset = if right {
                (sel.focus.offset + 1).min(len)
            } else {
                sel.focus.offset.saturating_sub(1)
            };
            svc.set_range(
                self.tree,
                self.text,
                sel.anchor.clone(),
                CaretPoint::new(node, offset),
            );
            return;
        }

        if !sel.is_caret() {
            // Collapse to the edge in the move direction. Ranges spanning
            // nodes collapse at the focus point.
            let point = if sel.anchor.node_id == sel.focus.node_id {
                let offset = if right {
                    sel.anchor.offset.max(sel.focus.offset)
                } else {
                    sel.anchor.offset.min(sel.focus.offset)
                };
                CaretPoint::new(node, offset)
            } else {
                sel.focus.clone()
            };
            svc.set_caret(self.tree, self.text, &point.node_id.clone(), point.offset);
            return;
        }

        let root = svc.buffer_root().to_string();
        if right {
            if sel.focus.offset < len {
                svc.set_caret(self.tree, self.text, &node, sel.focus.offset + 1);
            } else if let Some(next) = self.tree.next_visible(&root, &node) {
                self.scroll.scroll_into_view(&next);
                svc.set_caret(self.tree, self.text, &next, 0);
            }
        } else if sel.focus.offset > 0 {
            svc.set_caret(self.tree, self.text, &node, sel.focus.offset - 1);
        } else if let Some(prev) = self.tree.prev_visible(&root, &node) {
            let end = self.text.len(&prev);
            self.scroll.scroll_into_view(&prev);
            svc.set_caret(self.tree, self.text, &prev, end);
        }
    }

    /// Visual line containing `offset`, honoring the goal-line hint from a
    /// previous cross-node landing and the wrap-boundary association.
    fn line_of_offset(
        &self,
        node: &str,
        offset: usize,
        assoc: Assoc,
        goal_line: Option<GoalLine>,
        lines: usize,
    ) -> usize {
        if let Some(hint) = goal_line {
            let line = match hint {
                GoalLine::First => 0,
                GoalLine::Last => lines - 1,
            };
            let (start, end) = self.geometry.line_bounds(node, line);
            if offset >= start && offset <= end {
                return line;
            }
        }
        for line in 0..lines {
            let (_, end) = self.geometry.line_bounds(node, line);
            if offset < end {
                return line;
            }
            if offset == end {
                if line + 1 == lines {
                    return line;
                }
                let (next_start, _) = self.geometry.line_bounds(node, line + 1);
                if next_start == end {
                    // Soft wrap: the documented default puts the caret at
                    // the start of the next line unless it explicitly
                    // sticks upstream.
                    return if assoc.sticks_upstream() { line } else { line + 1 };
                }
                return line;
            }
        }
        lines - 1
    }

    /// Offset on `line` nearest the goal column, clamped to the line.
    fn offset_on_line(&self, node: &str, line: usize, goal_x: f32) -> usize {
        let (start, end) = self.geometry.line_bounds(node, line);
        self.geometry.offset_for_x(node, line, goal_x).clamp(start, end)
    }

    /// Association to record for a landing at `offset` on `line`.
    fn assoc_for(&self, node: &str, line: usize, offset: usize, lines: usize) -> Assoc {
        let (start, end) = self.geometry.line_bounds(node, line);
        if offset == start && line > 0 {
            let (_, prev_end) = self.geometry.line_bounds(node, line - 1);
            if prev_end == start {
                return Assoc::Downstream;
            }
        }
        if offset == end && line + 1 < lines {
            let (next_start, _) = self.geometry.line_bounds(node, line + 1);
            if next_start == end {
                return Assoc::Upstream;
            }
        }
        Assoc::Unset
    }

    // ---- block-selection mode ---------------------------------------------

    /// Visible blocks of the buffer: visible order minus the title node.
    fn visible_blocks(&self, root: &str) -> Vec<String> {
        let mut order = self.tree.visible_order(root);
        if order.is_empty() {
            return order;
        }
        order.remove(0);
        order
    }

    fn empty_mode(&mut self, svc: &mut SelectionService, intent: NavIntent) {
        if !matches!(
            svc.active_target(),
            crate::models::ActiveTarget::BufferSurface { .. }
        ) {
            return;
        }
        let root = svc.buffer_root().to_string();
        let blocks = self.visible_blocks(&root);
        if blocks.is_empty() {
            return;
        }
        let resumed = match intent.key {
            // A cleared selection resumes at the remembered block when it
            // still exists; otherwise ArrowUp starts at the last block and
            // ArrowDown at the first.
            NavKey::ArrowUp | NavKey::ArrowDown => svc
                .resume_block_id()
                .filter(|id| blocks.iter().any(|b| b == id))
                .map(str::to_string),
            _ => return,
        };
        match resumed {
            Some(target) => {
                self.scroll.scroll_into_view(&target);
                svc.set_block_selection(self.tree, BlockSelection::single(target));
            }
            None => self.empty_fallback(svc, &blocks, intent.key == NavKey::ArrowDown),
        }
    }

    fn block_mode(&mut self, svc: &mut SelectionService, sel: BlockSelection, intent: NavIntent) {
        let root = svc.buffer_root().to_string();
        let blocks = self.visible_blocks(&root);
        if blocks.is_empty() {
            return;
        }
        match intent.key {
            NavKey::SelectAll => {
                if let (Some(anchor), Some(focus)) =
                    (blocks.first().cloned(), blocks.last().cloned())
                {
                    self.scroll.scroll_into_view(&focus);
                    svc.set_block_selection(
                        self.tree,
                        BlockSelection::range(blocks, anchor, focus),
                    );
                }
            }
            NavKey::ArrowUp | NavKey::ArrowDown => {
                let down = intent.key == NavKey::ArrowDown;
                let Some(fi) = blocks.iter().position(|b| *b == sel.focus_id) else {
                    // The focus block disappeared; fall back to edge rules.
                    self.empty_fallback(svc, &blocks, down);
                    return;
                };
                let ai = blocks
                    .iter()
                    .position(|b| *b == sel.anchor_id)
                    .unwrap_or(fi);

                if intent.shift {
                    // Extension is relative to the anchor: moving the focus
                    // away from it grows the run, moving back shrinks it.
                    let new_fi = if down {
                        (fi + 1).min(blocks.len() - 1)
                    } else {
                        fi.saturating_sub(1)
                    };
                    if new_fi == fi {
                        return;
                    }
                    let (lo, hi) = (ai.min(new_fi), ai.max(new_fi));
                    let members = blocks[lo..=hi].to_vec();
                    let focus = blocks[new_fi].clone();
                    self.scroll.scroll_into_view(&focus);
                    svc.set_block_selection(
                        self.tree,
                        BlockSelection::range(members, sel.anchor_id.clone(), focus),
                    );
                } else if sel.members.len() > 1 {
                    // Plain arrow collapses the range to a single block one
                    // step from the focus toward the anchor.
                    let target = if fi > ai {
                        fi - 1
                    } else if fi < ai {
                        fi + 1
                    } else {
                        fi
                    };
                    let id = blocks[target].clone();
                    self.scroll.scroll_into_view(&id);
                    svc.set_block_selection(self.tree, BlockSelection::single(id));
                } else {
                    let target = if down {
                        if fi + 1 < blocks.len() {
                            fi + 1
                        } else {
                            return;
                        }
                    } else {
                        match fi.checked_sub(1) {
                            Some(i) => i,
                            None => return,
                        }
                    };
                    let id = blocks[target].clone();
                    self.scroll.scroll_into_view(&id);
                    svc.set_block_selection(self.tree, BlockSelection::single(id));
                }
            }
            NavKey::ArrowLeft => {
                if !sel.is_single() {
                    return;
                }
                match self.tree.parent(&sel.focus_id).map(str::to_string) {
                    Some(parent) if parent != root => {
                        self.scroll.scroll_into_view(&parent);
                        svc.set_block_selection(self.tree, BlockSelection::single(parent));
                    }
                    _ => {} // root-level block: no-op
                }
            }
            NavKey::ArrowRight => {
                if !sel.is_single() || !self.tree.is_expanded(&sel.focus_id) {
                    return;
                }
                if let Some(child) = self.tree.children(Some(&sel.focus_id)).first().cloned() {
                    self.scroll.scroll_into_view(&child);
                    svc.set_block_selection(self.tree, BlockSelection::single(child));
                }
            }
            NavKey::Delete => self.delete_blocks(svc, &sel, &root),
            NavKey::Enter | NavKey::Escape => {}
        }
    }

    fn empty_fallback(&mut self, svc: &mut SelectionService, blocks: &[String], down: bool) {
        let target = if down {
            blocks.first().cloned()
        } else {
            blocks.last().cloned()
        };
        if let Some(id) = target {
            self.scroll.scroll_into_view(&id);
            svc.set_block_selection(self.tree, BlockSelection::single(id));
        }
    }

    /// Remove every selected subtree, then re-select the block that stood
    /// immediately before the deleted run (falling back to the following
    /// block, else an empty selection), staying in block-selection mode.
    fn delete_blocks(&mut self, svc: &mut SelectionService, sel: &BlockSelection, root: &str) {
        let blocks = self.visible_blocks(root);
        let first_idx = blocks.iter().position(|b| sel.contains(b));
        let predecessor = first_idx
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| blocks.get(i).cloned());

        for member in &sel.members {
            let deleted = self.tree.delete_subtree(member);
            self.text.remove_all(deleted.iter().map(String::as_str));
        }

        let target = predecessor.filter(|p| self.tree.exists(p)).or_else(|| {
            let remaining = self.visible_blocks(root);
            first_idx.and_then(|i| remaining.get(i.min(remaining.len().saturating_sub(1))).cloned())
        });
        match target {
            Some(id) => {
                self.scroll.scroll_into_view(&id);
                svc.set_block_selection(self.tree, BlockSelection::single(id));
            }
            None => svc.clear_keeping_anchor(),
        }
    }
}
