//! Tree Store
//!
//! Sole authority on tree shape: node existence and parent/position links.
//! Nodes live in a flat arena keyed by id; hierarchy is derived from the
//! link table by query. Sibling order comes from fractional-index position
//! strings, so inserts and moves never renumber neighbors.
//!
//! The store also tracks per-node expansion state (supplied by the UI) and
//! answers visible-order queries: pre-order traversal filtered by each
//! ancestor's expand/collapse flag, which is the order blocks appear on
//! screen.

use std::collections::{HashMap, HashSet};

use crate::models::{Node, ParentLink};
use crate::store::error::StoreError;
use crate::store::events::{DomainEvent, EventBus};
use crate::store::fractional_index::key_between;

/// Where to place a node relative to an anchor sibling.
///
/// With no sibling given, `Before` prepends to the child list and `After`
/// appends to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPolicy {
    Before,
    After,
}

/// In-memory arena of nodes and parent links.
pub struct TreeStore {
    nodes: HashMap<String, Node>,
    links: HashMap<String, ParentLink>,
    collapsed: HashSet<String>,
    events: EventBus,
}

impl TreeStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            nodes: HashMap::new(),
            links: HashMap::new(),
            collapsed: HashSet::new(),
            events,
        }
    }

    // ---- queries ----------------------------------------------------------

    pub fn exists(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn link(&self, id: &str) -> Option<&ParentLink> {
        self.links.get(id)
    }

    /// Parent of a node. `None` covers both root nodes (an ordinary,
    /// recoverable condition) and unknown ids.
    pub fn parent(&self, id: &str) -> Option<&str> {
        self.links.get(id).and_then(|l| l.parent_id.as_deref())
    }

    /// Ordered child ids under a parent (`None` = roots), excluding hidden
    /// links.
    pub fn children(&self, parent_id: Option<&str>) -> Vec<String> {
        self.child_links(parent_id)
            .into_iter()
            .filter(|l| !l.is_hidden)
            .map(|l| l.child_id.clone())
            .collect()
    }

    /// All links under a parent sorted by position, hidden included. Hidden
    /// siblings still occupy position keys, so placement must see them.
    fn child_links(&self, parent_id: Option<&str>) -> Vec<&ParentLink> {
        let mut links: Vec<&ParentLink> = self
            .links
            .values()
            .filter(|l| l.parent_id.as_deref() == parent_id)
            .collect();
        links.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.child_id.cmp(&b.child_id))
        });
        links
    }

    /// Ancestor chain of a node, nearest parent first.
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut current = id.to_string();
        while let Some(parent) = self.parent(&current).map(str::to_string) {
            if out.contains(&parent) {
                tracing::error!(node = id, "cycle detected in ancestor chain");
                break;
            }
            current = parent.clone();
            out.push(parent);
        }
        out
    }

    /// Whether `id` is inside the subtree rooted at `ancestor`.
    pub fn is_descendant(&self, id: &str, ancestor: &str) -> bool {
        self.ancestors(id).iter().any(|a| a == ancestor)
    }

    // ---- expansion state --------------------------------------------------

    /// Expansion flag for a node; unknown nodes read as expanded.
    pub fn is_expanded(&self, id: &str) -> bool {
        !self.collapsed.contains(id)
    }

    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) {
        if collapsed {
            self.collapsed.insert(id.to_string());
        } else {
            self.collapsed.remove(id);
        }
    }

    /// Expand every collapsed ancestor of `id` so the node is visible.
    pub fn expand_ancestors(&mut self, id: &str) {
        for ancestor in self.ancestors(id) {
            self.collapsed.remove(&ancestor);
        }
    }

    /// Expand ancestors of several nodes, walking shared ancestors once.
    pub fn expand_ancestors_of_all<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        for id in ids {
            for ancestor in self.ancestors(id) {
                if seen.insert(ancestor.clone()) {
                    self.collapsed.remove(&ancestor);
                }
            }
        }
    }

    // ---- visible order ----------------------------------------------------

    /// Pre-order traversal from `root` (inclusive), descending only into
    /// expanded nodes. This is the order blocks appear on screen; the buffer
    /// root (title) is element 0.
    pub fn visible_order(&self, root: &str) -> Vec<String> {
        let mut out = Vec::new();
        if !self.exists(root) {
            return out;
        }
        self.collect_visible(root, &mut out);
        out
    }

    fn collect_visible(&self, id: &str, out: &mut Vec<String>) {
        out.push(id.to_string());
        if !self.is_expanded(id) {
            return;
        }
        for child in self.children(Some(id)) {
            self.collect_visible(&child, out);
        }
    }

    /// Next node after `id` in visible order under `root`: first expanded
    /// child, else next sibling, else the nearest ancestor's next sibling.
    pub fn next_visible(&self, root: &str, id: &str) -> Option<String> {
        let order = self.visible_order(root);
        let idx = order.iter().position(|n| n == id)?;
        order.get(idx + 1).cloned()
    }

    /// Previous node before `id` in visible order under `root`.
    pub fn prev_visible(&self, root: &str, id: &str) -> Option<String> {
        let order = self.visible_order(root);
        let idx = order.iter().position(|n| n == id)?;
        idx.checked_sub(1).and_then(|i| order.get(i).cloned())
    }

    // ---- mutations --------------------------------------------------------

    /// Create a new node in the given slot. Convenience over
    /// [`TreeStore::insert_or_move`] with no node id.
    pub fn create_node(
        &mut self,
        parent_id: Option<&str>,
        anchor: AnchorPolicy,
        sibling_id: Option<&str>,
    ) -> Result<String, StoreError> {
        self.insert_or_move(None, parent_id, anchor, sibling_id)
    }

    /// Insert a new node or move an existing one into the given slot.
    ///
    /// Presence of `node_id` selects *move* (re-parent + reposition) over
    /// *create*; the same primitive serves creation, drag, indent and
    /// outdent. Position is assigned strictly between the slot's neighbors
    /// via the fractional-indexing scheme.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` when moving an id that does not exist
    /// - `InvalidParent` when the parent does not exist
    /// - `InvalidSibling` when the anchor sibling is missing or lives under
    ///   a different parent
    /// - `CircularMove` when the move would put a node inside its own
    ///   subtree
    pub fn insert_or_move(
        &mut self,
        node_id: Option<&str>,
        parent_id: Option<&str>,
        anchor: AnchorPolicy,
        sibling_id: Option<&str>,
    ) -> Result<String, StoreError> {
        if let Some(p) = parent_id {
            if !self.exists(p) {
                return Err(StoreError::invalid_parent(p));
            }
        }
        if let Some(id) = node_id {
            if !self.exists(id) {
                return Err(StoreError::node_not_found(id));
            }
            if Some(id) == parent_id || parent_id.is_some_and(|p| self.is_descendant(p, id)) {
                return Err(StoreError::circular_move(id));
            }
        }

        let position = self.position_for_slot(node_id, parent_id, anchor, sibling_id)?;

        match node_id {
            Some(id) => {
                let link = ParentLink {
                    child_id: id.to_string(),
                    parent_id: parent_id.map(str::to_string),
                    position: position.clone(),
                    is_hidden: self.links.get(id).map(|l| l.is_hidden).unwrap_or(false),
                };
                self.links.insert(id.to_string(), link);
                if let Some(node) = self.nodes.get_mut(id) {
                    node.touch();
                }
                tracing::debug!(node = id, parent = ?parent_id, %position, "moved node");
                self.events.emit(DomainEvent::NodeMoved {
                    id: id.to_string(),
                    parent_id: parent_id.map(str::to_string),
                    position,
                });
                Ok(id.to_string())
            }
            None => {
                let node = Node::new();
                let id = node.id.clone();
                self.nodes.insert(id.clone(), node.clone());
                self.links.insert(
                    id.clone(),
                    ParentLink::new(id.clone(), parent_id.map(str::to_string), position),
                );
                tracing::debug!(node = %id, parent = ?parent_id, "created node");
                self.events.emit(DomainEvent::NodeCreated {
                    node,
                    parent_id: parent_id.map(str::to_string),
                });
                Ok(id)
            }
        }
    }

    /// Compute the position key for the requested slot.
    fn position_for_slot(
        &self,
        moving_id: Option<&str>,
        parent_id: Option<&str>,
        anchor: AnchorPolicy,
        sibling_id: Option<&str>,
    ) -> Result<String, StoreError> {
        // The moving node's own link must not bound its new position.
        let siblings: Vec<&ParentLink> = self
            .child_links(parent_id)
            .into_iter()
            .filter(|l| Some(l.child_id.as_str()) != moving_id)
            .collect();

        let (low, high) = match sibling_id {
            None => match anchor {
                AnchorPolicy::Before => (None, siblings.first().map(|l| l.position.as_str())),
                AnchorPolicy::After => (siblings.last().map(|l| l.position.as_str()), None),
            },
            Some(sid) => {
                let idx = siblings
                    .iter()
                    .position(|l| l.child_id == sid)
                    .ok_or_else(|| StoreError::invalid_sibling(sid))?;
                match anchor {
                    AnchorPolicy::Before => (
                        idx.checked_sub(1)
                            .and_then(|i| siblings.get(i))
                            .map(|l| l.position.as_str()),
                        Some(siblings[idx].position.as_str()),
                    ),
                    AnchorPolicy::After => (
                        Some(siblings[idx].position.as_str()),
                        siblings.get(idx + 1).map(|l| l.position.as_str()),
                    ),
                }
            }
        };

        Ok(key_between(low, high))
    }

    /// Delete a node and every descendant, links included. Deleting an
    /// unknown id is a no-op. Returns the deleted ids so callers can discard
    /// the associated text logs.
    pub fn delete_subtree(&mut self, id: &str) -> Vec<String> {
        if !self.exists(id) {
            return Vec::new();
        }
        let mut deleted = Vec::new();
        self.collect_subtree(id, &mut deleted);
        for node_id in &deleted {
            self.nodes.remove(node_id);
            self.links.remove(node_id);
            self.collapsed.remove(node_id);
            self.events.emit(DomainEvent::NodeDeleted {
                id: node_id.clone(),
            });
        }
        tracing::debug!(root = id, count = deleted.len(), "deleted subtree");
        deleted
    }

    fn collect_subtree(&self, id: &str, out: &mut Vec<String>) {
        out.push(id.to_string());
        // Hidden children die with their parent too.
        for link in self.child_links(Some(id)) {
            self.collect_subtree(&link.child_id, out);
        }
    }

    /// Restore a node and its link verbatim (persistence import path).
    /// Bypasses slot computation; the caller owns position validity.
    pub fn restore(&mut self, node: Node, link: ParentLink) {
        self.nodes.insert(node.id.clone(), node);
        self.links.insert(link.child_id.clone(), link);
    }

    /// All node ids, unordered (persistence export path).
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TreeStore {
        TreeStore::new(EventBus::new())
    }

    /// root -> [a, b], a -> [a1]
    fn small_tree(s: &mut TreeStore) -> (String, String, String, String) {
        let root = s.create_node(None, AnchorPolicy::After, None).unwrap();
        let a = s
            .create_node(Some(&root), AnchorPolicy::After, None)
            .unwrap();
        let b = s
            .create_node(Some(&root), AnchorPolicy::After, None)
            .unwrap();
        let a1 = s.create_node(Some(&a), AnchorPolicy::After, None).unwrap();
        (root, a, b, a1)
    }

    #[test]
    fn test_create_appends_in_order() {
        let mut s = store();
        let root = s.create_node(None, AnchorPolicy::After, None).unwrap();
        let a = s
            .create_node(Some(&root), AnchorPolicy::After, None)
            .unwrap();
        let b = s
            .create_node(Some(&root), AnchorPolicy::After, None)
            .unwrap();
        assert_eq!(s.children(Some(&root)), vec![a, b]);
    }

    #[test]
    fn test_insert_before_sibling() {
        let mut s = store();
        let (root, a, b, _) = small_tree(&mut s);
        let c = s
            .create_node(Some(&root), AnchorPolicy::Before, Some(&b))
            .unwrap();
        assert_eq!(s.children(Some(&root)), vec![a, c, b]);
    }

    #[test]
    fn test_insert_at_front() {
        let mut s = store();
        let (root, a, b, _) = small_tree(&mut s);
        let c = s
            .create_node(Some(&root), AnchorPolicy::Before, None)
            .unwrap();
        assert_eq!(s.children(Some(&root)), vec![c, a, b]);
    }

    #[test]
    fn test_move_reparents() {
        let mut s = store();
        let (root, a, b, a1) = small_tree(&mut s);
        s.insert_or_move(Some(&a1), Some(&b), AnchorPolicy::After, None)
            .unwrap();
        assert_eq!(s.parent(&a1), Some(b.as_str()));
        assert!(s.children(Some(&a)).is_empty());
        assert_eq!(s.children(Some(&root)), vec![a, b]);
    }

    #[test]
    fn test_move_rejects_cycle() {
        let mut s = store();
        let (_, a, _, a1) = small_tree(&mut s);
        let err = s
            .insert_or_move(Some(&a), Some(&a1), AnchorPolicy::After, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::CircularMove { .. }));
    }

    #[test]
    fn test_missing_parent_rejected() {
        let mut s = store();
        let err = s
            .create_node(Some("nope"), AnchorPolicy::After, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParent { .. }));
    }

    #[test]
    fn test_sibling_under_other_parent_rejected() {
        let mut s = store();
        let (root, _, _, a1) = small_tree(&mut s);
        let err = s
            .create_node(Some(&root), AnchorPolicy::After, Some(&a1))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSibling { .. }));
    }

    #[test]
    fn test_delete_cascades() {
        let mut s = store();
        let (root, a, b, a1) = small_tree(&mut s);
        let deleted = s.delete_subtree(&a);
        assert_eq!(deleted.len(), 2);
        assert!(deleted.contains(&a) && deleted.contains(&a1));
        assert!(!s.exists(&a) && !s.exists(&a1));
        assert_eq!(s.children(Some(&root)), vec![b]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut s = store();
        assert!(s.delete_subtree("ghost").is_empty());
    }

    #[test]
    fn test_visible_order_respects_collapse() {
        let mut s = store();
        let (root, a, b, a1) = small_tree(&mut s);
        assert_eq!(
            s.visible_order(&root),
            vec![root.clone(), a.clone(), a1.clone(), b.clone()]
        );
        s.set_collapsed(&a, true);
        assert_eq!(s.visible_order(&root), vec![root, a, b]);
        let _ = a1;
    }

    #[test]
    fn test_next_prev_visible() {
        let mut s = store();
        let (root, a, b, a1) = small_tree(&mut s);
        assert_eq!(s.next_visible(&root, &root), Some(a.clone()));
        assert_eq!(s.next_visible(&root, &a), Some(a1.clone()));
        assert_eq!(s.next_visible(&root, &a1), Some(b.clone()));
        assert_eq!(s.next_visible(&root, &b), None);
        assert_eq!(s.prev_visible(&root, &b), Some(a1));
        assert_eq!(s.prev_visible(&root, &root), None);
    }

    #[test]
    fn test_expand_ancestors_dedup() {
        let mut s = store();
        let (root, a, _, a1) = small_tree(&mut s);
        s.set_collapsed(&root, true);
        s.set_collapsed(&a, true);
        s.expand_ancestors_of_all([a1.as_str(), a.as_str()].into_iter());
        assert!(s.is_expanded(&root));
        assert!(s.is_expanded(&a));
    }

    #[test]
    fn test_hidden_links_excluded_from_children() {
        let mut s = store();
        let (root, a, b, _) = small_tree(&mut s);
        if let Some(link) = s.links.get_mut(&a) {
            link.is_hidden = true;
        }
        assert_eq!(s.children(Some(&root)), vec![b]);
    }

    #[test]
    fn test_move_emits_event() {
        let s_events = EventBus::new();
        let mut rx = s_events.subscribe();
        let mut s = TreeStore::new(s_events);
        let (root, _, b, a1) = small_tree(&mut s);
        // Drain creation events.
        while rx.try_recv().is_ok() {}
        s.insert_or_move(Some(&a1), Some(&root), AnchorPolicy::After, Some(&b))
            .unwrap();
        match rx.try_recv().unwrap() {
            DomainEvent::NodeMoved { id, parent_id, .. } => {
                assert_eq!(id, a1);
                assert_eq!(parent_id.as_deref(), Some(root.as_str()));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
