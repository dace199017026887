//! Event Emission Tests
//!
//! Verifies that store and selection mutations emit the right domain events,
//! exactly once per effective change, and that no-op mutations stay silent.

#[cfg(test)]
mod event_emission_tests {
    use anyhow::Result;
    use outline_core::models::{BlockSelection, TextAttrs};
    use outline_core::services::SelectionService;
    use outline_core::store::{
        AnchorPolicy, DomainEvent, EventBus, TextStore, TreeStore,
    };
    use tokio::time::{timeout, Duration};

    async fn next_event(
        rx: &mut tokio::sync::broadcast::Receiver<DomainEvent>,
    ) -> Result<DomainEvent> {
        let event = timeout(Duration::from_secs(1), rx.recv()).await??;
        Ok(event)
    }

    #[tokio::test]
    async fn test_create_node_emits_node_created() -> Result<()> {
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let mut tree = TreeStore::new(events);

        let id = tree.create_node(None, AnchorPolicy::After, None)?;

        match next_event(&mut rx).await? {
            DomainEvent::NodeCreated { node, parent_id } => {
                assert_eq!(node.id, id);
                assert!(parent_id.is_none());
            }
            other => panic!("expected NodeCreated, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_move_emits_node_moved_with_position() -> Result<()> {
        let events = EventBus::new();
        let mut tree = TreeStore::new(events.clone());
        let root = tree.create_node(None, AnchorPolicy::After, None)?;
        let a = tree.create_node(Some(&root), AnchorPolicy::After, None)?;
        let b = tree.create_node(Some(&root), AnchorPolicy::After, None)?;

        let mut rx = events.subscribe();
        tree.insert_or_move(Some(&b), Some(&root), AnchorPolicy::Before, Some(&a))?;

        match next_event(&mut rx).await? {
            DomainEvent::NodeMoved {
                id,
                parent_id,
                position,
            } => {
                assert_eq!(id, b);
                assert_eq!(parent_id.as_deref(), Some(root.as_str()));
                assert!(!position.is_empty());
            }
            other => panic!("expected NodeMoved, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_subtree_emits_one_event_per_node() -> Result<()> {
        let events = EventBus::new();
        let mut tree = TreeStore::new(events.clone());
        let root = tree.create_node(None, AnchorPolicy::After, None)?;
        let a = tree.create_node(Some(&root), AnchorPolicy::After, None)?;
        let _a1 = tree.create_node(Some(&a), AnchorPolicy::After, None)?;

        let mut rx = events.subscribe();
        let deleted = tree.delete_subtree(&a);
        assert_eq!(deleted.len(), 2);

        for _ in 0..2 {
            match next_event(&mut rx).await? {
                DomainEvent::NodeDeleted { id } => assert!(deleted.contains(&id)),
                other => panic!("expected NodeDeleted, got {other:?}"),
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_text_mutations_emit_text_changed() -> Result<()> {
        let events = EventBus::new();
        let mut text = TextStore::new(events.clone());
        let mut rx = events.subscribe();

        text.insert("n1", 0, "hello", TextAttrs::none());
        match next_event(&mut rx).await? {
            DomainEvent::TextChanged { id } => assert_eq!(id, "n1"),
            other => panic!("expected TextChanged, got {other:?}"),
        }

        text.format("n1", 0, 2, TextAttrs::bold());
        assert!(matches!(
            next_event(&mut rx).await?,
            DomainEvent::TextChanged { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_selection_change_emits_once() -> Result<()> {
        let events = EventBus::new();
        let mut tree = TreeStore::new(events.clone());
        let mut text = TextStore::new(events.clone());
        let root = tree.create_node(None, AnchorPolicy::After, None)?;
        let a = tree.create_node(Some(&root), AnchorPolicy::After, None)?;
        text.insert(&a, 0, "hello", TextAttrs::none());
        let mut svc = SelectionService::new(root.clone(), events.clone());

        let mut rx = events.subscribe();
        svc.set_caret(&mut tree, &text, &a, 1);
        // Identical re-set must not emit a second notification.
        svc.set_caret(&mut tree, &text, &a, 1);

        assert!(matches!(
            next_event(&mut rx).await?,
            DomainEvent::SelectionChanged { .. }
        ));
        assert!(matches!(
            next_event(&mut rx).await?,
            DomainEvent::ActiveTargetChanged { .. }
        ));
        assert!(rx.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_block_selection_emits_selection_and_target() -> Result<()> {
        let events = EventBus::new();
        let mut tree = TreeStore::new(events.clone());
        let root = tree.create_node(None, AnchorPolicy::After, None)?;
        let a = tree.create_node(Some(&root), AnchorPolicy::After, None)?;
        let mut svc = SelectionService::new(root, events.clone());

        let mut rx = events.subscribe();
        svc.set_block_selection(&mut tree, BlockSelection::single(a.clone()));

        match next_event(&mut rx).await? {
            DomainEvent::SelectionChanged { selection } => match selection {
                outline_core::models::Selection::Blocks(sel) => {
                    assert_eq!(sel.members, vec![a]);
                }
                other => panic!("expected block selection, got {other:?}"),
            },
            other => panic!("expected SelectionChanged, got {other:?}"),
        }
        Ok(())
    }
}
