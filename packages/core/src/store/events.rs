//! Domain Events
//!
//! The stores and the selection service emit domain events whenever state
//! changes. Events follow the observer pattern over a tokio broadcast
//! channel, so the rendering layer can subscribe to changes without coupling
//! to the store implementations.
//!
//! # Event Flow
//!
//! 1. A store performs a mutation (create, move, delete, text edit)
//! 2. A domain event is emitted via the broadcast channel
//! 3. All subscribers receive the event and re-read fresh state
//!
//! Events are emitted synchronously in the order the corresponding user
//! intents were processed.

use tokio::sync::broadcast;

use crate::models::{ActiveTarget, Node, Selection};

/// Domain events emitted by the outline core.
///
/// These represent domain-level changes, not storage operations.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A new node was created under the given parent
    NodeCreated {
        node: Node,
        parent_id: Option<String>,
    },

    /// A node was re-parented or repositioned
    NodeMoved {
        id: String,
        parent_id: Option<String>,
        position: String,
    },

    /// A node (and its text log) was deleted
    NodeDeleted { id: String },

    /// A node's text log changed (insert, delete, or format)
    TextChanged { id: String },

    /// The buffer's selection changed (idempotent re-sets are filtered out)
    SelectionChanged { selection: Selection },

    /// The focused surface changed
    ActiveTargetChanged { target: ActiveTarget },
}

impl DomainEvent {
    /// String name of the event type, for logging and debugging.
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::NodeCreated { .. } => "node:created",
            DomainEvent::NodeMoved { .. } => "node:moved",
            DomainEvent::NodeDeleted { .. } => "node:deleted",
            DomainEvent::TextChanged { .. } => "text:changed",
            DomainEvent::SelectionChanged { .. } => "selection:changed",
            DomainEvent::ActiveTargetChanged { .. } => "target:changed",
        }
    }
}

/// Shared broadcast channel for domain events.
///
/// Cloning is cheap; every store holds a clone of the same bus. Emitting
/// with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Channel capacity; slow subscribers that lag past this see `Lagged`.
    const CAPACITY: usize = 256;

    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(Self::CAPACITY);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: DomainEvent) {
        tracing::trace!(event = event.event_type(), "emitting domain event");
        // A send error only means there are no subscribers right now.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
