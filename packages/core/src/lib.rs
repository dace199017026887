//! Outline Core Editing Layer
//!
//! This crate provides the document model and editing logic for a
//! block-structured outliner: a forest of nodes ordered by dense fractional
//! indices, per-node formatted text stored as attribute runs, and the
//! selection, navigation and focus machinery that turns keyboard intents
//! into state changes.
//!
//! # Architecture
//!
//! - **Flat arena**: nodes and parent links live in flat maps keyed by id;
//!   hierarchy is derived by query, never stored as nested structures
//! - **Fractional positions**: sibling order comes from base-62 position
//!   strings, so inserts and moves never renumber neighbors
//! - **Runs over strings**: structural edits move formatted text runs, so
//!   marks straddling a split or merge point survive
//! - **Degrade to no-op**: operations with unmet preconditions leave the
//!   document untouched instead of erroring at the user
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, ParentLink, TextRun, Selection)
//! - [`store`] - Tree shape, text logs, events, persistence records
//! - [`services`] - Selection state, keyboard navigation, focus transitions
//! - [`operations`] - Composite edits (split, indent, outdent, merge)

pub mod models;
pub mod operations;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use models::{
    ActiveTarget, Assoc, BlockSelection, CaretPoint, GoalLine, Node, ParentLink, Selection,
    TextAttrs, TextRun, TextSelection,
};
pub use operations::{EditOperations, OperationError};
pub use services::{
    FocusCoordinator, LineGeometry, NavIntent, NavKey, NavigationEngine, NoopScroll, ScrollSink,
    SelectionService,
};
pub use store::{
    export_records, import_records, AnchorPolicy, DomainEvent, EventBus, NodeRecord, StoreError,
    TextLog, TextStore, TreeStore,
};
