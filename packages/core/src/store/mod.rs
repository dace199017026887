//! Store layer: tree shape, per-node text logs, events and persistence
//! records.

pub mod error;
pub mod events;
pub mod fractional_index;
pub mod records;
pub mod text;
pub mod tree;

pub use error::StoreError;
pub use events::{DomainEvent, EventBus};
pub use records::{export_records, import_records, NodeRecord};
pub use text::{TextLog, TextStore};
pub use tree::{AnchorPolicy, TreeStore};
