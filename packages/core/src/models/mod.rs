//! Data structures for the outline core.

pub mod node;
pub mod selection;
pub mod text;

pub use node::{Node, ParentLink};
pub use selection::{
    ActiveTarget, Assoc, BlockSelection, CaretPoint, GoalLine, Selection, TextSelection,
};
pub use text::{TextAttrs, TextRun};
