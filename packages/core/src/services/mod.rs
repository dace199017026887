//! Service layer: selection state, keyboard navigation and focus
//! transitions over the stores.

pub mod focus;
pub mod navigation;
pub mod selection;

pub use focus::FocusCoordinator;
pub use navigation::{
    LineGeometry, NavIntent, NavKey, NavigationEngine, NoopScroll, ScrollSink,
};
pub use selection::SelectionService;
