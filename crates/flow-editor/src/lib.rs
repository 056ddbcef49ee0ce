pub mod canvas;
pub mod drag;
pub mod grouping;
pub mod input;
pub mod shortcuts;
pub mod sync;

pub use canvas::FlowCanvas;
pub use drag::DragController;
pub use grouping::GroupingEngine;
pub use input::{InputEvent, Modifiers};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use sync::{RenderSync, SurfaceEvent, SyncStats};
