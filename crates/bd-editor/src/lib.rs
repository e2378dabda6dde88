//! Editing engine for block documents: bidirectional content sync, drag
//! and resize gestures, selection-derived formatting, and undo/redo.
//!
//! The host owns rendering and raw events; this crate owns every decision
//! about what those events do to the document.

pub mod drag;
pub mod history;
pub mod input;
pub mod media;
pub mod resize;
pub mod selection;
pub mod sync;

pub use drag::{
    DragPayload, DragSession, DropEffect, DropIndicator, DropPosition, Side, resolve_drop,
};
pub use history::History;
pub use input::{DragEvent, DragSource, PointerEvent, PointerPhase};
pub use media::{InsertOutcome, InsertRegistry, UploadKind, UploadTicket, complete_upload};
pub use resize::{Handle, MIN_SIZE, ResizeController};
pub use selection::{FormatState, Selection};
pub use sync::{SyncEngine, SyncOutcome, TreeMutation};
