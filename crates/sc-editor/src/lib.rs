pub mod drag;
pub mod editor;
pub mod error;
pub mod history;
pub mod input;
pub mod rebuild;
pub mod selection;
pub mod shortcuts;
pub mod store;
pub mod tagging;
pub mod watch;

pub use editor::{CanvasEditor, LabelOutcome, StepOutcome};
pub use error::SessionError;
pub use history::{ActionKind, EntryMeta, HistoryEntry, HistoryStack, Snapshot, TagPair};
pub use selection::{SelectionOutcome, apply_selection};
pub use store::CanvasState;
pub use tagging::{ReplayReport, TagError, TagService};
