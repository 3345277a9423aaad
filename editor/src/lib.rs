//! Canvas note editor: drawing surface, tools, per-slide undo history,
//! slide deck, and the clients that talk to the note store and the
//! vision endpoint.

pub mod analyze;
pub mod error;
pub mod export;
pub mod geometry;
pub mod glyphs;
pub mod history;
pub mod notes;
pub mod session;
pub mod slides;
pub mod surface;
pub mod tools;

pub use analyze::AnalyzeClient;
pub use error::EditorError;
pub use geometry::{Point, Rect};
pub use history::History;
pub use notes::NotesClient;
pub use session::{EditorSession, MIN_SELECTION_EDGE};
pub use slides::SlideDeck;
pub use surface::{Surface, Theme};
pub use tools::{EraserMode, PointerMode, ShapeKind, Tool, ToolState};
