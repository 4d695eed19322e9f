//! Editing operations over Lottie documents.
//!
//! - [`walker`] finds fill and stroke colors and the paths that address them.
//! - [`patcher`] writes color edits back along those paths.
//! - [`fields`] and [`trim`] bind transform, frame rate and trim controls.
//! - [`command`] and [`session`] wrap all of the above as explicit edits
//!   over a session-owned document.
//! - [`presenter`] builds the view model shown after each interaction.
//! - [`loader`] and [`export`] bring documents in and artifacts out.

pub mod command;
pub mod error;
pub mod export;
pub mod fields;
pub mod loader;
pub mod patcher;
pub mod playback;
pub mod presenter;
pub mod session;
pub mod trim;
pub mod walker;

pub use command::EditCommand;
pub use error::{CommandError, LoadError, RenderError, StructureMismatch};
pub use export::{GifExport, GifRenderer, GifRequest};
pub use loader::{CachedLoader, DocumentFetcher, HttpFetcher};
pub use patcher::{ColorEdit, PatchReport};
pub use playback::{PlaybackOptions, Quality};
pub use presenter::EditorView;
pub use session::{EditOutcome, EditSession};
pub use trim::TrimBounds;
pub use walker::{ColorEntry, ColorScan, PaintKind, WalkLimits};

pub use lottie_data;
