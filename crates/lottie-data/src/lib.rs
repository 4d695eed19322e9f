//! Data structures for editing Lottie animations.
//!
//! A [`Document`] keeps the full JSON tree so that fields the editor does not
//! understand survive a load/edit/save cycle unchanged.

pub mod color;
pub mod document;
pub mod path;
pub mod value;

pub use color::{Rgb, Rgba};
pub use document::{layer, Document, DEFAULT_FRAME_RATE};
pub use path::{ColorPath, PathSegment};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("a Lottie document must be a JSON object")]
    NotAnObject,
    #[error("invalid hex color '{0}', expected #rrggbb")]
    InvalidHexColor(String),
    #[error("invalid color path '{0}'")]
    InvalidPath(String),
}
