use lottie_data::DataError;
use thiserror::Error;

/// A document could not be produced from an upload or URL.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no URL given")]
    EmptyUrl,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("a Lottie document must be a JSON object")]
    NotAnObject,
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl From<DataError> for LoadError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotAnObject => LoadError::NotAnObject,
            other => LoadError::InvalidJson(other.to_string()),
        }
    }
}

/// A single field or color edit could not be applied.
///
/// These are warnings: the offending edit is skipped and the rest proceed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructureMismatch {
    #[error("{path}: '{segment}' not found")]
    PathNotFound { path: String, segment: String },
    #[error("{location}: expected {expected}")]
    UnexpectedStructure {
        location: String,
        expected: &'static str,
    },
    #[error("{path}: node has no static color")]
    NotAColor { path: String },
    #[error("{location}: animated values cannot be edited")]
    AnimatedProperty { location: String },
}

/// A command addressed something that does not exist.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("layer {index} out of range (document has {count} layers)")]
    LayerOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} frame")]
    Surface { width: u32, height: u32 },
    #[error("GIF encoding failed: {0}")]
    Encode(String),
    #[error("PNG encoding failed: {0}")]
    Png(String),
}
