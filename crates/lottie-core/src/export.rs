//! JSON and GIF artifacts offered for download.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use lottie_data::{document::sanitize_frame_rate, DataError, Document};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::playback::PlaybackOptions;
use crate::RenderError;

pub const JSON_FILE_NAME: &str = "edited_lottie_animation.json";
pub const JSON_MIME: &str = "application/json";
pub const GIF_FILE_NAME: &str = "lottie_animation.gif";
pub const GIF_MIME: &str = "image/gif";

pub const MIN_GIF_FRAMES: u32 = 10;
pub const MAX_GIF_FRAMES: u32 = 100;
pub const DEFAULT_GIF_FRAMES: u32 = 30;

/// Pretty-printed JSON of the current document.
pub fn export_json(doc: &Document) -> Result<String, DataError> {
    doc.to_json_pretty()
}

/// Seconds of animation covered by `frames` frames at frame rate `fr`.
///
/// A missing, zero or negative frame rate uses the default instead of
/// dividing by it.
pub fn gif_duration_secs(frames: u32, fr: Option<f64>) -> f64 {
    f64::from(frames) / sanitize_frame_rate(fr)
}

pub fn gif_data_uri(bytes: &[u8]) -> String {
    format!("data:{GIF_MIME};base64,{}", BASE64_STANDARD.encode(bytes))
}

/// Anything able to turn a document into GIF bytes.
pub trait GifRenderer {
    fn render_gif(
        &self,
        doc: &Document,
        playback: &PlaybackOptions,
        duration_secs: f64,
    ) -> Result<Vec<u8>, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GifRequest {
    #[serde(default = "default_gif_frames")]
    pub frames: u32,
    #[serde(default)]
    pub playback: PlaybackOptions,
}

fn default_gif_frames() -> u32 {
    DEFAULT_GIF_FRAMES
}

impl Default for GifRequest {
    fn default() -> Self {
        Self {
            frames: DEFAULT_GIF_FRAMES,
            playback: PlaybackOptions::default(),
        }
    }
}

impl GifRequest {
    pub fn frame_count(&self) -> u32 {
        self.frames.clamp(MIN_GIF_FRAMES, MAX_GIF_FRAMES)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GifExport {
    pub file_name: &'static str,
    pub data_uri: String,
    pub duration_secs: f64,
    pub byte_len: usize,
}

pub fn export_gif<R: GifRenderer + ?Sized>(
    renderer: &R,
    doc: &Document,
    request: &GifRequest,
) -> Result<GifExport, RenderError> {
    let duration_secs = gif_duration_secs(request.frame_count(), doc.raw_frame_rate());
    let bytes = renderer.render_gif(doc, &request.playback, duration_secs)?;
    info!(
        frames = request.frame_count(),
        duration_secs,
        bytes = bytes.len(),
        "GIF exported"
    );
    Ok(GifExport {
        file_name: GIF_FILE_NAME,
        data_uri: gif_data_uri(&bytes),
        duration_secs,
        byte_len: bytes.len(),
    })
}
