//! Preview rendering and GIF export for Lottie documents.

pub mod gif;
pub mod raster;
pub mod sample;

pub use gif::{frame_schedule, RasterGifRenderer};
pub use raster::{output_size, Rasterizer};

use lottie_core::RenderError;
use lottie_data::Document;

/// One frame as PNG bytes, transparent where nothing is drawn.
pub fn render_png(doc: &Document, frame: f64, height: u32) -> Result<Vec<u8>, RenderError> {
    Rasterizer::new(doc)
        .render_frame(frame, height, None)?
        .encode_png()
        .map_err(|e| RenderError::Png(e.to_string()))
}
