//! GIF encoding of rendered frames.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use lottie_core::{GifRenderer, PlaybackOptions, Quality, RenderError};
use lottie_data::Document;
use tiny_skia::{Color, Pixmap};
use tracing::debug;

use crate::raster::Rasterizer;

/// Frames sampled by a GIF of `count` frames.
///
/// Each GIF frame advances the timeline by `speed` frames. Looping playback
/// wraps inside `[ip, op)`; otherwise the last frame repeats once the end is
/// reached. Reverse playback walks back from the last frame.
pub fn frame_schedule(doc: &Document, playback: &PlaybackOptions, count: u32) -> Vec<f64> {
    let ip = doc.in_point();
    let span = (doc.out_point() - ip).max(0.0);
    let last = (span - 1.0).max(0.0);
    let speed = playback.speed();

    let position = |offset: f64| {
        if playback.looping && span > 0.0 {
            offset.rem_euclid(span)
        } else {
            offset.clamp(0.0, last)
        }
    };

    (0..count)
        .map(|i| {
            let offset = f64::from(i) * speed;
            let offset = if playback.reverse { last - offset } else { offset };
            ip + position(offset)
        })
        .collect()
}

fn encoder_speed(quality: Quality) -> i32 {
    match quality {
        Quality::Low => 30,
        Quality::Medium => 10,
        Quality::High => 1,
    }
}

fn to_image(pixmap: &Pixmap) -> Result<RgbaImage, RenderError> {
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data).ok_or(RenderError::Surface {
        width: pixmap.width(),
        height: pixmap.height(),
    })
}

/// Renders GIFs with the tiny-skia rasterizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterGifRenderer;

impl GifRenderer for RasterGifRenderer {
    fn render_gif(
        &self,
        doc: &Document,
        playback: &PlaybackOptions,
        duration_secs: f64,
    ) -> Result<Vec<u8>, RenderError> {
        let fr = doc.frame_rate();
        let count = (duration_secs * fr).round().max(1.0) as u32;
        let delay = Delay::from_numer_denom_ms(1000, fr.round().max(1.0) as u32);
        let rasterizer = Rasterizer::new(doc);

        let mut bytes = Vec::new();
        {
            let mut encoder =
                GifEncoder::new_with_speed(&mut bytes, encoder_speed(playback.quality));
            let repeat = if playback.looping {
                Repeat::Infinite
            } else {
                Repeat::Finite(0)
            };
            encoder
                .set_repeat(repeat)
                .map_err(|e| RenderError::Encode(e.to_string()))?;

            for frame in frame_schedule(doc, playback, count) {
                // GIF has no partial alpha; composite over white.
                let pixmap = rasterizer.render_frame(frame, playback.height(), Some(Color::WHITE))?;
                encoder
                    .encode_frame(Frame::from_parts(to_image(&pixmap)?, 0, 0, delay))
                    .map_err(|e| RenderError::Encode(e.to_string()))?;
            }
        }
        debug!(frames = count, bytes = bytes.len(), "GIF encoded");
        Ok(bytes)
    }
}
