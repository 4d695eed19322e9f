use serde::{Deserialize, Serialize};

pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 3.0;
pub const DEFAULT_HEIGHT: u32 = 400;
const MIN_HEIGHT: u32 = 16;
const MAX_HEIGHT: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Low,
    Medium,
    High,
}

/// How the preview plays an animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackOptions {
    pub speed: f64,
    pub reverse: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub quality: Quality,
    /// Output height in pixels; width follows the document's aspect ratio.
    pub height: u32,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            reverse: false,
            looping: true,
            quality: Quality::Low,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl PlaybackOptions {
    /// Speed clamped to the slider range; non-finite speeds play at 1x.
    pub fn speed(&self) -> f64 {
        if self.speed.is_finite() {
            self.speed.clamp(MIN_SPEED, MAX_SPEED)
        } else {
            1.0
        }
    }

    pub fn height(&self) -> u32 {
        self.height.clamp(MIN_HEIGHT, MAX_HEIGHT)
    }
}
