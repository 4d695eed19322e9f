//! Value parsers for `edit` and `gif` flags.

use std::str::FromStr;

use clap::ValueEnum;
use lottie_core::Quality;
use lottie_data::{ColorPath, Rgb};

/// Parses `X,Y`.
pub fn parse_pair(raw: &str) -> Result<[f64; 2], String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", raw))?;
    let number = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("'{}' is not a number: {}", s.trim(), e))
    };
    Ok([number(x)?, number(y)?])
}

/// `START:END` in frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimArg {
    pub start: f64,
    pub end: f64,
}

impl FromStr for TrimArg {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (start, end) = raw
            .split_once(':')
            .ok_or_else(|| format!("expected START:END but got '{}'", raw))?;
        let frame = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|e| format!("'{}' is not a frame number: {}", s.trim(), e))
        };
        Ok(Self {
            start: frame(start)?,
            end: frame(end)?,
        })
    }
}

/// `PATH=#RRGGBB`. The last `=` separates the color, so paths may contain `=`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorArg {
    pub path: ColorPath,
    pub color: Rgb,
}

impl FromStr for ColorArg {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (path, color) = raw
            .rsplit_once('=')
            .ok_or_else(|| format!("expected PATH=#RRGGBB but got '{}'", raw))?;
        Ok(Self {
            path: path.parse().map_err(|e| format!("{}", e))?,
            color: color.trim().parse().map_err(|e| format!("{}", e))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    Low,
    Medium,
    High,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Low => Quality::Low,
            QualityArg::Medium => Quality::Medium,
            QualityArg::High => Quality::High,
        }
    }
}
