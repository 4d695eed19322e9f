use crate::DataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An RGB color with channels in `[0, 1]`, as Lottie stores them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Clamps each channel into `[0, 1]`. NaN becomes 0.
    pub fn clamped(self) -> Self {
        let clamp = |c: f64| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) };
        Self::new(clamp(self.r), clamp(self.g), clamp(self.b))
    }

    pub fn channels(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    /// Formats as `#rrggbb`, rounding each channel to the nearest byte.
    pub fn to_hex(&self) -> String {
        let c = self.clamped();
        let byte = |v: f64| (v * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(c.r), byte(c.g), byte(c.b))
    }
}

impl FromStr for Rgb {
    type Err = DataError;

    /// Parses `#rrggbb` or `rrggbb`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(DataError::InvalidHexColor(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| DataError::InvalidHexColor(s.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// An RGBA quadruple read from a fill or stroke `c.k` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Reads `[r, g, b]` or `[r, g, b, a, ...]`. Alpha defaults to 1.
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match components {
            [r, g, b] => Some(Self::new(*r, *g, *b, 1.0)),
            [r, g, b, a, ..] => Some(Self::new(*r, *g, *b, *a)),
            _ => None,
        }
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn to_hex(&self) -> String {
        self.rgb().to_hex()
    }
}

/// Serde adapter storing an [`Rgb`] as its `#rrggbb` text.
pub mod hex {
    use super::Rgb;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Rgb, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&color.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgb, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!("#00FF00".parse::<Rgb>().unwrap(), Rgb::new(0.0, 1.0, 0.0));
        assert_eq!("ff0000".parse::<Rgb>().unwrap(), Rgb::new(1.0, 0.0, 0.0));
        assert!("#0f0".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
    }

    #[test]
    fn hex_formatting_rounds_and_clamps() {
        assert_eq!(Rgb::new(1.0, 0.5, 0.0).to_hex(), "#ff8000");
        assert_eq!(Rgb::new(1.4, -0.2, 0.0).to_hex(), "#ff0000");
    }

    #[test]
    fn hex_round_trip_is_stable() {
        for hex in ["#000000", "#12ab9f", "#ffffff", "#7f7f80"] {
            assert_eq!(hex.parse::<Rgb>().unwrap().to_hex(), hex);
        }
    }

    #[test]
    fn components_default_alpha() {
        assert_eq!(
            Rgba::from_components(&[0.1, 0.2, 0.3]),
            Some(Rgba::new(0.1, 0.2, 0.3, 1.0))
        );
        assert_eq!(
            Rgba::from_components(&[0.1, 0.2, 0.3, 0.5]).map(|c| c.a),
            Some(0.5)
        );
        assert_eq!(Rgba::from_components(&[0.1, 0.2]), None);
    }
}
