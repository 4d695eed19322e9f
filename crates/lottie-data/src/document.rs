use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::value::{self, json_number};
use crate::DataError;

/// Frame rate used when a document has none, or a zero/negative one.
pub const DEFAULT_FRAME_RATE: f64 = 60.0;
/// Canvas edge used when `w`/`h` are missing.
pub const DEFAULT_CANVAS_SIZE: u32 = 512;

/// Lottie layer type tag for shape layers.
pub const LAYER_TYPE_SOLID: i64 = 1;
pub const LAYER_TYPE_SHAPE: i64 = 4;

/// A Lottie animation held as its original JSON tree.
///
/// Only the fields the editor touches are interpreted; everything else is
/// carried through untouched, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn from_value(root: Value) -> Result<Self, DataError> {
        if !root.is_object() {
            return Err(DataError::NotAnObject);
        }
        Ok(Self { root })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DataError> {
        let root: Value = serde_json::from_slice(bytes)?;
        Self::from_value(root)
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    /// Compact serialization.
    pub fn to_json(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string(&self.root)?)
    }

    /// Two-space indented serialization.
    pub fn to_json_pretty(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    fn fields(&self) -> &Map<String, Value> {
        match &self.root {
            Value::Object(map) => map,
            // Construction rejects non-object roots.
            _ => unreachable!("document root is always an object"),
        }
    }

    fn fields_mut(&mut self) -> &mut Map<String, Value> {
        match &mut self.root {
            Value::Object(map) => map,
            _ => unreachable!("document root is always an object"),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.fields().get("nm").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.fields().get("v").and_then(Value::as_str)
    }

    pub fn in_point(&self) -> f64 {
        value::number_or(self.fields().get("ip"), 0.0)
    }

    pub fn out_point(&self) -> f64 {
        value::number_or(self.fields().get("op"), 0.0)
    }

    /// Frame count between the in and out points, never negative.
    pub fn total_frames(&self) -> f64 {
        (self.out_point() - self.in_point()).max(0.0)
    }

    /// The stored frame rate, as written.
    pub fn raw_frame_rate(&self) -> Option<f64> {
        self.fields().get("fr").and_then(value::number)
    }

    /// The frame rate, falling back to [`DEFAULT_FRAME_RATE`] when missing,
    /// zero, negative or not finite.
    pub fn frame_rate(&self) -> f64 {
        sanitize_frame_rate(self.raw_frame_rate())
    }

    pub fn width(&self) -> u32 {
        self.dimension("w")
    }

    pub fn height(&self) -> u32 {
        self.dimension("h")
    }

    fn dimension(&self, key: &str) -> u32 {
        let raw = value::number_or(self.fields().get(key), f64::from(DEFAULT_CANVAS_SIZE));
        if raw >= 1.0 && raw.is_finite() {
            raw.round().min(f64::from(u16::MAX)) as u32
        } else {
            DEFAULT_CANVAS_SIZE
        }
    }

    pub fn set_in_point(&mut self, frame: f64) {
        self.set_number("ip", frame);
    }

    pub fn set_out_point(&mut self, frame: f64) {
        self.set_number("op", frame);
    }

    pub fn set_frame_rate(&mut self, fr: f64) {
        self.set_number("fr", fr);
    }

    fn set_number(&mut self, key: &str, new: f64) {
        match self.fields_mut().entry(key) {
            Entry::Occupied(mut slot) => value::write_number(slot.get_mut(), new),
            Entry::Vacant(slot) => {
                slot.insert(json_number(new));
            }
        }
    }

    pub fn layers(&self) -> &[Value] {
        self.fields()
            .get("layers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn layer_count(&self) -> usize {
        self.layers().len()
    }

    pub fn layer(&self, index: usize) -> Option<&Value> {
        self.layers().get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.fields_mut()
            .get_mut("layers")
            .and_then(Value::as_array_mut)
            .and_then(|layers| layers.get_mut(index))
    }
}

/// Replaces a missing, zero, negative or non-finite frame rate with the default.
pub fn sanitize_frame_rate(fr: Option<f64>) -> f64 {
    match fr {
        Some(fr) if fr.is_finite() && fr > 0.0 => fr,
        _ => DEFAULT_FRAME_RATE,
    }
}

/// Read-only helpers over a single layer object.
pub mod layer {
    use super::*;

    pub fn name(layer: &Value) -> Option<&str> {
        layer.get("nm").and_then(Value::as_str)
    }

    /// The layer's name, or `Layer {index}` when it has none.
    pub fn display_name(layer: &Value, index: usize) -> String {
        name(layer)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Layer {index}"))
    }

    pub fn layer_type(layer: &Value) -> Option<i64> {
        layer.get("ty").and_then(value::number).map(|ty| ty as i64)
    }

    pub fn is_shape_layer(layer: &Value) -> bool {
        layer_type(layer) == Some(LAYER_TYPE_SHAPE)
    }

    pub fn transform(layer: &Value) -> Option<&Value> {
        layer.get("ks").filter(|ks| ks.is_object())
    }

    pub fn shapes(layer: &Value) -> Option<&Value> {
        layer.get("shapes").filter(|shapes| shapes.is_array())
    }

    pub fn shapes_mut(layer: &mut Value) -> Option<&mut Value> {
        layer.get_mut("shapes").filter(|shapes| shapes.is_array())
    }
}
