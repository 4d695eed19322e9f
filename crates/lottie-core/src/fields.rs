//! Reads and writes the per-layer fields the editor binds to form controls.
//!
//! Reads never fail: heterogeneous or missing values fall back to defaults.
//! Writes replace only the edited components and keep anything trailing
//! (a third position or scale axis) exactly as stored.

use lottie_data::{layer, value};
use serde::{Deserialize, Serialize};
use serde_json::{json, map::Entry, Map, Value};

use crate::StructureMismatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformField {
    Position,
    Scale,
    Rotation,
}

impl TransformField {
    pub const ALL: [TransformField; 3] = [
        TransformField::Position,
        TransformField::Scale,
        TransformField::Rotation,
    ];

    /// Key inside the layer's `ks` block.
    pub fn key(self) -> &'static str {
        match self {
            TransformField::Position => "p",
            TransformField::Scale => "s",
            TransformField::Rotation => "r",
        }
    }

    pub fn default_pair(self) -> [f64; 2] {
        match self {
            TransformField::Scale => [100.0, 100.0],
            TransformField::Position | TransformField::Rotation => [0.0, 0.0],
        }
    }
}

fn property(layer: &Value, field: TransformField) -> Option<&Value> {
    layer::transform(layer)?.get(field.key())
}

/// True when the layer's transform carries `field` at all.
pub fn has_field(layer: &Value, field: TransformField) -> bool {
    property(layer, field).is_some()
}

pub fn is_animated(layer: &Value, field: TransformField) -> bool {
    property(layer, field).is_some_and(value::is_animated)
}

/// Reads position or scale as an `[x, y]` pair; `None` when absent.
pub fn read_pair(layer: &Value, field: TransformField) -> Option<[f64; 2]> {
    property(layer, field).map(|prop| value::pair_or(Some(prop), field.default_pair()))
}

/// Reads rotation in degrees; `None` when absent.
pub fn read_rotation(layer: &Value) -> Option<f64> {
    property(layer, TransformField::Rotation).map(|prop| value::number_or(Some(prop), 0.0))
}

pub fn write_name(layer: &mut Value, index: usize, name: &str) -> Result<(), StructureMismatch> {
    let fields = layer_object(layer, index)?;
    match fields.entry("nm") {
        Entry::Occupied(mut slot) => {
            if slot.get().as_str() != Some(name) {
                slot.insert(Value::String(name.to_string()));
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(Value::String(name.to_string()));
        }
    }
    Ok(())
}

/// Writes the first two components of position or scale.
///
/// A missing property is created as a static keyed value. Animated or
/// non-numeric properties are left alone and reported.
pub fn write_pair(
    layer: &mut Value,
    index: usize,
    field: TransformField,
    pair: [f64; 2],
) -> Result<(), StructureMismatch> {
    let location = location(index, field);
    let transform = transform_object(layer, index)?;

    let prop = match transform.entry(field.key()) {
        Entry::Vacant(slot) => {
            let k = [value::json_number(pair[0]), value::json_number(pair[1])];
            slot.insert(json!({ "a": 0, "k": k }));
            return Ok(());
        }
        Entry::Occupied(slot) => slot.into_mut(),
    };
    if value::is_animated(prop) {
        return Err(StructureMismatch::AnimatedProperty { location });
    }

    let target = value::keyed_mut(prop);
    match target {
        Value::Array(items) => {
            for (axis, new) in pair.into_iter().enumerate() {
                match items.get_mut(axis) {
                    Some(slot) => value::write_number(slot, new),
                    None => items.push(value::json_number(new)),
                }
            }
            Ok(())
        }
        Value::Number(_) | Value::String(_) | Value::Null => {
            *target = Value::Array(vec![value::json_number(pair[0]), value::json_number(pair[1])]);
            Ok(())
        }
        Value::Bool(_) | Value::Object(_) => Err(StructureMismatch::UnexpectedStructure {
            location,
            expected: "a numeric pair",
        }),
    }
}

/// Writes rotation in degrees, keeping any trailing components of an array form.
pub fn write_rotation(
    layer: &mut Value,
    index: usize,
    degrees: f64,
) -> Result<(), StructureMismatch> {
    let location = location(index, TransformField::Rotation);
    let transform = transform_object(layer, index)?;

    let prop = match transform.entry(TransformField::Rotation.key()) {
        Entry::Vacant(slot) => {
            slot.insert(json!({ "a": 0, "k": value::json_number(degrees) }));
            return Ok(());
        }
        Entry::Occupied(slot) => slot.into_mut(),
    };
    if value::is_animated(prop) {
        return Err(StructureMismatch::AnimatedProperty { location });
    }

    let target = value::keyed_mut(prop);
    match target {
        Value::Array(items) if !items.is_empty() => {
            value::write_number(&mut items[0], degrees);
            Ok(())
        }
        Value::Array(_) | Value::Number(_) | Value::String(_) | Value::Null => {
            value::write_number(target, degrees);
            Ok(())
        }
        Value::Bool(_) | Value::Object(_) => Err(StructureMismatch::UnexpectedStructure {
            location,
            expected: "a number",
        }),
    }
}

fn location(index: usize, field: TransformField) -> String {
    format!("layers/{index}/ks/{}", field.key())
}

fn layer_object(
    layer: &mut Value,
    index: usize,
) -> Result<&mut Map<String, Value>, StructureMismatch> {
    layer
        .as_object_mut()
        .ok_or_else(|| StructureMismatch::UnexpectedStructure {
            location: format!("layers/{index}"),
            expected: "an object",
        })
}

fn transform_object(
    layer: &mut Value,
    index: usize,
) -> Result<&mut Map<String, Value>, StructureMismatch> {
    layer_object(layer, index)?
        .entry("ks")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| StructureMismatch::UnexpectedStructure {
            location: format!("layers/{index}/ks"),
            expected: "an object",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> Value {
        json!({
            "ty": 4,
            "nm": "Dot",
            "ks": {
                "p": { "a": 0, "k": [100, 50, 0], "ix": 2 },
                "s": [80, 90, 100],
                "r": { "a": 0, "k": 15 }
            }
        })
    }

    #[test]
    fn reads_keyed_and_bare_forms() {
        let layer = layer();
        assert_eq!(read_pair(&layer, TransformField::Position), Some([100.0, 50.0]));
        assert_eq!(read_pair(&layer, TransformField::Scale), Some([80.0, 90.0]));
        assert_eq!(read_rotation(&layer), Some(15.0));
    }

    #[test]
    fn absent_fields_read_as_none_and_broken_ones_default() {
        let bare = json!({ "ty": 4 });
        assert_eq!(read_pair(&bare, TransformField::Position), None);
        assert_eq!(read_rotation(&bare), None);

        let broken = json!({ "ks": { "s": { "k": "huge" }, "r": { "k": [] } } });
        assert_eq!(read_pair(&broken, TransformField::Scale), Some([100.0, 100.0]));
        assert_eq!(read_rotation(&broken), Some(0.0));
    }

    #[test]
    fn writes_preserve_trailing_axes_and_sibling_keys() {
        let mut layer = layer();
        write_pair(&mut layer, 0, TransformField::Position, [10.0, 20.0]).unwrap();
        write_pair(&mut layer, 0, TransformField::Scale, [50.0, 50.0]).unwrap();
        write_rotation(&mut layer, 0, 400.0).unwrap();

        assert_eq!(layer["ks"]["p"], json!({ "a": 0, "k": [10.0, 20.0, 0], "ix": 2 }));
        assert_eq!(layer["ks"]["s"], json!([50.0, 50.0, 100]));
        assert_eq!(layer["ks"]["r"], json!({ "a": 0, "k": 400.0 }));
    }

    #[test]
    fn unchanged_writes_are_byte_stable() {
        let mut layer = layer();
        let before = serde_json::to_string(&layer).unwrap();
        write_pair(&mut layer, 0, TransformField::Position, [100.0, 50.0]).unwrap();
        write_pair(&mut layer, 0, TransformField::Scale, [80.0, 90.0]).unwrap();
        write_rotation(&mut layer, 0, 15.0).unwrap();
        write_name(&mut layer, 0, "Dot").unwrap();
        assert_eq!(serde_json::to_string(&layer).unwrap(), before);
    }

    #[test]
    fn missing_fields_are_created() {
        let mut layer = json!({ "ty": 4 });
        write_pair(&mut layer, 2, TransformField::Position, [1.0, 2.0]).unwrap();
        write_rotation(&mut layer, 2, 90.0).unwrap();
        write_name(&mut layer, 2, "New").unwrap();
        assert_eq!(layer["ks"]["p"], json!({ "a": 0, "k": [1.0, 2.0] }));
        assert_eq!(layer["ks"]["r"], json!({ "a": 0, "k": 90.0 }));
        assert_eq!(layer["nm"], json!("New"));
    }

    #[test]
    fn animated_properties_are_refused() {
        let mut layer = json!({
            "ks": { "p": { "a": 1, "k": [{ "t": 0, "s": [0, 0] }, { "t": 30, "s": [50, 50] }] } }
        });
        let before = layer.clone();
        let err = write_pair(&mut layer, 1, TransformField::Position, [5.0, 5.0]).unwrap_err();
        assert_eq!(
            err,
            StructureMismatch::AnimatedProperty {
                location: "layers/1/ks/p".into()
            }
        );
        assert_eq!(layer, before);
        assert!(is_animated(&layer, TransformField::Position));
    }

    #[test]
    fn split_position_is_unexpected() {
        let mut layer = json!({ "ks": { "p": { "s": true, "x": { "k": 1 }, "y": { "k": 2 } } } });
        let err = write_pair(&mut layer, 0, TransformField::Position, [5.0, 5.0]).unwrap_err();
        assert!(matches!(err, StructureMismatch::UnexpectedStructure { .. }));
    }

    #[test]
    fn non_object_layer_is_unexpected() {
        let mut layer = json!("not a layer");
        assert!(write_name(&mut layer, 0, "x").is_err());
        assert!(write_rotation(&mut layer, 0, 1.0).is_err());
    }
}
