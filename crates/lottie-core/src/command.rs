//! Edits as explicit values, so a session can preview, apply or replay them.

use lottie_data::{ColorPath, Document, Rgb};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fields::{self, TransformField};
use crate::patcher::{self, ColorEdit};
use crate::trim::TrimBounds;
use crate::{CommandError, StructureMismatch};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    SetLayerName {
        layer: usize,
        name: String,
    },
    SetPosition {
        layer: usize,
        value: [f64; 2],
    },
    SetScale {
        layer: usize,
        value: [f64; 2],
    },
    SetRotation {
        layer: usize,
        degrees: f64,
    },
    SetFrameRate {
        fr: f64,
    },
    Trim {
        start: f64,
        end: f64,
    },
    SetColor {
        layer: usize,
        path: ColorPath,
        #[serde(with = "lottie_data::color::hex")]
        color: Rgb,
    },
}

impl EditCommand {
    /// Applies the command to `doc`.
    ///
    /// Addressing a layer that does not exist is an error. Field-shape
    /// problems are returned as warnings and leave that field untouched.
    pub fn apply(
        &self,
        doc: &mut Document,
        trim: &TrimBounds,
    ) -> Result<Vec<StructureMismatch>, CommandError> {
        debug!(command = ?self, "applying edit");
        let outcome = match self {
            EditCommand::SetLayerName { layer, name } => {
                fields::write_name(layer_mut(doc, *layer)?, *layer, name)
            }
            EditCommand::SetPosition { layer, value } => fields::write_pair(
                layer_mut(doc, *layer)?,
                *layer,
                TransformField::Position,
                *value,
            ),
            EditCommand::SetScale { layer, value } => fields::write_pair(
                layer_mut(doc, *layer)?,
                *layer,
                TransformField::Scale,
                *value,
            ),
            EditCommand::SetRotation { layer, degrees } => {
                fields::write_rotation(layer_mut(doc, *layer)?, *layer, *degrees)
            }
            EditCommand::SetFrameRate { fr } => {
                doc.set_frame_rate(*fr);
                Ok(())
            }
            EditCommand::Trim { start, end } => {
                trim.apply(doc, *start, *end);
                Ok(())
            }
            EditCommand::SetColor {
                layer,
                path,
                color,
            } => {
                let edit = ColorEdit {
                    path: path.clone(),
                    color: *color,
                };
                let report = patcher::set_layer_colors(doc, *layer, &[edit])?;
                return Ok(report.skipped.into_iter().map(|(_, err)| err).collect());
            }
        };

        Ok(match outcome {
            Ok(()) => Vec::new(),
            Err(warning) => {
                tracing::warn!("{}", warning);
                vec![warning]
            }
        })
    }
}

fn layer_mut(doc: &mut Document, index: usize) -> Result<&mut serde_json::Value, CommandError> {
    let count = doc.layer_count();
    doc.layer_mut(index)
        .ok_or(CommandError::LayerOutOfRange { index, count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(json!({
            "ip": 0, "op": 60, "fr": 30,
            "layers": [{
                "ty": 4, "nm": "L0",
                "ks": { "p": { "a": 0, "k": [0, 0, 0] } },
                "shapes": [{ "it": [{ "ty": "fl", "c": { "k": [1, 0, 0, 1] } }] }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn commands_deserialize_from_tagged_json() {
        let commands: Vec<EditCommand> = serde_json::from_value(json!([
            { "op": "set_layer_name", "layer": 0, "name": "Hero" },
            { "op": "set_position", "layer": 0, "value": [10, 20] },
            { "op": "set_frame_rate", "fr": 24 },
            { "op": "trim", "start": 5, "end": 50 },
            { "op": "set_color", "layer": 0, "path": "Layer 0/0/it/0", "color": "#00ff00" }
        ]))
        .unwrap();
        assert_eq!(commands.len(), 5);
        assert_eq!(
            commands[4],
            EditCommand::SetColor {
                layer: 0,
                path: "Layer 0/0/it/0".parse().unwrap(),
                color: Rgb::new(0.0, 1.0, 0.0),
            }
        );
    }

    #[test]
    fn applies_each_kind() {
        let mut document = doc();
        let trim = TrimBounds::of(&document);
        let commands = [
            EditCommand::SetLayerName {
                layer: 0,
                name: "Hero".into(),
            },
            EditCommand::SetPosition {
                layer: 0,
                value: [10.0, 20.0],
            },
            EditCommand::SetScale {
                layer: 0,
                value: [50.0, 75.0],
            },
            EditCommand::SetRotation {
                layer: 0,
                degrees: 45.0,
            },
            EditCommand::SetFrameRate { fr: 24.0 },
            EditCommand::Trim {
                start: 5.0,
                end: 90.0,
            },
            EditCommand::SetColor {
                layer: 0,
                path: "Layer 0/0/it/0".parse().unwrap(),
                color: Rgb::new(0.0, 0.0, 1.0),
            },
        ];
        for command in &commands {
            assert!(command.apply(&mut document, &trim).unwrap().is_empty());
        }

        let layer = document.layer(0).unwrap();
        assert_eq!(layer["nm"], json!("Hero"));
        assert_eq!(layer["ks"]["p"]["k"], json!([10.0, 20.0, 0]));
        assert_eq!(layer["ks"]["s"], json!({ "a": 0, "k": [50.0, 75.0] }));
        assert_eq!(layer["ks"]["r"], json!({ "a": 0, "k": 45.0 }));
        assert_eq!(layer["shapes"][0]["it"][0]["c"]["k"], json!([0.0, 0, 1.0, 1]));
        assert_eq!(document.frame_rate(), 24.0);
        assert_eq!((document.in_point(), document.out_point()), (5.0, 60.0));
    }

    #[test]
    fn missing_layer_is_an_error() {
        let mut document = doc();
        let trim = TrimBounds::of(&document);
        let err = EditCommand::SetRotation {
            layer: 3,
            degrees: 1.0,
        }
        .apply(&mut document, &trim)
        .unwrap_err();
        assert_eq!(err, CommandError::LayerOutOfRange { index: 3, count: 1 });
    }

    #[test]
    fn stale_color_path_is_a_warning() {
        let mut document = doc();
        let trim = TrimBounds::of(&document);
        let warnings = EditCommand::SetColor {
            layer: 0,
            path: "Layer 0/0/it/7".parse().unwrap(),
            color: Rgb::new(0.0, 0.0, 0.0),
        }
        .apply(&mut document, &trim)
        .unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(document, doc());
    }
}
