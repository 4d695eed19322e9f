//! Writes staged color edits back into the tree they were discovered in.

use std::borrow::Cow;

use lottie_data::{value, ColorPath, Document, PathSegment, Rgb};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::walker;
use crate::{CommandError, StructureMismatch};

/// A replacement color for the node at `path`.
///
/// Only the RGB channels are replaced; alpha is kept as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorEdit {
    pub path: ColorPath,
    #[serde(with = "lottie_data::color::hex")]
    pub color: Rgb,
}

#[derive(Debug, Default)]
pub struct PatchReport {
    pub applied: Vec<ColorPath>,
    pub skipped: Vec<(ColorPath, StructureMismatch)>,
}

impl PatchReport {
    pub fn warnings(&self) -> impl Iterator<Item = &StructureMismatch> {
        self.skipped.iter().map(|(_, err)| err)
    }
}

/// Applies each edit independently; failures are reported and skipped.
///
/// `root` must be the same subtree the paths were discovered from.
pub fn apply_color_edits(root: &mut Value, edits: &[ColorEdit]) -> PatchReport {
    let mut report = PatchReport::default();
    for edit in edits {
        match apply_color_edit(root, edit) {
            Ok(()) => report.applied.push(edit.path.clone()),
            Err(err) => {
                warn!(path = %edit.path, "skipping color edit: {}", err);
                report.skipped.push((edit.path.clone(), err));
            }
        }
    }
    debug!(
        applied = report.applied.len(),
        skipped = report.skipped.len(),
        "color edits applied"
    );
    report
}

pub fn apply_color_edit(root: &mut Value, edit: &ColorEdit) -> Result<(), StructureMismatch> {
    let node = resolve_mut(root, &edit.path)?;
    let components = node
        .get_mut("c")
        .and_then(|c| c.get_mut("k"))
        .and_then(Value::as_array_mut)
        .filter(|k| walker::is_static_color(k))
        .ok_or_else(|| StructureMismatch::NotAColor {
            path: edit.path.to_string(),
        })?;

    let requested = edit.color.channels();
    let clamped = edit.color.clamped().channels();
    for ((slot, want), write) in components.iter_mut().zip(requested).zip(clamped) {
        if value::number(slot) != Some(want) {
            value::write_number(slot, write);
        }
    }
    Ok(())
}

/// Applies color edits to one layer, relative to its `shapes` array.
pub fn set_layer_colors(
    doc: &mut Document,
    layer_index: usize,
    edits: &[ColorEdit],
) -> Result<PatchReport, CommandError> {
    let count = doc.layer_count();
    let layer = doc
        .layer_mut(layer_index)
        .ok_or(CommandError::LayerOutOfRange {
            index: layer_index,
            count,
        })?;

    match lottie_data::layer::shapes_mut(layer) {
        Some(shapes) => Ok(apply_color_edits(shapes, edits)),
        None => {
            let skipped = edits
                .iter()
                .map(|edit| {
                    let err = StructureMismatch::PathNotFound {
                        path: edit.path.to_string(),
                        segment: "shapes".to_string(),
                    };
                    warn!(path = %edit.path, "skipping color edit: {}", err);
                    (edit.path.clone(), err)
                })
                .collect();
            Ok(PatchReport {
                applied: Vec::new(),
                skipped,
            })
        }
    }
}

/// Follows `path` from `root`, skipping the synthetic root label.
pub fn resolve<'a>(root: &'a Value, path: &ColorPath) -> Result<&'a Value, StructureMismatch> {
    let mut node = root;
    for segment in &path.segments {
        node = match node {
            Value::Object(map) => map
                .get(&*segment_key(segment))
                .ok_or_else(|| not_found(path, segment))?,
            Value::Array(items) => segment_index(segment)
                .and_then(|index| items.get(index))
                .ok_or_else(|| not_found(path, segment))?,
            _ => return Err(not_a_container(path, segment)),
        };
    }
    Ok(node)
}

pub fn resolve_mut<'a>(
    root: &'a mut Value,
    path: &ColorPath,
) -> Result<&'a mut Value, StructureMismatch> {
    let mut node = root;
    for segment in &path.segments {
        node = match node {
            Value::Object(map) => map
                .get_mut(&*segment_key(segment))
                .ok_or_else(|| not_found(path, segment))?,
            Value::Array(items) => segment_index(segment)
                .and_then(|index| items.get_mut(index))
                .ok_or_else(|| not_found(path, segment))?,
            _ => return Err(not_a_container(path, segment)),
        };
    }
    Ok(node)
}

fn segment_key(segment: &PathSegment) -> Cow<'_, str> {
    match segment {
        PathSegment::Key(key) => Cow::Borrowed(key),
        PathSegment::Index(index) => Cow::Owned(index.to_string()),
    }
}

/// Indices may arrive as numeric strings from the text form.
fn segment_index(segment: &PathSegment) -> Option<usize> {
    match segment {
        PathSegment::Index(index) => Some(*index),
        PathSegment::Key(key) => key.parse().ok(),
    }
}

fn not_found(path: &ColorPath, segment: &PathSegment) -> StructureMismatch {
    StructureMismatch::PathNotFound {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

fn not_a_container(path: &ColorPath, segment: &PathSegment) -> StructureMismatch {
    StructureMismatch::UnexpectedStructure {
        location: format!("{path} (before '{segment}')"),
        expected: "an object or array",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::{discover_colors, WalkLimits};
    use serde_json::json;

    fn edit(path: &str, hex: &str) -> ColorEdit {
        ColorEdit {
            path: path.parse().unwrap(),
            color: hex.parse().unwrap(),
        }
    }

    #[test]
    fn replaces_rgb_and_keeps_alpha() {
        let mut shapes = json!([{ "it": [{ "ty": "fl", "c": { "a": 0, "k": [1, 0, 0, 0.25] } }] }]);
        let report = apply_color_edits(&mut shapes, &[edit("Layer 0/0/it/0", "#0000ff")]);
        assert_eq!(report.applied.len(), 1);
        assert_eq!(shapes[0]["it"][0]["c"]["k"], json!([0.0, 0, 1.0, 0.25]));
    }

    #[test]
    fn bad_paths_are_skipped_without_aborting_others() {
        let mut shapes = json!([
            { "ty": "fl", "c": { "k": [1, 1, 1, 1] } },
            { "ty": "el", "p": { "k": [0, 0] } }
        ]);
        let edits = [
            edit("Layer 0/5", "#000000"),
            edit("Layer 0/1", "#000000"),
            edit("Layer 0/0/c/k/0/deeper", "#000000"),
            edit("Layer 0/0", "#000000"),
        ];
        let report = apply_color_edits(&mut shapes, &edits);
        assert_eq!(report.applied, vec![edits[3].path.clone()]);
        assert_eq!(report.skipped.len(), 3);
        assert!(matches!(
            report.skipped[0].1,
            StructureMismatch::PathNotFound { .. }
        ));
        assert!(matches!(
            report.skipped[1].1,
            StructureMismatch::NotAColor { .. }
        ));
        assert!(matches!(
            report.skipped[2].1,
            StructureMismatch::UnexpectedStructure { .. }
        ));
        assert_eq!(shapes[0]["c"]["k"], json!([0.0, 0.0, 0.0, 1]));
    }

    #[test]
    fn numeric_string_segments_index_arrays() {
        let mut shapes = json!({ "items": [{ "ty": "st", "c": { "k": [0, 0, 0, 1] } }] });
        let path = ColorPath::new("root")
            .child(PathSegment::Key("items".into()))
            .child(PathSegment::Key("0".into()));
        let report = apply_color_edits(
            &mut shapes,
            &[ColorEdit {
                path,
                color: Rgb::new(1.0, 1.0, 1.0),
            }],
        );
        assert!(report.skipped.is_empty());
        assert_eq!(shapes["items"][0]["c"]["k"], json!([1.0, 1.0, 1.0, 1]));
    }

    #[test]
    fn out_of_range_channels_are_clamped() {
        let mut node = json!({ "ty": "fl", "c": { "k": [0.5, 0.5, 0.5, 1] } });
        let edits = [ColorEdit {
            path: ColorPath::new("root"),
            color: Rgb::new(1.5, -0.5, 0.25),
        }];
        apply_color_edits(&mut node, &edits);
        assert_eq!(node["c"]["k"], json!([1.0, 0.0, 0.25, 1]));
    }

    #[test]
    fn identity_edits_are_byte_stable() {
        let mut shapes = json!([
            { "ty": "gr", "it": [
                { "ty": "fl", "c": { "a": 0, "k": [1, 0.4, 0.2, 1], "ix": 4 } },
                { "ty": "st", "c": { "a": 0, "k": [0, 0, 0, 1] } }
            ] },
            { "ty": "fl", "c": { "k": [0.123456789, 1, 0, 0.3] } }
        ]);
        let before = serde_json::to_string(&shapes).unwrap();

        let scan = discover_colors(&shapes, "Layer 0", &WalkLimits::default());
        let edits: Vec<ColorEdit> = scan
            .entries
            .iter()
            .map(|entry| ColorEdit {
                path: entry.path.clone(),
                color: entry.rgba.rgb(),
            })
            .collect();
        let report = apply_color_edits(&mut shapes, &edits);

        assert_eq!(report.applied.len(), 3);
        assert_eq!(serde_json::to_string(&shapes).unwrap(), before);
    }

    #[test]
    fn every_discovered_path_resolves_to_its_node() {
        let shapes = json!([
            { "ty": "gr", "it": [
                { "ty": "fl", "c": { "k": [1, 0, 0, 1] } },
                { "ty": "gr", "it": [{ "ty": "st", "c": { "k": [0, 1, 0, 1] } }] }
            ] }
        ]);
        let scan = discover_colors(&shapes, "Layer 3", &WalkLimits::default());
        assert_eq!(scan.entries.len(), 2);
        for entry in &scan.entries {
            let node = resolve(&shapes, &entry.path).unwrap();
            assert_eq!(node["ty"], json!(if entry.path.depth() == 3 { "fl" } else { "st" }));
        }
    }

    #[test]
    fn every_discovered_color_accepts_an_edit() {
        let mut shapes = json!([
            { "ty": "fl", "c": { "k": ["1", 0, 0, 1] } },
            { "ty": "st", "c": { "k": [true, false, false, true] } },
            { "ty": "fl", "c": { "k": [0.5, 0.5, 0.5, 1] } }
        ]);
        let scan = discover_colors(&shapes, "Layer 0", &WalkLimits::default());
        assert_eq!(scan.entries.len(), 1);

        let edits: Vec<ColorEdit> = scan
            .entries
            .iter()
            .map(|entry| ColorEdit {
                path: entry.path.clone(),
                color: Rgb::new(0.0, 0.0, 0.0),
            })
            .collect();
        let report = apply_color_edits(&mut shapes, &edits);
        assert_eq!(report.applied.len(), scan.entries.len());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn zero_padded_keys_survive_the_text_form() {
        let mut root = json!({ "007": { "ty": "fl", "c": { "k": [1, 1, 1, 1] } } });
        let path = ColorPath::new("root").child(PathSegment::Key("007".into()));
        let edit = ColorEdit {
            path: path.to_string().parse().unwrap(),
            color: Rgb::new(0.0, 0.0, 0.0),
        };
        apply_color_edit(&mut root, &edit).unwrap();
        assert_eq!(root["007"]["c"]["k"], json!([0.0, 0.0, 0.0, 1]));
    }
}
