//! The serializable view model rebuilt after every interaction.

use lottie_data::{layer, ColorPath, Document, DEFAULT_FRAME_RATE};
use serde::Serialize;

use crate::fields::{self, TransformField};
use crate::trim::TrimBounds;
use crate::walker::{self, PaintKind, WalkLimits};

#[derive(Debug, Clone, Serialize)]
pub struct EditorView {
    pub summary: DocumentSummary,
    pub layers: Vec<LayerSummary>,
    pub selected: Option<LayerView>,
    pub trim: TrimView,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub name: Option<String>,
    pub version: Option<String>,
    pub width: u32,
    pub height: u32,
    /// The stored frame rate, or the default when there is none.
    pub frame_rate: f64,
    pub in_point: f64,
    pub out_point: f64,
    pub layer_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub index: usize,
    pub name: String,
    pub layer_type: Option<i64>,
    pub is_shape_layer: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerView {
    pub index: usize,
    pub name: String,
    pub is_shape_layer: bool,
    pub position: Option<[f64; 2]>,
    pub scale: Option<[f64; 2]>,
    pub rotation: Option<f64>,
    /// Transform fields holding keyframes; shown read-only.
    pub animated: Vec<TransformField>,
    pub colors: Vec<ColorView>,
    pub colors_truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorView {
    pub path: ColorPath,
    pub kind: PaintKind,
    pub label: String,
    pub hex: String,
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrimView {
    pub total: f64,
    pub start: f64,
    pub end: f64,
}

impl EditorView {
    /// Builds the view for `doc` with `selected_layer` expanded.
    ///
    /// An out-of-range selection falls back to the last layer.
    pub fn build(
        doc: &Document,
        selected_layer: usize,
        trim: &TrimBounds,
        limits: &WalkLimits,
    ) -> Self {
        let layers = doc
            .layers()
            .iter()
            .enumerate()
            .map(|(index, l)| LayerSummary {
                index,
                name: layer::display_name(l, index),
                layer_type: layer::layer_type(l),
                is_shape_layer: layer::is_shape_layer(l),
            })
            .collect::<Vec<_>>();

        let selected = doc
            .layer_count()
            .checked_sub(1)
            .map(|last| selected_layer.min(last))
            .and_then(|index| layer_view(doc, index, limits));

        let (start, end) = trim.current(doc);
        Self {
            summary: DocumentSummary {
                name: doc.name().map(str::to_string),
                version: doc.version().map(str::to_string),
                width: doc.width(),
                height: doc.height(),
                frame_rate: doc.raw_frame_rate().unwrap_or(DEFAULT_FRAME_RATE),
                in_point: doc.in_point(),
                out_point: doc.out_point(),
                layer_count: doc.layer_count(),
            },
            layers,
            selected,
            trim: TrimView {
                total: trim.total,
                start,
                end,
            },
        }
    }
}

fn layer_view(doc: &Document, index: usize, limits: &WalkLimits) -> Option<LayerView> {
    let l = doc.layer(index)?;
    let is_shape_layer = layer::is_shape_layer(l);

    let (colors, colors_truncated) = if is_shape_layer {
        let scan = walker::layer_colors(doc, index, limits).unwrap_or_default();
        let colors = scan
            .entries
            .into_iter()
            .map(|entry| ColorView {
                label: format!("{} {}", entry.path, entry.kind.label()),
                hex: entry.rgba.to_hex(),
                alpha: entry.rgba.a,
                kind: entry.kind,
                path: entry.path,
            })
            .collect();
        (colors, scan.truncated)
    } else {
        (Vec::new(), false)
    };

    Some(LayerView {
        index,
        name: layer::display_name(l, index),
        is_shape_layer,
        position: fields::read_pair(l, TransformField::Position),
        scale: fields::read_pair(l, TransformField::Scale),
        rotation: fields::read_rotation(l),
        animated: TransformField::ALL
            .into_iter()
            .filter(|field| fields::is_animated(l, *field))
            .collect(),
        colors,
        colors_truncated,
    })
}
