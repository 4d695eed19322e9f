//! Depth-first discovery of fill and stroke colors.

use lottie_data::{value, ColorPath, Document, PathSegment, Rgba};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Bounds on a single walk, so malformed or adversarial input cannot make
/// discovery unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkLimits {
    /// Deepest segment count a visited container may have.
    pub max_depth: usize,
    /// Containers visited before the walk stops.
    pub max_nodes: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_nodes: 100_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintKind {
    Fill,
    Stroke,
}

impl PaintKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "fl" => Some(PaintKind::Fill),
            "st" => Some(PaintKind::Stroke),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaintKind::Fill => "Fill",
            PaintKind::Stroke => "Stroke",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorEntry {
    pub path: ColorPath,
    pub kind: PaintKind,
    pub rgba: Rgba,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorScan {
    pub entries: Vec<ColorEntry>,
    /// Set when a [`WalkLimits`] bound cut the walk short.
    pub truncated: bool,
}

/// Finds every fill/stroke node under `root` that carries a static `c.k` color.
///
/// Order is pre-order depth-first: object keys in document order, array
/// items by index. The order is stable across edits, since edits only touch
/// color values.
pub fn discover_colors(root: &Value, label: &str, limits: &WalkLimits) -> ColorScan {
    let mut walker = Walker {
        limits,
        visited: 0,
        scan: ColorScan::default(),
    };
    walker.visit(root, &ColorPath::new(label));

    if walker.scan.truncated {
        warn!(
            root = label,
            visited = walker.visited,
            "color walk hit its limits; results are partial"
        );
    }
    debug!(root = label, found = walker.scan.entries.len(), "color walk done");
    walker.scan
}

/// Walks a layer's `shapes` array under the label `Layer {index}`.
///
/// Returns `None` when the layer does not exist. Layers without shapes yield
/// an empty scan.
pub fn layer_colors(doc: &Document, index: usize, limits: &WalkLimits) -> Option<ColorScan> {
    let layer = doc.layer(index)?;
    Some(match lottie_data::layer::shapes(layer) {
        Some(shapes) => discover_colors(shapes, &layer_label(index), limits),
        None => ColorScan::default(),
    })
}

pub fn layer_label(index: usize) -> String {
    format!("Layer {index}")
}

struct Walker<'a> {
    limits: &'a WalkLimits,
    visited: usize,
    scan: ColorScan,
}

impl Walker<'_> {
    fn visit(&mut self, node: &Value, path: &ColorPath) {
        if !(node.is_object() || node.is_array()) {
            return;
        }
        if path.depth() > self.limits.max_depth || self.visited >= self.limits.max_nodes {
            self.scan.truncated = true;
            return;
        }
        self.visited += 1;

        match node {
            Value::Object(map) => {
                if let Some((kind, rgba)) = paint_color(map) {
                    self.scan.entries.push(ColorEntry {
                        path: path.clone(),
                        kind,
                        rgba,
                    });
                }
                for (key, child) in map {
                    self.visit(child, &path.child(PathSegment::Key(key.clone())));
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    self.visit(child, &path.child(PathSegment::Index(index)));
                }
            }
            _ => {}
        }
    }
}

/// Reads the paint kind and static color of a fill/stroke object.
pub(crate) fn paint_color(map: &Map<String, Value>) -> Option<(PaintKind, Rgba)> {
    let kind = map.get("ty").and_then(Value::as_str).and_then(PaintKind::from_tag)?;
    let components = static_color(map.get("c")?)?;
    Some((kind, Rgba::from_components(&components)?))
}

/// Whether `k` holds a static color: at least three JSON numbers.
///
/// The patcher writes only what passes this check, so anything listed here
/// can be edited.
pub(crate) fn is_static_color(k: &[Value]) -> bool {
    k.len() >= 3 && k.iter().all(Value::is_number)
}

/// A `c` property whose `k` is a plain numeric array.
fn static_color(color: &Value) -> Option<Vec<f64>> {
    let k = color.get("k")?.as_array()?;
    if !is_static_color(k) {
        return None;
    }
    k.iter().map(value::number).collect()
}
