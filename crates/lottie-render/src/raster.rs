//! Rasterizes document frames with tiny-skia.

use std::collections::HashMap;

use lottie_core::RenderError;
use lottie_data::{layer, value, Document, Rgb};
use serde_json::Value;
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform,
};
use tracing::trace;

use crate::sample;

/// Parent chains longer than this are treated as cycles.
const MAX_PARENT_DEPTH: usize = 32;
/// Nested groups deeper than this are not drawn.
const MAX_GROUP_DEPTH: usize = 64;
/// Bezier control-point distance for quarter circles.
const KAPPA: f32 = 0.552_284_8;

/// Output size for a document drawn at `height` pixels, keeping aspect ratio.
pub fn output_size(doc: &Document, height: u32) -> (u32, u32) {
    let height = height.max(1);
    let aspect = f64::from(doc.width()) / f64::from(doc.height());
    let width = (f64::from(height) * aspect).round().max(1.0) as u32;
    (width, height)
}

/// Draws frames of one document.
pub struct Rasterizer<'a> {
    doc: &'a Document,
    by_index: HashMap<i64, usize>,
}

#[derive(Clone)]
struct DrawOp {
    path: Path,
    style: PaintStyle,
}

#[derive(Clone, Copy)]
enum PaintStyle {
    Fill {
        color: Color,
        rule: FillRule,
    },
    Stroke {
        color: Color,
        width: f32,
        cap: LineCap,
        join: LineJoin,
        miter_limit: f32,
    },
}

impl PaintStyle {
    fn fade(self, opacity: f32) -> Self {
        let fade = |mut color: Color| {
            color.apply_opacity(opacity);
            color
        };
        match self {
            PaintStyle::Fill { color, rule } => PaintStyle::Fill {
                color: fade(color),
                rule,
            },
            PaintStyle::Stroke {
                color,
                width,
                cap,
                join,
                miter_limit,
            } => PaintStyle::Stroke {
                color: fade(color),
                width,
                cap,
                join,
                miter_limit,
            },
        }
    }
}

#[derive(Default)]
struct GroupOutput {
    /// Bottom-most first.
    ops: Vec<DrawOp>,
    geometry: Vec<Path>,
}

impl<'a> Rasterizer<'a> {
    pub fn new(doc: &'a Document) -> Self {
        let by_index = doc
            .layers()
            .iter()
            .enumerate()
            .filter_map(|(i, l)| Some((l.get("ind").and_then(value::number)? as i64, i)))
            .collect();
        Self { doc, by_index }
    }

    /// Renders `frame` at `height` pixels. `background` fills the frame first;
    /// `None` leaves it transparent.
    pub fn render_frame(
        &self,
        frame: f64,
        height: u32,
        background: Option<Color>,
    ) -> Result<Pixmap, RenderError> {
        let (width, height) = output_size(self.doc, height);
        let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?;
        if let Some(background) = background {
            pixmap.fill(background);
        }

        let scale = height as f32 / self.doc.height() as f32;
        let base = Transform::from_scale(scale, scale);

        // Index 0 is the top layer; paint bottom-up.
        for (index, l) in self.doc.layers().iter().enumerate().rev() {
            if !self.is_visible(l, frame) {
                continue;
            }
            let local_frame = layer_time(l, frame);
            let transform = base.pre_concat(self.world_transform(index, frame));
            let opacity = (sample::scalar(ks(l, "o"), local_frame, 100.0) / 100.0) as f32;
            if opacity <= 0.0 {
                continue;
            }

            let ops = match layer::layer_type(l) {
                Some(lottie_data::document::LAYER_TYPE_SHAPE) => {
                    let items = l.get("shapes").and_then(Value::as_array).map(Vec::as_slice);
                    self.render_items(items.unwrap_or(&[]), local_frame, 0).ops
                }
                Some(lottie_data::document::LAYER_TYPE_SOLID) => solid_ops(l).into_iter().collect(),
                _ => Vec::new(),
            };
            trace!(layer = index, ops = ops.len(), "drawing layer");
            for op in ops {
                draw(&mut pixmap, &op.path, op.style.fade(opacity), transform);
            }
        }
        Ok(pixmap)
    }

    fn is_visible(&self, l: &Value, frame: f64) -> bool {
        if l.get("hd").and_then(Value::as_bool) == Some(true) {
            return false;
        }
        // Track matte sources are not drawn on their own.
        if l.get("td").and_then(value::number) == Some(1.0) {
            return false;
        }
        let ip = value::number_or(l.get("ip"), self.doc.in_point());
        let op = value::number_or(l.get("op"), self.doc.out_point());
        frame >= ip && frame < op
    }

    fn world_transform(&self, index: usize, frame: f64) -> Transform {
        let mut chain = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            if chain.len() >= MAX_PARENT_DEPTH || chain.contains(&i) {
                break;
            }
            chain.push(i);
            current = self
                .doc
                .layer(i)
                .and_then(|l| l.get("parent"))
                .and_then(value::number)
                .and_then(|parent| self.by_index.get(&(parent as i64)).copied());
        }

        chain.iter().rev().fold(Transform::identity(), |acc, &i| {
            let l = &self.doc.layers()[i];
            acc.pre_concat(local_transform(l.get("ks"), layer_time(l, frame)))
        })
    }

    fn render_items(&self, items: &[Value], frame: f64, depth: usize) -> GroupOutput {
        if depth > MAX_GROUP_DEPTH {
            return GroupOutput::default();
        }

        let mut slots: Vec<Vec<DrawOp>> = Vec::new();
        let mut geometry: Vec<Path> = Vec::new();
        for item in items {
            if item.get("hd").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            match item.get("ty").and_then(Value::as_str) {
                Some("rc") => geometry.extend(rect_path(item, frame)),
                Some("el") => geometry.extend(ellipse_path(item, frame)),
                Some("sh") => geometry.extend(item.get("ks").and_then(|ks| bezier_path(ks, frame))),
                Some("gr") => {
                    let group = self.render_group(item, frame, depth + 1);
                    slots.push(group.ops);
                    geometry.extend(group.geometry);
                }
                Some("fl") => {
                    let style = fill_style(item, frame);
                    slots.push(paint_all(&geometry, style));
                }
                Some("st") => {
                    let style = stroke_style(item, frame);
                    slots.push(paint_all(&geometry, style));
                }
                _ => {}
            }
        }

        // Earlier items sit on top.
        GroupOutput {
            ops: slots.into_iter().rev().flatten().collect(),
            geometry,
        }
    }

    fn render_group(&self, group: &Value, frame: f64, depth: usize) -> GroupOutput {
        let items = group.get("it").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
        let inner = self.render_items(items, frame, depth);

        let Some(tr) = items
            .iter()
            .find(|i| i.get("ty").and_then(Value::as_str) == Some("tr"))
        else {
            return inner;
        };
        let transform = local_transform(Some(tr), frame);
        let opacity = (sample::scalar(tr.get("o"), frame, 100.0) / 100.0) as f32;

        GroupOutput {
            ops: inner
                .ops
                .into_iter()
                .filter_map(|op| {
                    Some(DrawOp {
                        path: op.path.transform(transform)?,
                        style: op.style.fade(opacity),
                    })
                })
                .collect(),
            geometry: inner
                .geometry
                .into_iter()
                .filter_map(|path| path.transform(transform))
                .collect(),
        }
    }
}

fn ks<'v>(l: &'v Value, key: &str) -> Option<&'v Value> {
    l.get("ks").and_then(|ks| ks.get(key))
}

/// Frame in the layer's own timeline (start offset and stretch applied).
fn layer_time(l: &Value, frame: f64) -> f64 {
    let start = value::number_or(l.get("st"), 0.0);
    let stretch = value::number_or(l.get("sr"), 1.0);
    let stretch = if stretch.abs() > f64::EPSILON { stretch } else { 1.0 };
    (frame - start) / stretch
}

/// Translate(p) * Rotate(r) * Scale(s) * Translate(-a).
fn local_transform(ks: Option<&Value>, frame: f64) -> Transform {
    let Some(ks) = ks else {
        return Transform::identity();
    };
    let anchor = sample::pair(ks.get("a"), frame, [0.0, 0.0]);
    let position = sample::position(ks.get("p"), frame);
    let scale = sample::pair(ks.get("s"), frame, [100.0, 100.0]);
    let rotation = sample::scalar(ks.get("r").or_else(|| ks.get("rz")), frame, 0.0);

    Transform::from_translate(position[0] as f32, position[1] as f32)
        .pre_concat(Transform::from_rotate(rotation as f32))
        .pre_scale((scale[0] / 100.0) as f32, (scale[1] / 100.0) as f32)
        .pre_translate(-anchor[0] as f32, -anchor[1] as f32)
}

fn paint_all(geometry: &[Path], style: PaintStyle) -> Vec<DrawOp> {
    geometry
        .iter()
        .map(|path| DrawOp {
            path: path.clone(),
            style,
        })
        .collect()
}

fn color_at(item: &Value, frame: f64) -> Color {
    let rgba = item
        .get("c")
        .and_then(|c| sample::sample(c, frame))
        .and_then(|c| lottie_data::Rgba::from_components(&c))
        .unwrap_or(lottie_data::Rgba::new(0.0, 0.0, 0.0, 1.0));
    let opacity = sample::scalar(item.get("o"), frame, 100.0) / 100.0;
    to_color(rgba.rgb(), rgba.a * opacity)
}

fn to_color(rgb: Rgb, alpha: f64) -> Color {
    let c = rgb.clamped();
    Color::from_rgba(c.r as f32, c.g as f32, c.b as f32, alpha.clamp(0.0, 1.0) as f32)
        .unwrap_or(Color::TRANSPARENT)
}

fn fill_style(item: &Value, frame: f64) -> PaintStyle {
    let rule = match item.get("r").and_then(value::number) {
        Some(r) if r == 2.0 => FillRule::EvenOdd,
        _ => FillRule::Winding,
    };
    PaintStyle::Fill {
        color: color_at(item, frame),
        rule,
    }
}

fn stroke_style(item: &Value, frame: f64) -> PaintStyle {
    let cap = match item.get("lc").and_then(value::number) {
        Some(c) if c == 2.0 => LineCap::Round,
        Some(c) if c == 3.0 => LineCap::Square,
        _ => LineCap::Butt,
    };
    let join = match item.get("lj").and_then(value::number) {
        Some(j) if j == 2.0 => LineJoin::Round,
        Some(j) if j == 3.0 => LineJoin::Bevel,
        _ => LineJoin::Miter,
    };
    PaintStyle::Stroke {
        color: color_at(item, frame),
        width: sample::scalar(item.get("w"), frame, 1.0).max(0.0) as f32,
        cap,
        join,
        miter_limit: value::number_or(item.get("ml"), 4.0) as f32,
    }
}

fn centered_rect(item: &Value, frame: f64) -> Option<Rect> {
    let size = sample::pair(item.get("s"), frame, [0.0, 0.0]);
    let center = sample::pair(item.get("p"), frame, [0.0, 0.0]);
    Rect::from_xywh(
        (center[0] - size[0] / 2.0) as f32,
        (center[1] - size[1] / 2.0) as f32,
        size[0] as f32,
        size[1] as f32,
    )
}

fn rect_path(item: &Value, frame: f64) -> Option<Path> {
    let rect = centered_rect(item, frame)?;
    let radius = sample::scalar(item.get("r"), frame, 0.0) as f32;
    let radius = radius.min(rect.width() / 2.0).min(rect.height() / 2.0);
    if radius <= 0.0 {
        return Some(PathBuilder::from_rect(rect));
    }

    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let k = radius * (1.0 - KAPPA);
    let mut pb = PathBuilder::new();
    pb.move_to(l + radius, t);
    pb.line_to(r - radius, t);
    pb.cubic_to(r - k, t, r, t + k, r, t + radius);
    pb.line_to(r, b - radius);
    pb.cubic_to(r, b - k, r - k, b, r - radius, b);
    pb.line_to(l + radius, b);
    pb.cubic_to(l + k, b, l, b - k, l, b - radius);
    pb.line_to(l, t + radius);
    pb.cubic_to(l, t + k, l + k, t, l + radius, t);
    pb.close();
    pb.finish()
}

fn ellipse_path(item: &Value, frame: f64) -> Option<Path> {
    PathBuilder::from_oval(centered_rect(item, frame)?)
}

fn bezier_path(prop: &Value, frame: f64) -> Option<Path> {
    let shape = sample::bezier(prop, frame)?;
    let points = |key: &str| -> Vec<[f32; 2]> {
        shape
            .get(key)
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|p| {
                        let [x, y] = value::pair_or(Some(p), [0.0, 0.0]);
                        [x as f32, y as f32]
                    })
                    .collect()
            })
            .unwrap_or_default()
    };
    let vertices = points("v");
    let in_tangents = points("i");
    let out_tangents = points("o");
    let closed = shape.get("c").and_then(Value::as_bool).unwrap_or(false);
    let first = vertices.first()?;

    let tangent = |list: &[[f32; 2]], i: usize| list.get(i).copied().unwrap_or([0.0, 0.0]);
    let mut pb = PathBuilder::new();
    pb.move_to(first[0], first[1]);
    let segments = if closed { vertices.len() } else { vertices.len() - 1 };
    for i in 0..segments {
        let next = (i + 1) % vertices.len();
        let (p0, p1) = (vertices[i], vertices[next]);
        let (out, inn) = (tangent(&out_tangents, i), tangent(&in_tangents, next));
        pb.cubic_to(
            p0[0] + out[0],
            p0[1] + out[1],
            p1[0] + inn[0],
            p1[1] + inn[1],
            p1[0],
            p1[1],
        );
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

/// A solid layer's rectangle, filled with its `sc` color.
fn solid_ops(l: &Value) -> Option<DrawOp> {
    let color: Rgb = l.get("sc").and_then(Value::as_str)?.parse().ok()?;
    let width = value::number_or(l.get("sw"), 0.0) as f32;
    let height = value::number_or(l.get("sh"), 0.0) as f32;
    Some(DrawOp {
        path: PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, width, height)?),
        style: PaintStyle::Fill {
            color: to_color(color, 1.0),
            rule: FillRule::Winding,
        },
    })
}

fn draw(pixmap: &mut Pixmap, path: &Path, style: PaintStyle, transform: Transform) {
    let mut paint = Paint::default();
    paint.anti_alias = true;
    match style {
        PaintStyle::Fill { color, rule } => {
            paint.set_color(color);
            pixmap.fill_path(path, &paint, rule, transform, None);
        }
        PaintStyle::Stroke {
            color,
            width,
            cap,
            join,
            miter_limit,
        } => {
            if width <= 0.0 {
                return;
            }
            paint.set_color(color);
            let stroke = Stroke {
                width,
                line_cap: cap,
                line_join: join,
                miter_limit,
                ..Stroke::default()
            };
            pixmap.stroke_path(path, &paint, &stroke, transform, None);
        }
    }
}
