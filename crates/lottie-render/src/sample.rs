//! Sampling animatable properties at a frame.
//!
//! Keyframes are interpolated linearly between their start values; hold
//! keyframes (`h: 1`) keep their value until the next key. Easing handles
//! are ignored.

use lottie_data::value;
use serde_json::Value;

struct Key<'a> {
    t: f64,
    start: Option<Vec<f64>>,
    end: Option<Vec<f64>>,
    hold: bool,
    raw: &'a Value,
}

impl<'a> Key<'a> {
    fn parse(raw: &'a Value) -> Option<Self> {
        let t = raw.get("t").and_then(value::number)?;
        Some(Self {
            t,
            start: raw.get("s").and_then(value::numbers),
            end: raw.get("e").and_then(value::numbers),
            hold: raw.get("h").and_then(value::number) == Some(1.0),
            raw,
        })
    }
}

fn keyframes(prop: &Value) -> Option<Vec<Key<'_>>> {
    match value::keyed(prop) {
        Value::Array(items) if items.first().is_some_and(Value::is_object) => {
            Some(items.iter().filter_map(Key::parse).collect())
        }
        _ => None,
    }
}

/// The numeric components of `prop` at `frame`.
pub fn sample(prop: &Value, frame: f64) -> Option<Vec<f64>> {
    let Some(keys) = keyframes(prop) else {
        return value::numbers(value::keyed(prop));
    };
    let first = keys.first()?;
    if frame <= first.t {
        return first.start.clone().or_else(|| first.end.clone());
    }

    for pair in keys.windows(2) {
        let (key, next) = (&pair[0], &pair[1]);
        if frame >= next.t {
            continue;
        }
        let Some(from) = key.start.as_ref() else {
            return next.start.clone();
        };
        let to = key.end.as_ref().or(next.start.as_ref());
        return match to {
            Some(to) if !key.hold && next.t > key.t => {
                let progress = (frame - key.t) / (next.t - key.t);
                Some(lerp(from, to, progress))
            }
            _ => Some(from.clone()),
        };
    }

    // Past the last key: its start value, or the previous key's end value.
    let last = keys.last()?;
    last.start.clone().or_else(|| {
        keys.len()
            .checked_sub(2)
            .and_then(|i| keys[i].end.clone().or_else(|| keys[i].start.clone()))
    })
}

fn lerp(from: &[f64], to: &[f64], progress: f64) -> Vec<f64> {
    from.iter()
        .zip(to.iter().chain(std::iter::repeat(&f64::NAN)))
        .map(|(a, b)| if b.is_nan() { *a } else { a + (b - a) * progress })
        .collect()
}

pub fn scalar(prop: Option<&Value>, frame: f64, default: f64) -> f64 {
    prop.and_then(|p| sample(p, frame))
        .and_then(|v| v.first().copied())
        .unwrap_or(default)
}

pub fn pair(prop: Option<&Value>, frame: f64, default: [f64; 2]) -> [f64; 2] {
    match prop.and_then(|p| sample(p, frame)) {
        Some(v) => [
            v.first().copied().unwrap_or(default[0]),
            v.get(1).copied().unwrap_or(v.first().copied().unwrap_or(default[1])),
        ],
        None => default,
    }
}

/// Position, which may be split into separate `x`/`y` properties.
pub fn position(prop: Option<&Value>, frame: f64) -> [f64; 2] {
    match prop {
        Some(p) if p.get("s").and_then(Value::as_bool) == Some(true) => [
            scalar(p.get("x"), frame, 0.0),
            scalar(p.get("y"), frame, 0.0),
        ],
        other => pair(other, frame, [0.0, 0.0]),
    }
}

/// The bezier object (`{ i, o, v, c }`) of a path property at `frame`.
///
/// Path keyframes are held rather than morphed.
pub fn bezier(prop: &Value, frame: f64) -> Option<&Value> {
    let Some(keys) = keyframes(prop) else {
        let k = value::keyed(prop);
        return k.get("v").is_some().then_some(k);
    };
    let key = keys
        .iter()
        .take_while(|key| key.t <= frame)
        .last()
        .or(keys.first())?;
    let shape = key.raw.get("s")?;
    match shape {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}
