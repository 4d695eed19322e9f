use lottie_data::Document;
use serde::{Deserialize, Serialize};

/// The range a trim may select from, fixed when a document is loaded.
///
/// Trims are expressed relative to frame zero and written back as the new
/// `ip`/`op`, so the bound must come from the untrimmed document; otherwise
/// each trim would shrink the range available to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimBounds {
    pub total: f64,
}

impl TrimBounds {
    pub fn of(doc: &Document) -> Self {
        Self {
            total: doc.total_frames(),
        }
    }

    /// Clamps a requested range into `[0, total]` with `start <= end`.
    pub fn clamp(&self, start: f64, end: f64) -> (f64, f64) {
        let total = if self.total.is_finite() {
            self.total.max(0.0)
        } else {
            0.0
        };
        let clamp = |frame: f64| {
            if frame.is_nan() {
                0.0
            } else {
                frame.clamp(0.0, total)
            }
        };
        let start = clamp(start);
        let end = clamp(end).max(start);
        (start, end)
    }

    /// Writes the clamped range as the document's new in and out points.
    pub fn apply(&self, doc: &mut Document, start: f64, end: f64) -> (f64, f64) {
        let (start, end) = self.clamp(start, end);
        doc.set_in_point(start);
        doc.set_out_point(end);
        (start, end)
    }

    /// The document's current range as seen through these bounds.
    pub fn current(&self, doc: &Document) -> (f64, f64) {
        self.clamp(doc.in_point(), doc.out_point())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(ip: f64, op: f64) -> Document {
        Document::from_value(json!({ "ip": ip, "op": op, "fr": 30 })).unwrap()
    }

    #[test]
    fn clamps_into_range() {
        let bounds = TrimBounds { total: 60.0 };
        assert_eq!(bounds.clamp(-5.0, 80.0), (0.0, 60.0));
        assert_eq!(bounds.clamp(40.0, 10.0), (40.0, 40.0));
        assert_eq!(bounds.clamp(f64::NAN, 30.0), (0.0, 30.0));
        assert_eq!(bounds.clamp(10.0, 20.0), (10.0, 20.0));
    }

    #[test]
    fn bounds_come_from_the_loaded_range() {
        let bounds = TrimBounds::of(&doc(10.0, 70.0));
        assert_eq!(bounds.total, 60.0);

        let inverted = TrimBounds::of(&doc(50.0, 20.0));
        assert_eq!(inverted.total, 0.0);
    }

    #[test]
    fn repeated_trims_keep_the_original_range() {
        let mut document = doc(0.0, 60.0);
        let bounds = TrimBounds::of(&document);

        bounds.apply(&mut document, 10.0, 20.0);
        assert_eq!((document.in_point(), document.out_point()), (10.0, 20.0));

        bounds.apply(&mut document, 0.0, 60.0);
        assert_eq!((document.in_point(), document.out_point()), (0.0, 60.0));
    }

    #[test]
    fn every_trim_satisfies_the_ordering_invariant() {
        let original = doc(5.0, 65.0);
        let bounds = TrimBounds::of(&original);
        let requests = [
            (-100.0, 1000.0),
            (59.0, 61.0),
            (30.0, 0.0),
            (0.0, 0.0),
            (f64::INFINITY, f64::NEG_INFINITY),
            (12.5, 47.25),
        ];
        for (start, end) in requests {
            let mut document = original.clone();
            bounds.apply(&mut document, start, end);
            let (ip, op) = (document.in_point(), document.out_point());
            assert!(0.0 <= ip && ip <= op && op <= 60.0, "{start}..{end} gave {ip}..{op}");
        }
    }
}
