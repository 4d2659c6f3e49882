//! Half-open time interval `[start, end)` in seconds.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnnotationError;

/// A non-empty time range. Construction validates that both bounds are finite,
/// non-negative and ordered, so every `Segment` in circulation has positive duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawSegment")]
pub struct Segment {
    start: f64,
    end: f64,
}

#[derive(Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
}

impl TryFrom<RawSegment> for Segment {
    type Error = AnnotationError;

    fn try_from(raw: RawSegment) -> Result<Self, Self::Error> {
        Segment::new(raw.start, raw.end)
    }
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Result<Self, AnnotationError> {
        let valid = start.is_finite() && end.is_finite() && start >= 0.0 && start < end;
        if !valid {
            return Err(AnnotationError::InvalidSegment { start, end });
        }
        // -0.0 + 0.0 == +0.0, keeps total ordering consistent with equality
        Ok(Self {
            start: start + 0.0,
            end,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True when the two ranges share a positive-measure intersection.
    /// Segments that merely touch (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Common part of two overlapping segments.
    pub fn intersection(&self, other: &Segment) -> Option<Segment> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Segment {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Segment {}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .total_cmp(&other.start)
            .then_with(|| self.end.total_cmp(&other.end))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}, {:.3})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_negative_and_non_finite() {
        assert!(Segment::new(1.0, 1.0).is_err());
        assert!(Segment::new(2.0, 1.0).is_err());
        assert!(Segment::new(-0.5, 1.0).is_err());
        assert!(Segment::new(0.0, f64::INFINITY).is_err());
        assert!(Segment::new(f64::NAN, 1.0).is_err());
        assert!(Segment::new(0.0, 0.001).is_ok());
    }

    #[test]
    fn touching_segments_do_not_overlap() {
        let a = Segment::new(0.0, 5.0).unwrap();
        let b = Segment::new(5.0, 6.0).unwrap();
        let c = Segment::new(4.999, 6.0).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn intersection_of_nested_segments() {
        let outer = Segment::new(0.0, 10.0).unwrap();
        let inner = Segment::new(2.0, 3.0).unwrap();
        assert_eq!(outer.intersection(&inner), Some(inner));
        assert_eq!(inner.intersection(&Segment::new(3.0, 4.0).unwrap()), None);
    }

    #[test]
    fn negative_zero_equals_zero() {
        let a = Segment::new(-0.0, 1.0).unwrap();
        let b = Segment::new(0.0, 1.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn deserialize_validates_bounds() {
        let ok: Segment = serde_json::from_str(r#"{"start": 1.5, "end": 2.0}"#).unwrap();
        assert_eq!(ok.start(), 1.5);
        let bad = serde_json::from_str::<Segment>(r#"{"start": 3.0, "end": 2.0}"#);
        assert!(bad.is_err());
    }
}
