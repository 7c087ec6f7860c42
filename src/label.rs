//! Binary window labels from annotation overlap.
//!
//! A window `[w0, w1)` is positive iff some event `(s, e)` satisfies
//! `w0 < e && w1 > s`. Strict inequalities: an event that only touches the
//! window at an endpoint does not count.
use crate::annotation::AnnotationSet;

/// `true` if `[w0, w1)` strictly overlaps any interval in `ann`.
pub fn overlaps_any(w0: f64, w1: f64, ann: &AnnotationSet) -> bool {
    ann.intervals().iter().any(|iv| w0 < iv.end && w1 > iv.start)
}

/// Label for a window: `1` if it overlaps an event, else `0`.
pub fn label_window(w0: f64, w1: f64, ann: &AnnotationSet) -> u8 {
    u8::from(overlaps_any(w0, w1, ann))
}
