//! Deterministic float ordering.
//!
//! Distances and color-scale values get sorted in several places; all of
//! them must agree on one total order, including for the degenerate values
//! (`-0.0`, NaN) that `PartialOrd` leaves unordered.

use core::cmp::Ordering;

/// Collapses `-0.0` into `0.0` and every NaN bit pattern into one NaN, so
/// `total_cmp` cannot distinguish values that compare equal under `==`.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Total order over `f64` for sorts and ordered keys. NaN sorts last.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}
