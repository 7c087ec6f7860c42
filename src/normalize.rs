//! Channel-count normalisation applied when a window is loaded.
//!
//! Recordings carry different montages, so persisted windows keep their
//! native channel count. Consumers need a fixed `[C_target, T]` shape:
//!
//! ```text
//! C == C_target   → unchanged
//! C <  C_target   → zero rows appended after the existing channels
//! C >  C_target   → first C_target rows kept, tail channels dropped
//! ```
use ndarray::{s, Array2};

/// Pad with zero rows or truncate trailing rows so `x` has `n_channels` rows.
pub fn fix_channels(x: Array2<f32>, n_channels: usize) -> Array2<f32> {
    let (c, t) = x.dim();
    if c == n_channels {
        return x;
    }
    if c > n_channels {
        return x.slice(s![..n_channels, ..]).to_owned();
    }
    let mut out = Array2::<f32>::zeros((n_channels, t));
    out.slice_mut(s![..c, ..]).assign(&x);
    out
}
