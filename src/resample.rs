//! Per-window resampling to the target rate.
//!
//! Two paths, chosen from `ratio = round(src / dst)`:
//!
//! 1. **Decimation** when `|src/dst − ratio| < tolerance`: keep every
//!    `ratio`-th sample starting at offset 0. No filtering, so content above
//!    the new Nyquist aliases; this is accepted for the common integer-ratio
//!    rates (256 → 128, 400 → 200, 1000 → 200 …).
//! 2. **Polyphase** otherwise, matching `scipy.signal.resample_poly`
//!    (zero-padded edges):
//!      1. reduce `dst/src` to `up/down` at 1 mHz resolution; when that
//!         exceeds [`MAX_POLY_FACTOR`] (e.g. 173.61 Hz → 20000/17361), use the
//!         closest continued-fraction convergent within the limit instead;
//!      2. design a Kaiser (β = 5) lowpass at `1/max(up, down)` of Nyquist
//!         with `20·max(up, down) + 1` taps, gain `up`;
//!      3. zero-stuff by `up`, filter, keep every `down`-th output sample,
//!         centred on the filter delay.
//!
//!    Output length is `ceil(n · up / down)`.
//!
//! Resampling runs on one extracted window at a time, so peak memory is one
//! window of raw samples no matter how long the recording is.
use ndarray::Array2;

use crate::error::ResampleError;
use crate::filter::design_resample_lowpass;

/// Largest `max(up, down)` accepted by the polyphase path. The filter has
/// `20 × max + 1` taps.
pub const MAX_POLY_FACTOR: usize = 10_000;

/// Resample `seg` (`[C, T]` at `src_sfreq`) to `dst_sfreq`, returning `f32`.
///
/// `tolerance` is the distance from an integer ratio under which the segment
/// is decimated instead of filtered.
pub fn resample_window(
    seg: &Array2<f64>,
    src_sfreq: f64,
    dst_sfreq: f64,
    tolerance: f64,
) -> Result<Array2<f32>, ResampleError> {
    if !(src_sfreq.is_finite() && dst_sfreq.is_finite() && src_sfreq > 0.0 && dst_sfreq > 0.0) {
        return Err(ResampleError::InvalidRate { src: src_sfreq, dst: dst_sfreq });
    }
    if seg.ncols() == 0 {
        return Err(ResampleError::EmptySegment);
    }

    let ratio = src_sfreq / dst_sfreq;
    let decim = ratio.round();
    if decim >= 1.0 && (ratio - decim).abs() < tolerance {
        return Ok(decimate(seg, decim as usize));
    }

    let (up, down) = rational_approx(dst_sfreq, src_sfreq)
        .ok_or(ResampleError::InvalidRate { src: src_sfreq, dst: dst_sfreq })?;
    if up.max(down) > MAX_POLY_FACTOR {
        return Err(ResampleError::RatioTooLarge { up, down });
    }

    let h = design_resample_lowpass(up, down);
    let n_ch = seg.nrows();
    let n_out = final_length(seg.ncols(), up, down);
    let mut out = Array2::<f32>::zeros((n_ch, n_out));
    for ch in 0..n_ch {
        let row: Vec<f64> = seg.row(ch).to_vec();
        let resampled = resample_poly(&row, up, down, &h);
        for (dst, v) in out.row_mut(ch).iter_mut().zip(resampled) {
            *dst = v as f32;
        }
    }
    Ok(out)
}

/// Keep every `factor`-th column starting at 0 (`seg[:, ::factor]`).
pub fn decimate(seg: &Array2<f64>, factor: usize) -> Array2<f32> {
    let factor = factor.max(1);
    seg.slice(ndarray::s![.., ..;factor]).mapv(|v| v as f32)
}

/// Polyphase FIR resampling of one channel by `up/down` with taps `h`
/// (odd length, designed by [`design_resample_lowpass`]).
///
/// Equivalent to upsampling by `up`, convolving with `h`, advancing by the
/// filter's group delay and keeping every `down`-th sample, but only the
/// taps that land on non-zero input are visited.
pub fn resample_poly(x: &[f64], up: usize, down: usize, h: &[f64]) -> Vec<f64> {
    let n_in = x.len();
    if n_in == 0 {
        return vec![];
    }
    let half_len = (h.len() - 1) / 2;
    let n_out = final_length(n_in, up, down);
    let last_in = (n_in - 1) * up;

    (0..n_out)
        .map(|k| {
            // Position in the zero-stuffed, delay-compensated signal.
            let m = half_len + k * down;
            // Taps h[j] with (m - j) ≡ 0 (mod up) and 0 ≤ (m - j)/up < n_in.
            let lo = m.saturating_sub(last_in);
            let r = m % up;
            let mut j = lo + (r + up - lo % up) % up;
            let hi = h.len().min(m + 1);
            let mut acc = 0.0;
            while j < hi {
                acc += h[j] * x[(m - j) / up];
                j += up;
            }
            acc
        })
        .collect()
}

/// Compute `(up, down)` from dst/src via GCD reduction at 1 mHz resolution.
///
/// Ratios that do not reduce below [`MAX_POLY_FACTOR`] are replaced by the
/// best continued-fraction approximation of `dst / src` whose terms stay
/// within it. If even the first convergent is too large the exact pair is
/// returned unchanged.
///
/// Returns `None` when either rate rounds to zero.
pub fn rational_approx(dst: f64, src: f64) -> Option<(usize, usize)> {
    let scale = 1000.0;
    let up0 = (dst * scale).round() as usize;
    let down0 = (src * scale).round() as usize;
    if up0 == 0 || down0 == 0 {
        return None;
    }
    let g = gcd(up0, down0);
    let exact = (up0 / g, down0 / g);
    if exact.0.max(exact.1) <= MAX_POLY_FACTOR {
        return Some(exact);
    }
    Some(bounded_convergent(dst / src, MAX_POLY_FACTOR).unwrap_or(exact))
}

/// Last continued-fraction convergent `p/q` of `x` with `p, q ≤ limit`.
fn bounded_convergent(x: f64, limit: usize) -> Option<(usize, usize)> {
    let (mut h_prev, mut h) = (0usize, 1usize);
    let (mut k_prev, mut k) = (1usize, 0usize);
    let mut best = None;
    let mut rest = x;
    for _ in 0..64 {
        let a = rest.floor();
        if !a.is_finite() || a > limit as f64 {
            break;
        }
        let a = a as usize;
        let h_next = a * h + h_prev;
        let k_next = a * k + k_prev;
        if h_next > limit || k_next > limit {
            break;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);
        if h > 0 {
            best = Some((h, k));
        }
        let frac = rest - a as f64;
        if frac < 1e-12 {
            break;
        }
        rest = 1.0 / frac;
    }
    best
}

/// Polyphase output length: `ceil(n · up / down)`.
pub fn final_length(n: usize, up: usize, down: usize) -> usize {
    (n * up).div_ceil(down)
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_identity() {
        let seg = Array2::from_shape_fn((3, 800), |(c, t)| (c * 1000 + t) as f64 * 0.5);
        let out = resample_window(&seg, 200.0, 200.0, 1e-3).unwrap();
        assert_eq!(out.dim(), (3, 800));
        for (a, b) in out.iter().zip(seg.iter()) {
            assert_eq!(*a, *b as f32);
        }
    }

    #[test]
    fn integer_ratio_keeps_every_other_sample() {
        let seg = Array2::from_shape_fn((2, 1600), |(c, t)| (c * 10_000 + t) as f64);
        let out = resample_window(&seg, 400.0, 200.0, 1e-3).unwrap();
        assert_eq!(out.dim(), (2, 800));
        for t in 0..800 {
            assert_eq!(out[[1, t]], (10_000 + 2 * t) as f32);
        }
    }

    #[test]
    fn odd_length_decimation_keeps_trailing_sample() {
        // `seg[:, ::2]` semantics: 1601 samples → ceil(1601 / 2) = 801.
        let seg = Array2::from_shape_fn((1, 1601), |(_, t)| t as f64);
        let out = resample_window(&seg, 400.0, 200.0, 1e-3).unwrap();
        assert_eq!(out.ncols(), 801);
        assert_eq!(out[[0, 800]], 1600.0);
        assert_eq!(decimate(&seg, 2).ncols(), 801);
    }

    #[test]
    fn near_integer_ratio_decimates() {
        // 1000.0004 / 200 is within 1e-3 of 5.
        let seg = Array2::from_shape_fn((1, 4000), |(_, t)| t as f64);
        let out = resample_window(&seg, 1000.0004, 200.0, 1e-3).unwrap();
        assert_eq!(out.ncols(), 800);
        assert_eq!(out[[0, 1]], 5.0);
    }

    #[test]
    fn rational_approx_reduces() {
        assert_eq!(rational_approx(200.0, 256.0), Some((25, 32)));
        assert_eq!(rational_approx(200.0, 250.0), Some((4, 5)));
        assert_eq!(rational_approx(200.0, 512.0), Some((25, 64)));
        assert_eq!(rational_approx(0.0, 256.0), None);
    }

    #[test]
    fn irreducible_rate_uses_bounded_approximation() {
        // 200 / 173.61 reduces to 20000/17361 at 1 mHz.
        let (up, down) = rational_approx(200.0, 173.61).unwrap();
        assert!(up.max(down) <= MAX_POLY_FACTOR);
        approx::assert_abs_diff_eq!(up as f64 / down as f64, 200.0 / 173.61, epsilon = 1e-6);

        // floor(4 s × 173.61 Hz) = 694 samples.
        let seg = Array2::from_elem((2, 694), 1.0_f64);
        let out = resample_window(&seg, 173.61, 200.0, 1e-3).unwrap();
        assert_eq!(out.dim(), (2, 800));
    }

    #[test]
    fn extreme_ratio_rejected() {
        // 200 / 0.01 = 20000: no convergent fits under the limit.
        let seg = Array2::zeros((1, 10));
        assert!(matches!(
            resample_window(&seg, 0.01, 200.0, 1e-3),
            Err(ResampleError::RatioTooLarge { up: 20_000, down: 1 })
        ));
    }

    #[test]
    fn polyphase_length_256_to_200() {
        let seg = Array2::zeros((4, 1024));
        let out = resample_window(&seg, 256.0, 200.0, 1e-3).unwrap();
        assert_eq!(out.dim(), (4, 800));
    }

    #[test]
    fn polyphase_preserves_dc_in_interior() {
        let seg = Array2::from_elem((1, 1024), 3.0_f64);
        let out = resample_window(&seg, 256.0, 200.0, 1e-3).unwrap();
        // Zero-padded edges droop over roughly half a filter length.
        for &v in out.slice(ndarray::s![0, 200..600]).iter() {
            approx::assert_abs_diff_eq!(v, 3.0, epsilon = 3e-2);
        }
    }

    #[test]
    fn polyphase_upsampling_length() {
        // 128 → 200 Hz: up/down = 25/16
        let seg = Array2::zeros((1, 512));
        let out = resample_window(&seg, 128.0, 200.0, 1e-3).unwrap();
        assert_eq!(out.ncols(), 800);
    }

    #[test]
    fn invalid_rates_rejected() {
        let seg = Array2::zeros((1, 10));
        assert!(matches!(
            resample_window(&seg, 0.0, 200.0, 1e-3),
            Err(ResampleError::InvalidRate { .. })
        ));
        assert!(matches!(
            resample_window(&seg, f64::NAN, 200.0, 1e-3),
            Err(ResampleError::InvalidRate { .. })
        ));
    }

    #[test]
    fn empty_segment_rejected() {
        let seg = Array2::<f64>::zeros((2, 0));
        assert_eq!(resample_window(&seg, 256.0, 200.0, 1e-3), Err(ResampleError::EmptySegment));
    }
}
