//! Windowed-sinc FIR design matching `scipy.signal.firwin`.
//!
//! Used by the polyphase resampler to build its anti-aliasing lowpass:
//!   • cutoff      = 1 / max(up, down)           (fraction of Nyquist)
//!   • half length = 10 · max(up, down)          → N = 2·half + 1 taps
//!   • window      = Kaiser, β = 5.0
//!   • gain        = up                          (compensates zero-stuffing)
use std::f64::consts::PI;

/// Kaiser β used by `scipy.signal.resample_poly`.
pub const KAISER_BETA: f64 = 5.0;

/// Design a linear-phase lowpass FIR.
///
/// `cutoff` is the −6 dB point as a fraction of Nyquist, in `(0, 1]`.
/// `window` must have length `n` (odd). Taps are normalised to unit DC gain.
pub fn firwin(n: usize, cutoff: f64, window: &[f64]) -> Vec<f64> {
    assert!(n % 2 == 1, "firwin requires odd N for linear-phase filter");
    assert_eq!(window.len(), n, "window length must equal tap count");
    let alpha = (n - 1) as f64 / 2.0;

    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            // sin(π·fc·x) / (π·x), with the x → 0 limit fc.
            let sinc = if x == 0.0 { cutoff } else { (PI * cutoff * x).sin() / (PI * x) };
            sinc * window[i]
        })
        .collect();

    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);
    h
}

/// Kaiser window of length `n` and shape `beta`.
///
/// `w[i] = I0(β·√(1 − (2i/(n−1) − 1)²)) / I0(β)`
pub fn kaiser(n: usize, beta: f64) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let denom = bessel_i0(beta);
    (0..n)
        .map(|i| {
            let r = 2.0 * i as f64 / (n - 1) as f64 - 1.0;
            bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / denom
        })
        .collect()
}

/// Modified Bessel function of the first kind, order 0 (power series).
fn bessel_i0(x: f64) -> f64 {
    let half_sq = (x / 2.0) * (x / 2.0);
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..64 {
        term *= half_sq / (k as f64 * k as f64);
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
    }
    sum
}

/// Anti-aliasing lowpass for a rational `up/down` resampler.
///
/// Returns `2·10·max(up, down) + 1` taps scaled by `up`.
pub fn design_resample_lowpass(up: usize, down: usize) -> Vec<f64> {
    let max_rate = up.max(down);
    let half_len = 10 * max_rate;
    let n = 2 * half_len + 1;
    let win = kaiser(n, KAISER_BETA);
    let mut h = firwin(n, 1.0 / max_rate as f64, &win);
    let gain = up as f64;
    h.iter_mut().for_each(|v| *v *= gain);
    h
}
