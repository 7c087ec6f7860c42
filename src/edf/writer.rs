//! Minimal EDF writer.
//!
//! Writes 16-bit EDF with one-second data records and a per-channel physical
//! range taken from the data. Used to build fixtures for the reader and the
//! pipeline; it does not write EDF+ annotations.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::Array2;

use super::header::BLOCK_BYTES;

const DIGITAL_MIN: i32 = -32768;
const DIGITAL_MAX: i32 = 32767;

/// Write `data` (`[C, T]`, physical units `dimension`) at integer `sfreq`.
///
/// The last record is zero-padded (in physical units) when `T` is not a
/// multiple of `sfreq`.
pub fn write_edf(path: &Path, data: &Array2<f64>, sfreq: usize, dimension: &str) -> std::io::Result<()> {
    if sfreq == 0 {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "sfreq must be > 0"));
    }
    let (n_ch, n_t) = data.dim();
    let n_records = n_t.div_ceil(sfreq);

    // Physical range per channel, widened so zero padding and flat channels
    // stay representable.
    let ranges: Vec<(String, String)> = data
        .rows()
        .into_iter()
        .map(|row| {
            let lo = row.iter().copied().fold(0.0_f64, f64::min);
            let hi = row.iter().copied().fold(0.0_f64, f64::max);
            let (lo, hi) = if hi - lo < 1e-12 { (lo - 1.0, hi + 1.0) } else { (lo, hi) };
            (format_physical(lo, false), format_physical(hi, true))
        })
        .collect();

    let mut w = BufWriter::new(File::create(path)?);

    field(&mut w, "0", 8)?;
    field(&mut w, "X X X X", 80)?;
    field(&mut w, "Startdate X X X X", 80)?;
    field(&mut w, "01.01.00", 8)?;
    field(&mut w, "00.00.00", 8)?;
    field(&mut w, &(BLOCK_BYTES * (n_ch + 1)).to_string(), 8)?;
    field(&mut w, "", 44)?;
    field(&mut w, &n_records.to_string(), 8)?;
    field(&mut w, "1", 8)?;
    field(&mut w, &n_ch.to_string(), 4)?;

    for c in 0..n_ch {
        field(&mut w, &format!("EEG {c}"), 16)?;
    }
    for _ in 0..n_ch {
        field(&mut w, "", 80)?;
    }
    for _ in 0..n_ch {
        field(&mut w, dimension, 8)?;
    }
    for (lo, _) in &ranges {
        field(&mut w, lo, 8)?;
    }
    for (_, hi) in &ranges {
        field(&mut w, hi, 8)?;
    }
    for _ in 0..n_ch {
        field(&mut w, &DIGITAL_MIN.to_string(), 8)?;
    }
    for _ in 0..n_ch {
        field(&mut w, &DIGITAL_MAX.to_string(), 8)?;
    }
    for _ in 0..n_ch {
        field(&mut w, "", 80)?;
    }
    for _ in 0..n_ch {
        field(&mut w, &sfreq.to_string(), 8)?;
    }
    for _ in 0..n_ch {
        field(&mut w, "", 32)?;
    }

    // Encode against the range as written, so decoding is its exact inverse.
    let cals: Vec<(f64, f64)> = ranges
        .iter()
        .map(|(lo, hi)| {
            let lo: f64 = lo.parse().unwrap_or(0.0);
            let hi: f64 = hi.parse().unwrap_or(1.0);
            (lo, (hi - lo) / (DIGITAL_MAX - DIGITAL_MIN) as f64)
        })
        .collect();

    for r in 0..n_records {
        for (c, &(lo, gain)) in cals.iter().enumerate() {
            for k in 0..sfreq {
                let t = r * sfreq + k;
                let v = if t < n_t { data[[c, t]] } else { 0.0 };
                let d = ((v - lo) / gain + DIGITAL_MIN as f64).round();
                let d = d.clamp(DIGITAL_MIN as f64, DIGITAL_MAX as f64) as i16;
                w.write_all(&d.to_le_bytes())?;
            }
        }
    }
    w.flush()
}

fn field(w: &mut BufWriter<File>, s: &str, width: usize) -> std::io::Result<()> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.truncate(width);
    bytes.resize(width, b' ');
    w.write_all(&bytes)
}

/// Format a physical extreme in at most 8 characters, rounding away from the
/// data (`up` for maxima) so every sample stays inside the range.
fn format_physical(v: f64, up: bool) -> String {
    for prec in (0..=6).rev() {
        let scale = 10f64.powi(prec as i32);
        let r = (if up { (v * scale).ceil() } else { (v * scale).floor() }) / scale;
        let s = format!("{r:.prec$}");
        if s.len() <= 8 {
            return s;
        }
    }
    let r = if up { v.ceil() } else { v.floor() };
    format!("{}", r as i64)
}
