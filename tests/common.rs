/// Shared helpers for building synthetic recording directories.
use exg_window::edf::write_edf;
use exg_window::WindowConfig;
use ndarray::Array2;
use std::path::{Path, PathBuf};

#[allow(unused)]
/// `[n_ch, secs × sfreq]` sines in µV, a different frequency per channel.
pub fn sine_uv(n_ch: usize, secs: usize, sfreq: usize) -> Array2<f64> {
    let n_t = secs * sfreq;
    Array2::from_shape_fn((n_ch, n_t), |(c, t)| {
        let f = 2.0 + 3.0 * c as f64;
        40.0 * (2.0 * std::f64::consts::PI * f * t as f64 / sfreq as f64).sin()
    })
}

#[allow(unused)]
/// Write `dir/<name>.edf` holding `secs` seconds of `n_ch` channels.
pub fn write_recording(dir: &Path, name: &str, n_ch: usize, secs: usize, sfreq: usize) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(format!("{name}.edf"));
    write_edf(&path, &sine_uv(n_ch, secs, sfreq), sfreq, "uV").unwrap();
    path
}

#[allow(unused)]
/// Write the `.seizures` side-file of `recording`.
pub fn write_seizures(recording: &Path, events: &[(f64, f64)]) -> PathBuf {
    let path = recording.with_extension("seizures");
    let text: String = events.iter().map(|(s, e)| format!("{s} {e}\n")).collect();
    std::fs::write(&path, text).unwrap();
    path
}

#[allow(unused)]
pub fn cfg(workers: usize) -> WindowConfig {
    WindowConfig { workers, ..WindowConfig::default() }
}
