//! The per-recording pipeline run by one worker.
//!
//! ```text
//! annotations ─┐
//! open ── slicer offsets ── read_slice ── resample ── label ── store ──→ rows
//! ```
//!
//! Windows are produced strictly in start-offset order and only one raw
//! window is held in memory at a time.
use std::time::Instant;

use log::debug;

use crate::annotation::read_annotations;
use crate::config::WindowConfig;
use crate::error::PipelineError;
use crate::label::label_window;
use crate::manifest::ManifestRow;
use crate::recording::RecordingOpener;
use crate::resample::resample_window;
use crate::select::RecordingRef;
use crate::slicer::{window_bounds, WindowSlicer};
use crate::store::WindowStore;

/// Window, resample, label and persist one recording.
///
/// Returns the manifest rows in window-index order. On error, windows
/// already persisted are left in `store`; the caller decides whether to
/// discard them.
pub fn process_recording(
    rec: &RecordingRef,
    opener: &dyn RecordingOpener,
    store: &dyn WindowStore,
    cfg: &WindowConfig,
) -> Result<Vec<ManifestRow>, PipelineError> {
    let started = Instant::now();
    let deadline = cfg.recording_timeout();

    let ann = read_annotations(&rec.path, &cfg.annotation_ext)?;
    let raw = opener.open(&rec.path)?;

    let sfreq = raw.sfreq();
    let win_len = cfg.win_len(sfreq);
    let stride = cfg.stride(sfreq);
    if win_len == 0 || stride == 0 {
        return Err(PipelineError::InvalidWindow {
            window_sec: cfg.window_sec,
            stride_sec: cfg.stride_sec,
            sfreq,
        });
    }

    let slicer = WindowSlicer::new(raw.n_times(), win_len, stride);
    debug!(
        "{}: {} ch × {} samples @ {sfreq} Hz, {} windows, {} events",
        rec.id,
        raw.n_chan(),
        raw.n_times(),
        slicer.len(),
        ann.len()
    );

    let mut rows = Vec::with_capacity(slicer.len());
    for (idx, start) in slicer.offsets().enumerate() {
        if let Some(limit) = deadline {
            if started.elapsed() > limit {
                return Err(PipelineError::Timeout(limit.as_secs_f64()));
            }
        }

        let seg = raw.read_slice(start, start + win_len)?;
        let window = resample_window(&seg, sfreq, cfg.target_sfreq, cfg.decim_tolerance)?;
        let filepath = store.store(&rec.id, idx, &window)?;

        let (w0, w1) = window_bounds(start, win_len, sfreq);
        rows.push(ManifestRow {
            filepath,
            label: label_window(w0, w1, &ann),
            recording: rec.id.clone(),
            start: w0,
            end: w1,
        });
    }
    Ok(rows)
}
