//! # exg-window: sliding-window dataset builder for EEG recordings
//!
//! `exg-window` turns a directory of EDF recordings with seizure annotation
//! side-files into a labelled dataset of fixed-length windows, all resampled
//! to one target rate, plus a CSV manifest. Recordings are processed in
//! parallel and a failure in one recording never aborts the batch.
//!
//! ## Pipeline overview
//!
//! ```text
//! edf_dir/**/*.edf  (+ sibling *.seizures)
//!   │
//!   ├─ select::discover_recordings()   recursive scan, sorted
//!   ├─ select::select_by_annotations() positives first, ≤ N per class, unique ids
//!   │
//!   ├─ dispatch::dispatch()            bounded worker pool, per-recording isolation
//!   │    └─ pipeline::process_recording()
//!   │         ├─ edf::open_raw()        native EDF/EDF+ reader, lazy slices
//!   │         ├─ slicer                 4 s windows, 1 s stride (source rate)
//!   │         ├─ resample               decimate or polyphase → 200 Hz
//!   │         ├─ label                  1 if the window overlaps an event
//!   │         └─ store                  <out>/<id>/<idx>.safetensors  [C, T] f32
//!   │
//!   └─ manifest::write_manifest()      filepath,label,recording,start,end
//!
//! consumer: dataset::WindowDataset     get(i) → ([64, 800] f32, label)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use exg_window::{make_windows, WindowConfig};
//! use std::path::Path;
//!
//! let cfg = WindowConfig::default();
//! let summary = make_windows(
//!     Path::new("data/raw"),
//!     Path::new("data/processed"),
//!     Path::new("metadata.csv"),
//!     &cfg,
//! ).unwrap();
//! println!("{} windows from {} recordings", summary.report.windows(), summary.report.processed);
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use exg_window::recording::Recording;
//! use exg_window::{edf, resample_window, WindowConfig, WindowSlicer};
//!
//! let cfg = WindowConfig::default();
//! let raw = edf::open_raw("data/raw/chb01_03.edf").unwrap();
//! let win_len = cfg.win_len(raw.sfreq());
//! let slicer = WindowSlicer::new(raw.n_times(), win_len, cfg.stride(raw.sfreq()));
//! for start in slicer.offsets().take(3) {
//!     let seg = raw.read_slice(start, start + win_len).unwrap();
//!     let w = resample_window(&seg, raw.sfreq(), cfg.target_sfreq, cfg.decim_tolerance).unwrap();
//!     println!("window @ {start}: {:?}", w.dim());
//! }
//! ```

pub mod annotation;
pub mod config;
pub mod dataset;
pub mod dispatch;
pub mod edf;
pub mod error;
pub mod filter;
pub mod label;
pub mod manifest;
pub mod normalize;
pub mod pipeline;
pub mod recording;
pub mod resample;
pub mod select;
pub mod slicer;
pub mod store;

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config / errors
pub use config::WindowConfig;
pub use error::{
    AnnotationError, ConfigError, FailureKind, ManifestError, PersistError, PipelineError,
    RecordingReadError, ResampleError,
};

// annotations + labelling
pub use annotation::{read_annotations, AnnotationSet, Interval};
pub use label::{label_window, overlaps_any};

// recordings
pub use edf::{open_raw, EdfOpener, RawEdf};
pub use recording::{MemoryOpener, MemoryRecording, Recording, RecordingOpener};

// windowing + resampling
pub use resample::{decimate, final_length, rational_approx, resample_poly, resample_window};
pub use slicer::{window_bounds, WindowSlicer};

// persistence
pub use manifest::{read_manifest, write_manifest, ManifestRow};
pub use store::{MemoryStore, SafetensorsStore, WindowStore};

// orchestration
pub use dataset::WindowDataset;
pub use dispatch::{dispatch, DispatchReport, Failure};
pub use normalize::fix_channels;
pub use pipeline::process_recording;
pub use select::{discover_recordings, select_batch, select_by_annotations, Batch, RecordingRef};

/// Result of a [`make_windows`] run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Recordings found under the input directory.
    pub discovered: usize,
    /// Positive and negative recordings submitted to the workers.
    pub positive: usize,
    pub negative: usize,
    pub report: DispatchReport,
}

/// Build the windowed dataset for every EDF recording under `edf_dir`.
///
/// Windows go to `out_dir/<recording_id>/<index>.safetensors`, the manifest
/// to `meta_csv`. Failed recordings are listed in the returned report.
///
/// # Errors
///
/// * `cfg` is invalid.
/// * `edf_dir` is missing or holds no recording.
/// * No recording is selected, or none of the selected ones succeeds.
/// * The manifest cannot be written.
pub fn make_windows(edf_dir: &Path, out_dir: &Path, meta_csv: &Path, cfg: &WindowConfig) -> Result<RunSummary> {
    cfg.validate()?;

    let pool = discover_recordings(edf_dir, &cfg.recording_ext)
        .with_context(|| format!("scanning {}", edf_dir.display()))?;
    if pool.is_empty() {
        bail!("no .{} recordings under {}", cfg.recording_ext, edf_dir.display());
    }

    let batch = select_by_annotations(&pool, &cfg.annotation_ext, cfg.max_per_class);
    if batch.is_empty() {
        bail!("no recordings selected from {} candidates", pool.len());
    }
    let (positive, negative) = (batch.positive.len(), batch.negative.len());
    info!(
        "{} recordings found, {positive} positive + {negative} negative selected, {} workers",
        pool.len(),
        cfg.workers
    );

    let store = SafetensorsStore::new(out_dir);
    let report = dispatch(batch.into_recordings(), &EdfOpener, &store, cfg);

    if report.processed == 0 {
        bail!("none of the {} selected recordings could be processed", positive + negative);
    }
    write_manifest(meta_csv, &report.rows)?;
    info!("wrote {} rows to {}", report.rows.len(), meta_csv.display());

    Ok(RunSummary { discovered: pool.len(), positive, negative, report })
}
