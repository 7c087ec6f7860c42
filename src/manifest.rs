//! Manifest CSV.
//!
//! ```text
//! filepath,label,recording,start,end
//! data/processed/chb01_03/0.safetensors,0,chb01_03,0.0,4.0
//! data/processed/chb01_03/1.safetensors,1,chb01_03,1.0,5.0
//! ```
//!
//! `start`/`end` are seconds from the beginning of the recording, written
//! with the shortest representation that round-trips the `f64`.
//!
//! The manifest is written to a sibling temporary file and renamed into
//! place, so a failed run never leaves a truncated manifest at the target
//! path.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Column names, in order.
pub const HEADER: [&str; 5] = ["filepath", "label", "recording", "start", "end"];

/// One persisted window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRow {
    /// Store key of the window (a file path for file-backed stores).
    pub filepath: String,
    /// `1` if the window overlaps an annotated event.
    pub label: u8,
    /// Identifier of the source recording.
    pub recording: String,
    /// Window start, seconds.
    pub start: f64,
    /// Window end, seconds.
    pub end: f64,
}

/// Write `rows` (header first) to `path`, replacing any existing file only
/// once the new contents are complete.
pub fn write_manifest(path: &Path, rows: &[ManifestRow]) -> Result<(), ManifestError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ManifestError::Io { path, source }
    };
    let csv_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ManifestError::Csv { path, source }
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(io_err(dir))?;
    }
    let tmp = tmp_path(path);
    let result = (|| {
        let mut w = csv::Writer::from_path(&tmp).map_err(csv_err(tmp.as_path()))?;
        if rows.is_empty() {
            // serde only emits the header alongside the first record.
            w.write_record(HEADER).map_err(csv_err(tmp.as_path()))?;
        }
        for row in rows {
            w.serialize(row).map_err(csv_err(tmp.as_path()))?;
        }
        w.flush().map_err(io_err(tmp.as_path()))?;
        std::fs::rename(&tmp, path).map_err(io_err(path))
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

/// Read a manifest written by [`write_manifest`].
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRow>, ManifestError> {
    let csv_err = |source| ManifestError::Csv { path: path.to_path_buf(), source };
    let mut r = csv::Reader::from_path(path).map_err(csv_err)?;
    r.deserialize().collect::<Result<Vec<ManifestRow>, _>>().map_err(csv_err)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
