//! Recording access.
//!
//! The pipeline never loads a whole recording: it asks a [`Recording`] for
//! one window's sample range at a time. [`RecordingOpener`] resolves a path
//! to a recording; [`EdfOpener`](crate::edf::EdfOpener) is the production
//! implementation and [`MemoryOpener`] backs tests.
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use ndarray::{s, Array2};

use crate::error::RecordingReadError;

/// A multi-channel recording that can be read in arbitrary sample ranges.
pub trait Recording {
    /// Native sampling rate in Hz.
    fn sfreq(&self) -> f64;

    /// Number of data channels.
    fn n_chan(&self) -> usize;

    /// Number of samples per channel.
    fn n_times(&self) -> usize;

    /// Read the half-open sample range `[start, end)` as `[n_chan, end − start]`
    /// in physical units.
    fn read_slice(&self, start: usize, end: usize) -> Result<Array2<f64>, RecordingReadError>;

    /// Duration in seconds.
    fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.sfreq()
    }
}

/// Opens recordings by path. Shared by all workers.
pub trait RecordingOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn Recording>, RecordingReadError>;
}

// ── In-memory recordings ───────────────────────────────────────────────────

/// A recording held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryRecording {
    path: PathBuf,
    data: Array2<f64>,
    sfreq: f64,
    /// Reads touching samples at or beyond this index fail.
    read_limit: Option<usize>,
}

impl MemoryRecording {
    pub fn new(path: impl Into<PathBuf>, data: Array2<f64>, sfreq: f64) -> Self {
        Self { path: path.into(), data, sfreq, read_limit: None }
    }

    /// Make reads past `limit` samples fail, simulating a file that is
    /// truncated or corrupt part-way through.
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit);
        self
    }
}

impl Recording for MemoryRecording {
    fn sfreq(&self) -> f64 {
        self.sfreq
    }

    fn n_chan(&self) -> usize {
        self.data.nrows()
    }

    fn n_times(&self) -> usize {
        self.data.ncols()
    }

    fn read_slice(&self, start: usize, end: usize) -> Result<Array2<f64>, RecordingReadError> {
        let limit = self.read_limit.unwrap_or(usize::MAX).min(self.n_times());
        if start > end || end > limit {
            return Err(RecordingReadError::new(
                &self.path,
                format!("sample range {start}..{end} out of bounds ({limit} readable)"),
            ));
        }
        Ok(self.data.slice(s![.., start..end]).to_owned())
    }
}

/// Opener over a fixed set of in-memory recordings.
///
/// Unknown paths, and paths registered with [`fail`](Self::fail), fail to
/// open with a [`RecordingReadError`].
#[derive(Debug, Default)]
pub struct MemoryOpener {
    recordings: HashMap<PathBuf, MemoryRecording>,
    failing: HashSet<PathBuf>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, recording: MemoryRecording) -> &mut Self {
        self.recordings.insert(recording.path.clone(), recording);
        self
    }

    pub fn fail(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.failing.insert(path.into());
        self
    }
}

impl RecordingOpener for MemoryOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn Recording>, RecordingReadError> {
        if self.failing.contains(path) {
            return Err(RecordingReadError::new(path, "unreadable recording"));
        }
        self.recordings
            .get(path)
            .map(|r| Box::new(r.clone()) as Box<dyn Recording>)
            .ok_or_else(|| RecordingReadError::new(path, "no such recording"))
    }
}
