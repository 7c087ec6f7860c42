//! Error taxonomy.
//!
//! Per-recording failures ([`PipelineError`]) are caught at the recording
//! boundary by the dispatcher and turned into a [`FailureKind`]; only
//! [`ManifestError`] is fatal to a run.
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("reading config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while reading an annotation file.
///
/// A *missing* annotation file is not an error (it yields an empty set),
/// and lines with other than two tokens are skipped.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("reading annotations {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: malformed number {token:?}")]
    Parse { path: PathBuf, line: usize, token: String },
}

/// Numeric failure inside the resampler.
#[derive(Debug, Error, PartialEq)]
pub enum ResampleError {
    #[error("invalid sampling rates: src={src} Hz, dst={dst} Hz")]
    InvalidRate { src: f64, dst: f64 },

    #[error("rational ratio {up}/{down} too large for polyphase resampling")]
    RatioTooLarge { up: usize, down: usize },

    #[error("cannot resample an empty segment")]
    EmptySegment,
}

/// The recording could not be opened or a sample range could not be read.
#[derive(Debug, Error)]
#[error("{path}: {message}")]
pub struct RecordingReadError {
    pub path: PathBuf,
    pub message: String,
    #[source]
    pub source: Option<std::io::Error>,
}

impl RecordingReadError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into(), source: None }
    }

    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>, source: std::io::Error) -> Self {
        Self { path: path.into(), message: message.into(), source: Some(source) }
    }
}

/// A window could not be written to (or read back from) storage.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {message}")]
    Format { path: String, message: String },

    #[error("no stored window at {0}")]
    NotFound(String),
}

/// Any failure that aborts the processing of one recording.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Read(#[from] RecordingReadError),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("window of {window_sec} s / stride of {stride_sec} s is zero samples at {sfreq} Hz")]
    InvalidWindow { window_sec: f64, stride_sec: f64, sfreq: f64 },

    #[error("exceeded the per-recording timeout of {0:.1} s")]
    Timeout(f64),
}

impl PipelineError {
    /// Category reported in the run summary.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Read(_) | PipelineError::InvalidWindow { .. } => FailureKind::Read,
            PipelineError::Annotation(_) => FailureKind::Parse,
            PipelineError::Resample(_) => FailureKind::Resample,
            PipelineError::Persist(_) => FailureKind::Persist,
            PipelineError::Timeout(_) => FailureKind::Timeout,
        }
    }
}

/// Why a recording was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Read,
    Parse,
    Resample,
    Persist,
    Timeout,
    Panic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Read => "read",
            FailureKind::Parse => "parse",
            FailureKind::Resample => "resample",
            FailureKind::Persist => "persist",
            FailureKind::Timeout => "timeout",
            FailureKind::Panic => "panic",
        };
        f.write_str(s)
    }
}

/// Writing the manifest failed. Fatal to the run.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("writing manifest {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoding manifest {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
