//! Windowing configuration.
//!
//! [`WindowConfig`] holds every tunable parameter of the windowing pipeline.
//! It is threaded explicitly through the slicer, resampler, dispatcher and
//! dataset so that alternate parameters can be used side by side (e.g. in
//! tests) without touching any process-wide state.
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for the windowing pipeline.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use exg_window::WindowConfig;
///
/// let cfg = WindowConfig {
///     window_sec: 10.0,   // 10 s windows instead of 4
///     stride_sec: 5.0,    // 50 % overlap
///     ..WindowConfig::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
///
/// Or just call [`WindowConfig::default()`] for the training settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Duration of each window in seconds.
    ///
    /// Converted to samples at the *source* rate of each recording
    /// (`floor(window_sec × src_sfreq)`) before resampling, so every window
    /// spans exactly the same wall-clock time regardless of native rate.
    ///
    /// Default: `4.0` s.
    pub window_sec: f64,

    /// Distance between consecutive window starts in seconds.
    ///
    /// Must not exceed [`window_sec`](Self::window_sec); smaller values make
    /// windows overlap by `window_sec − stride_sec`.
    ///
    /// Default: `1.0` s.
    pub stride_sec: f64,

    /// Sampling rate in Hz of every persisted window.
    ///
    /// Default: `200.0` Hz.
    pub target_sfreq: f64,

    /// Channel count windows are padded/truncated to at load time.
    ///
    /// Default: `64`.
    pub n_channels: usize,

    /// Maximum number of recordings taken from each of the positive and
    /// negative partitions.
    ///
    /// Default: `20`.
    pub max_per_class: usize,

    /// Number of worker threads, i.e. recordings in flight at once.
    ///
    /// Each worker holds one window's worth of raw samples plus the
    /// resampled copy, so this is bounded by memory rather than cores.
    ///
    /// Default: `min(4, available_parallelism)`.
    pub workers: usize,

    /// File extension of raw recordings (without the dot).
    ///
    /// Default: `"edf"`.
    pub recording_ext: String,

    /// Extension of the companion annotation file (without the dot).
    /// `chb01_03.edf` is annotated by `chb01_03.seizures`.
    ///
    /// Default: `"seizures"`.
    pub annotation_ext: String,

    /// Tolerance under which `src / target` is treated as an integer ratio
    /// and the segment is decimated instead of polyphase-resampled.
    ///
    /// Default: `1e-3`.
    pub decim_tolerance: f64,

    /// Optional per-recording deadline in seconds.
    ///
    /// Checked between windows; a recording exceeding it is abandoned and
    /// reported as a timeout.
    ///
    /// Default: `None` (no deadline).
    pub recording_timeout_secs: Option<f64>,
}

impl Default for WindowConfig {
    /// Returns the training configuration:
    /// 4 s windows · 1 s stride · 200 Hz · 64 channels · 20 recordings per class.
    fn default() -> Self {
        Self {
            window_sec: 4.0,
            stride_sec: 1.0,
            target_sfreq: 200.0,
            n_channels: 64,
            max_per_class: 20,
            workers: default_workers(),
            recording_ext: "edf".into(),
            annotation_ext: "seizures".into(),
            decim_tolerance: 1e-3,
            recording_timeout_secs: None,
        }
    }
}

impl WindowConfig {
    /// Load a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants every component relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &'static str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid { field: name, reason: format!("must be > 0, got {v}") })
            }
        };
        positive("window_sec", self.window_sec)?;
        positive("stride_sec", self.stride_sec)?;
        positive("target_sfreq", self.target_sfreq)?;
        if self.stride_sec > self.window_sec {
            return Err(ConfigError::Invalid {
                field: "stride_sec",
                reason: format!(
                    "stride ({} s) exceeds window length ({} s)",
                    self.stride_sec, self.window_sec
                ),
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid { field: "workers", reason: "must be ≥ 1".into() });
        }
        if self.n_channels == 0 {
            return Err(ConfigError::Invalid { field: "n_channels", reason: "must be ≥ 1".into() });
        }
        if self.max_per_class == 0 {
            return Err(ConfigError::Invalid { field: "max_per_class", reason: "must be ≥ 1".into() });
        }
        if let Some(t) = self.recording_timeout_secs {
            positive("recording_timeout_secs", t)?;
        }
        Ok(())
    }

    /// Window length in samples at `src_sfreq`: `floor(window_sec × src_sfreq)`.
    ///
    /// ```
    /// use exg_window::WindowConfig;
    /// let cfg = WindowConfig::default();
    /// assert_eq!(cfg.win_len(256.0), 1024);
    /// ```
    pub fn win_len(&self, src_sfreq: f64) -> usize {
        (self.window_sec * src_sfreq) as usize
    }

    /// Stride in samples at `src_sfreq`: `floor(stride_sec × src_sfreq)`.
    pub fn stride(&self, src_sfreq: f64) -> usize {
        (self.stride_sec * src_sfreq) as usize
    }

    /// Per-recording deadline as a [`Duration`], if configured.
    pub fn recording_timeout(&self) -> Option<Duration> {
        self.recording_timeout_secs.map(Duration::from_secs_f64)
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(4)
}
