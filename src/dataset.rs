//! Read side of the manifest: indexed access to labelled windows.
//!
//! ```no_run
//! use std::path::Path;
//! use exg_window::{SafetensorsStore, WindowDataset};
//!
//! let store = SafetensorsStore::new("data/processed");
//! let ds = WindowDataset::open(Path::new("metadata.csv"), 1.0, 64, store).unwrap();
//! let (x, y) = ds.get(0).unwrap(); // x: [64, 800] f32, y: 0.0 | 1.0
//! ```
use std::path::Path;

use ndarray::Array2;

use crate::error::{ManifestError, PersistError};
use crate::manifest::{read_manifest, ManifestRow};
use crate::normalize::fix_channels;
use crate::store::WindowStore;

/// Manifest rows plus the store their windows live in.
#[derive(Debug)]
pub struct WindowDataset<S> {
    rows: Vec<ManifestRow>,
    n_channels: usize,
    store: S,
}

impl<S: WindowStore> WindowDataset<S> {
    /// Load the manifest at `path`.
    ///
    /// With `subset_frac < 1` only the first `floor(len × subset_frac)` rows
    /// are kept.
    pub fn open(path: &Path, subset_frac: f64, n_channels: usize, store: S) -> Result<Self, ManifestError> {
        Ok(Self::from_rows(read_manifest(path)?, subset_frac, n_channels, store))
    }

    pub fn from_rows(mut rows: Vec<ManifestRow>, subset_frac: f64, n_channels: usize, store: S) -> Self {
        if subset_frac < 1.0 {
            let keep = (rows.len() as f64 * subset_frac.max(0.0)).floor() as usize;
            rows.truncate(keep);
        }
        Self { rows, n_channels, store }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    /// Window `i` as `[n_channels, T]` and its label as `0.0` / `1.0`.
    pub fn get(&self, i: usize) -> Result<(Array2<f32>, f32), PersistError> {
        let row = self
            .rows
            .get(i)
            .ok_or_else(|| PersistError::NotFound(format!("row {i} of {}", self.rows.len())))?;
        let window = self.store.load(&row.filepath)?;
        Ok((fix_channels(window, self.n_channels), f32::from(row.label)))
    }

    pub fn labels(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.label).collect()
    }

    pub fn positive_count(&self) -> usize {
        self.rows.iter().filter(|r| r.label == 1).count()
    }
}
