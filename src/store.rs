//! Window storage.
//!
//! Every window is persisted exactly once through a [`WindowStore`] and
//! addressed afterwards by the key the store returned (the manifest's
//! `filepath` column).
//!
//! - [`SafetensorsStore`] writes one file per window,
//!   `<root>/<recording_id>/<index>.safetensors`, holding a single F32 tensor
//!   `window` of shape `[C, T]`.
//! - [`MemoryStore`] keeps windows in memory (tests, dry runs).
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ndarray::Array2;

use crate::error::PersistError;

/// Name of the tensor inside each window file.
pub const TENSOR_NAME: &str = "window";

/// Persistence backend for windows.
pub trait WindowStore: Send + Sync {
    /// Persist window `index` of `recording_id`; returns its key.
    fn store(&self, recording_id: &str, index: usize, window: &Array2<f32>) -> Result<String, PersistError>;

    /// Load a window previously returned by [`store`](Self::store).
    fn load(&self, key: &str) -> Result<Array2<f32>, PersistError>;

    /// Best-effort removal of everything stored for `recording_id`.
    fn discard(&self, recording_id: &str) -> Result<(), PersistError>;
}

// ── Safetensors files ─────────────────────────────────────────────────────

/// One safetensors file per window under `root`.
#[derive(Debug, Clone)]
pub struct SafetensorsStore {
    root: PathBuf,
}

impl SafetensorsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path of window `index` of `recording_id`.
    pub fn window_path(&self, recording_id: &str, index: usize) -> PathBuf {
        self.root.join(recording_id).join(format!("{index}.safetensors"))
    }
}

impl WindowStore for SafetensorsStore {
    fn store(&self, recording_id: &str, index: usize, window: &Array2<f32>) -> Result<String, PersistError> {
        let path = self.window_path(recording_id, index);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| PersistError::Io { path: dir.to_path_buf(), source })?;
        }
        write_window(&path, window)?;
        Ok(path.to_string_lossy().into_owned())
    }

    fn load(&self, key: &str) -> Result<Array2<f32>, PersistError> {
        read_window(Path::new(key))
    }

    fn discard(&self, recording_id: &str) -> Result<(), PersistError> {
        let dir = self.root.join(recording_id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistError::Io { path: dir, source }),
        }
    }
}

/// Write `window` as a single-tensor safetensors file.
pub fn write_window(path: &Path, window: &Array2<f32>) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io { path: path.to_path_buf(), source };

    let data: Vec<u8> = window.iter().flat_map(|v| v.to_le_bytes()).collect();
    let mut header_map = serde_json::Map::new();
    header_map.insert(TENSOR_NAME.into(), serde_json::json!({
        "dtype": "F32",
        "shape": [window.nrows(), window.ncols()],
        "data_offsets": [0, data.len()],
    }));
    let hdr_bytes = serde_json::to_vec(&header_map).map_err(|e| PersistError::Format {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let pad = (8 - hdr_bytes.len() % 8) % 8;
    let padded: Vec<u8> = hdr_bytes
        .into_iter()
        .chain(std::iter::repeat(b' ').take(pad))
        .collect();

    let mut f = std::io::BufWriter::new(std::fs::File::create(path).map_err(io_err)?);
    f.write_all(&(padded.len() as u64).to_le_bytes()).map_err(io_err)?;
    f.write_all(&padded).map_err(io_err)?;
    f.write_all(&data).map_err(io_err)?;
    f.flush().map_err(io_err)
}

/// Read the `window` tensor back from a file written by [`write_window`].
pub fn read_window(path: &Path) -> Result<Array2<f32>, PersistError> {
    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => PersistError::NotFound(path.display().to_string()),
        _ => PersistError::Io { path: path.to_path_buf(), source },
    })?;
    decode_window(&bytes).map_err(|message| PersistError::Format {
        path: path.display().to_string(),
        message,
    })
}

fn decode_window(bytes: &[u8]) -> Result<Array2<f32>, String> {
    if bytes.len() < 8 {
        return Err("safetensors file too small".into());
    }
    let mut n_bytes = [0u8; 8];
    n_bytes.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(n_bytes) as usize;
    let data_start = 8usize
        .checked_add(n)
        .filter(|&e| e <= bytes.len())
        .ok_or("header length exceeds file size")?;
    let header: serde_json::Value = serde_json::from_slice(&bytes[8..data_start])
        .map_err(|e| format!("failed to parse safetensors header: {e}"))?;

    let entry = header.get(TENSOR_NAME).ok_or("missing 'window' tensor")?;
    if entry["dtype"].as_str() != Some("F32") {
        return Err(format!("expected F32 tensor, got {}", entry["dtype"]));
    }
    let dims: Vec<usize> = entry["shape"]
        .as_array()
        .ok_or("missing shape")?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize))
        .collect::<Option<_>>()
        .ok_or("non-integer shape")?;
    let &[rows, cols] = dims.as_slice() else {
        return Err(format!("expected 2-D tensor, got shape {dims:?}"));
    };
    let offsets: Vec<usize> = entry["data_offsets"]
        .as_array()
        .ok_or("missing data_offsets")?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize))
        .collect::<Option<_>>()
        .ok_or("non-integer data_offsets")?;
    let &[s, e] = offsets.as_slice() else {
        return Err("data_offsets must have two entries".into());
    };
    let raw = bytes
        .get(data_start + s..data_start + e)
        .ok_or("tensor data out of bounds")?;
    if raw.len() != rows * cols * 4 {
        return Err(format!("{} data bytes for shape [{rows}, {cols}]", raw.len()));
    }
    let floats: Vec<f32> = raw
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Array2::from_shape_vec((rows, cols), floats).map_err(|e| e.to_string())
}

// ── In-memory ──────────────────────────────────────────────────────────────

/// Windows kept in a mutex-guarded map, keyed `"<recording_id>/<index>"`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    windows: Mutex<BTreeMap<String, Array2<f32>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of windows currently stored.
    pub fn len(&self) -> usize {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }
}

impl WindowStore for MemoryStore {
    fn store(&self, recording_id: &str, index: usize, window: &Array2<f32>) -> Result<String, PersistError> {
        let key = format!("{recording_id}/{index}");
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), window.clone());
        Ok(key)
    }

    fn load(&self, key: &str) -> Result<Array2<f32>, PersistError> {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| PersistError::NotFound(key.to_string()))
    }

    fn discard(&self, recording_id: &str) -> Result<(), PersistError> {
        let prefix = format!("{recording_id}/");
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }
}
