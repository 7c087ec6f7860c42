//! Recording discovery and batch selection.
//!
//! A batch is built from every recording found under a root directory:
//!
//! 1. partition into *positive* (annotation file present) and *negative*;
//! 2. sort each partition by path, drop later recordings whose identifier
//!    (file stem) was already taken, so no identifier appears twice;
//! 3. cap each partition at `max_per_class`;
//! 4. concatenate positives then negatives.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::warn;
use walkdir::WalkDir;

use crate::annotation::has_annotations;

/// A recording chosen for processing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordingRef {
    /// Identifier used for output directories and the manifest: the file stem.
    pub id: String,
    pub path: PathBuf,
}

impl RecordingRef {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = recording_id(&path);
        Self { id, path }
    }
}

/// File stem of `path` (`/data/chb01_03.edf` → `chb01_03`).
pub fn recording_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// All files under `root` whose extension is `ext` (case-insensitive), sorted.
///
/// Unreadable sub-directories are logged and skipped; a missing root is an
/// error.
pub fn discover_recordings(root: &Path, ext: &str) -> std::io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("recording root {} is not a directory", root.display()),
        ));
    }
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|x| x.to_string_lossy().eq_ignore_ascii_case(ext))
        })
        .map(|e| e.into_path())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Recordings selected for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub positive: Vec<RecordingRef>,
    pub negative: Vec<RecordingRef>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positives then negatives, the order submitted to the dispatcher.
    pub fn into_recordings(self) -> Vec<RecordingRef> {
        let mut all = self.positive;
        all.extend(self.negative);
        all
    }
}

/// Partition, de-duplicate and cap `pool`.
///
/// `is_positive` decides the partition of each path (normally "has an
/// annotation file").
pub fn select_batch<F>(pool: &[PathBuf], is_positive: F, max_per_class: usize) -> Batch
where
    F: Fn(&Path) -> bool,
{
    let mut sorted: Vec<&PathBuf> = pool.iter().collect();
    sorted.sort();
    sorted.dedup();

    let (pos, neg): (Vec<&PathBuf>, Vec<&PathBuf>) = sorted.into_iter().partition(|p| is_positive(p.as_path()));

    // Positives claim identifiers first so a recording is never counted as
    // negative through a same-named duplicate.
    let mut seen = HashSet::new();
    let mut take = |paths: Vec<&PathBuf>| -> Vec<RecordingRef> {
        let mut out = Vec::new();
        for p in paths {
            let r = RecordingRef::from_path(p.clone());
            if !seen.insert(r.id.clone()) {
                warn!("duplicate recording id {:?}, skipping {}", r.id, p.display());
                continue;
            }
            if out.len() < max_per_class {
                out.push(r);
            }
        }
        out
    };
    let positive = take(pos);
    let negative = take(neg);
    Batch { positive, negative }
}

/// [`select_batch`] with the annotation-file criterion.
pub fn select_by_annotations(pool: &[PathBuf], annotation_ext: &str, max_per_class: usize) -> Batch {
    select_batch(pool, |p| has_annotations(p, annotation_ext), max_per_class)
}
