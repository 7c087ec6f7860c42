//! Event annotations for one recording.
//!
//! Every recording `x.edf` may have a companion text file `x.seizures` with
//! one event per line:
//!
//! ```text
//! <start_sec> <end_sec>
//! ```
//!
//! A missing file means "no events". Lines that do not split into exactly
//! two whitespace-separated tokens (blank lines, headers, comments) are
//! skipped; a two-token line whose tokens are not numbers is an error.
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::AnnotationError;

/// One annotated event, in seconds from the start of the recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Ordered list of annotated events (file order). Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
    intervals: Vec<Interval>,
}

impl AnnotationSet {
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self::new(pairs.iter().map(|&(s, e)| Interval::new(s, e)).collect())
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Path of the annotation file companion to `recording`: same stem, `ext`
/// extension.
pub fn annotation_path(recording: &Path, ext: &str) -> PathBuf {
    recording.with_extension(ext)
}

/// `true` if `recording` has a companion annotation file.
pub fn has_annotations(recording: &Path, ext: &str) -> bool {
    annotation_path(recording, ext).is_file()
}

/// Load the annotations for `recording`.
///
/// Returns an empty set when the companion file does not exist.
pub fn read_annotations(recording: &Path, ext: &str) -> Result<AnnotationSet, AnnotationError> {
    let path = annotation_path(recording, ext);
    let file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AnnotationSet::default()),
        Err(source) => return Err(AnnotationError::Io { path, source }),
    };
    parse_annotations(BufReader::new(file), &path)
}

/// Parse annotation lines from any buffered reader. `path` is only used in
/// error messages.
pub fn parse_annotations<R: BufRead>(reader: R, path: &Path) -> Result<AnnotationSet, AnnotationError> {
    let mut intervals = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| AnnotationError::Io { path: path.to_path_buf(), source })?;
        let lineno = i + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let &[s, e] = tokens.as_slice() else {
            if !tokens.is_empty() {
                warn!("{}:{lineno}: skipping line with {} tokens", path.display(), tokens.len());
            }
            continue;
        };
        let num = |tok: &str| {
            tok.parse::<f64>().map_err(|_| AnnotationError::Parse {
                path: path.to_path_buf(),
                line: lineno,
                token: tok.to_string(),
            })
        };
        intervals.push(Interval::new(num(s)?, num(e)?));
    }
    Ok(AnnotationSet::new(intervals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<AnnotationSet, AnnotationError> {
        parse_annotations(Cursor::new(text), Path::new("test.seizures"))
    }

    #[test]
    fn two_token_lines_in_order() {
        let set = parse("10.5 20\n100 130.25\n").unwrap();
        assert_eq!(set.intervals(), &[Interval::new(10.5, 20.0), Interval::new(100.0, 130.25)]);
    }

    #[test]
    fn other_token_counts_skipped() {
        let set = parse("start end label\n\n  \n5 6\n7\n").unwrap();
        assert_eq!(set.intervals(), &[Interval::new(5.0, 6.0)]);
    }

    #[test]
    fn malformed_number_reports_line() {
        let err = parse("1 2\n3 abc\n").unwrap_err();
        match err {
            AnnotationError::Parse { line, token, .. } => {
                assert_eq!(line, 2);
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn companion_path_swaps_extension() {
        let p = annotation_path(Path::new("/data/s1/chb01_03.edf"), "seizures");
        assert_eq!(p, PathBuf::from("/data/s1/chb01_03.seizures"));
    }

    #[test]
    fn missing_file_is_empty() {
        let set = read_annotations(Path::new("/definitely/not/here.edf"), "seizures").unwrap();
        assert!(set.is_empty());
    }
}
