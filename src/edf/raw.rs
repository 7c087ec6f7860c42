//! Raw EDF data reader.
//!
//! # Algorithm
//! 1. Parse the header (fixed part + one block per signal).
//! 2. Drop `EDF Annotations` signals; the remaining data signals must share
//!    one sampling rate.
//! 3. Derive the record count from the file size when the header says −1.
//! 4. `read_slice` seeks to the first data record covering the range, reads
//!    just the records it needs and decodes them.
//!
//! # Calibration
//! ```text
//! value[ch, t] = (digital × gain + offset) × unit_scale
//! gain         = (pmax − pmin) / (dmax − dmin)
//! offset       = pmin − dmin × gain
//! ```
//! `unit_scale` converts µV / mV to volts, as MNE's `read_raw_edf` does.
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use ndarray::Array2;

use super::header::{read_header, EdfHeader};
use crate::error::RecordingReadError;
use crate::recording::{Recording, RecordingOpener};

/// An opened EDF recording (header only; samples are read on demand).
#[derive(Debug, Clone)]
pub struct RawEdf {
    pub header: EdfHeader,
    pub path: PathBuf,
    /// Indices into `header.signals` of the data (non-annotation) signals.
    pub channels: Vec<usize>,
    /// Byte offset of each signal's samples within one data record.
    signal_offsets: Vec<usize>,
    n_records: usize,
    samples_per_record: usize,
    sfreq: f64,
    /// Per-channel `(gain, offset)` already multiplied by the unit scale.
    cals: Vec<(f64, f64)>,
}

impl RawEdf {
    /// Data channel labels in order.
    pub fn ch_names(&self) -> Vec<&str> {
        self.channels.iter().map(|&i| self.header.signals[i].label.as_str()).collect()
    }

    pub fn n_records(&self) -> usize {
        self.n_records
    }

    fn err(&self, message: impl Into<String>) -> RecordingReadError {
        RecordingReadError::new(&self.path, message)
    }
}

/// Open an EDF file and return a [`RawEdf`] without reading any samples.
pub fn open_raw<P: AsRef<Path>>(path: P) -> Result<RawEdf, RecordingReadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| RecordingReadError::io(path, "open", e))?;
    let file_len = file
        .metadata()
        .map_err(|e| RecordingReadError::io(path, "stat", e))?
        .len() as usize;
    let mut reader = BufReader::new(file);
    let header = read_header(&mut reader).map_err(|m| RecordingReadError::new(path, m))?;

    let channels: Vec<usize> = header
        .signals
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_annotation())
        .map(|(i, _)| i)
        .collect();
    let Some(&first) = channels.first() else {
        return Err(RecordingReadError::new(path, "no data signals (annotations only)"));
    };

    let samples_per_record = header.signals[first].samples_per_record;
    if let Some(&odd) = channels
        .iter()
        .find(|&&i| header.signals[i].samples_per_record != samples_per_record)
    {
        return Err(RecordingReadError::new(
            path,
            format!(
                "mixed sampling rates: {} has {} samples/record, {} has {}",
                header.signals[first].label,
                samples_per_record,
                header.signals[odd].label,
                header.signals[odd].samples_per_record
            ),
        ));
    }
    if samples_per_record == 0 {
        return Err(RecordingReadError::new(path, "zero samples per record"));
    }

    let mut signal_offsets = Vec::with_capacity(header.signals.len());
    let mut off = 0;
    for s in &header.signals {
        signal_offsets.push(off);
        off += s.samples_per_record * 2;
    }

    let record_bytes = header.record_bytes();
    let available = file_len.saturating_sub(header.header_bytes) / record_bytes;
    let n_records = match header.n_records {
        Some(n) if n <= available => n,
        Some(n) => {
            return Err(RecordingReadError::new(
                path,
                format!("header declares {n} data records but file holds {available}"),
            ))
        }
        None => available,
    };

    let cals = channels
        .iter()
        .map(|&i| {
            let s = &header.signals[i];
            let scale = s.unit_scale();
            (s.gain() * scale, s.offset() * scale)
        })
        .collect();
    let sfreq = header.signals[first].sfreq(header.record_duration);

    Ok(RawEdf {
        header,
        path: path.to_path_buf(),
        channels,
        signal_offsets,
        n_records,
        samples_per_record,
        sfreq,
        cals,
    })
}

impl Recording for RawEdf {
    fn sfreq(&self) -> f64 {
        self.sfreq
    }

    fn n_chan(&self) -> usize {
        self.channels.len()
    }

    fn n_times(&self) -> usize {
        self.n_records * self.samples_per_record
    }

    fn read_slice(&self, start: usize, end: usize) -> Result<Array2<f64>, RecordingReadError> {
        if start > end || end > self.n_times() {
            return Err(self.err(format!(
                "sample range {start}..{end} out of bounds ({} samples)",
                self.n_times()
            )));
        }
        let n_ch = self.channels.len();
        let mut out = Array2::<f64>::zeros((n_ch, end - start));
        if start == end {
            return Ok(out);
        }

        let spr = self.samples_per_record;
        let rec_first = start / spr;
        let rec_last = (end - 1) / spr;
        let record_bytes = self.header.record_bytes();

        let mut file = File::open(&self.path).map_err(|e| RecordingReadError::io(&self.path, "open", e))?;
        let pos = (self.header.header_bytes + rec_first * record_bytes) as u64;
        file.seek(SeekFrom::Start(pos))
            .map_err(|e| RecordingReadError::io(&self.path, format!("seek to record {rec_first}"), e))?;
        let mut buf = vec![0u8; (rec_last - rec_first + 1) * record_bytes];
        file.read_exact(&mut buf)
            .map_err(|e| RecordingReadError::io(&self.path, format!("read records {rec_first}..={rec_last}"), e))?;

        for (rec_idx, record) in buf.chunks_exact(record_bytes).enumerate() {
            // Absolute sample index of this record's first sample.
            let rec_base = (rec_first + rec_idx) * spr;
            let lo = start.max(rec_base) - rec_base;
            let hi = end.min(rec_base + spr) - rec_base;
            for (c, &sig) in self.channels.iter().enumerate() {
                let (gain, offset) = self.cals[c];
                let sig_bytes = &record[self.signal_offsets[sig]..self.signal_offsets[sig] + spr * 2];
                for t in lo..hi {
                    let d = i16::from_le_bytes([sig_bytes[2 * t], sig_bytes[2 * t + 1]]);
                    out[[c, rec_base + t - start]] = d as f64 * gain + offset;
                }
            }
        }
        Ok(out)
    }
}

/// Opens `.edf` files with the native reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct EdfOpener;

impl RecordingOpener for EdfOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn Recording>, RecordingReadError> {
        Ok(Box::new(open_raw(path)?))
    }
}
