//! EDF / EDF+ header parsing.
//!
//! On-disk layout (all fields space-padded ASCII):
//!
//! ```text
//! fixed part, 256 bytes
//!    8  version            "0"
//!   80  patient id
//!   80  recording id
//!    8  start date         dd.mm.yy
//!    8  start time         hh.mm.ss
//!    8  header bytes       256 · (ns + 1)
//!   44  reserved           "EDF+C" / "EDF+D" for EDF+
//!    8  data records       −1 if unknown
//!    8  record duration    seconds
//!    4  ns                 number of signals
//! signal part, 256 bytes per signal, stored field-by-field
//!   16  label  · 80 transducer · 8 physical dimension
//!    8  physical min · 8 physical max · 8 digital min · 8 digital max
//!   80  prefiltering · 8 samples per record · 32 reserved
//! ```
use std::io::Read;

/// Label of the EDF+ annotation pseudo-signal.
pub const ANNOTATION_LABEL: &str = "EDF Annotations";

/// Size of the fixed header part and of each per-signal block.
pub const BLOCK_BYTES: usize = 256;

/// One signal's header fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalHeader {
    pub label: String,
    pub transducer: String,
    pub physical_dim: String,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: i32,
    pub digital_max: i32,
    pub prefilter: String,
    pub samples_per_record: usize,
}

impl SignalHeader {
    /// `true` for the EDF+ `EDF Annotations` channel (TAL text, not samples).
    pub fn is_annotation(&self) -> bool {
        self.label == ANNOTATION_LABEL
    }

    /// Physical units per digital step.
    pub fn gain(&self) -> f64 {
        (self.physical_max - self.physical_min) / (self.digital_max - self.digital_min) as f64
    }

    /// Physical value of digital zero.
    pub fn offset(&self) -> f64 {
        self.physical_min - self.digital_min as f64 * self.gain()
    }

    /// Factor converting the signal's physical unit to SI (volts for
    /// voltages). Unknown units are left unscaled.
    pub fn unit_scale(&self) -> f64 {
        match self.physical_dim.as_str() {
            "uV" | "µV" | "μV" => 1e-6,
            "mV" => 1e-3,
            "nV" => 1e-9,
            _ => 1.0,
        }
    }

    /// Sampling rate given the record duration.
    pub fn sfreq(&self, record_duration: f64) -> f64 {
        self.samples_per_record as f64 / record_duration
    }
}

/// Parsed EDF header.
#[derive(Debug, Clone, PartialEq)]
pub struct EdfHeader {
    pub version: String,
    pub patient: String,
    pub recording: String,
    pub start_date: String,
    pub start_time: String,
    pub header_bytes: usize,
    pub reserved: String,
    /// `None` when the file says −1 (still being written); derive from file size.
    pub n_records: Option<usize>,
    pub record_duration: f64,
    pub signals: Vec<SignalHeader>,
}

impl EdfHeader {
    /// `true` for EDF+ (continuous or discontinuous).
    pub fn is_edf_plus(&self) -> bool {
        self.reserved.starts_with("EDF+")
    }

    /// Bytes per data record (`Σ samples_per_record × 2`).
    pub fn record_bytes(&self) -> usize {
        self.signals.iter().map(|s| s.samples_per_record * 2).sum()
    }
}

/// Read and validate the full header (fixed + signal parts).
///
/// Errors are plain messages; the caller attaches the file path.
pub fn read_header<R: Read>(reader: &mut R) -> Result<EdfHeader, String> {
    let mut fixed = [0u8; BLOCK_BYTES];
    reader
        .read_exact(&mut fixed)
        .map_err(|e| format!("reading fixed header: {e}"))?;
    let mut cur = Fields::new(&fixed);

    let version = cur.text(8);
    if version != "0" {
        return Err(format!("unsupported EDF version {version:?}"));
    }
    let patient = cur.text(80);
    let recording = cur.text(80);
    let start_date = cur.text(8);
    let start_time = cur.text(8);
    let header_bytes: usize = cur.parse(8, "header bytes")?;
    let reserved = cur.text(44);
    let n_records: i64 = cur.parse(8, "number of data records")?;
    let record_duration: f64 = cur.parse(8, "record duration")?;
    let ns: usize = cur.parse(4, "number of signals")?;

    if ns == 0 {
        return Err("file declares no signals".into());
    }
    if header_bytes != BLOCK_BYTES * (ns + 1) {
        return Err(format!(
            "header size {header_bytes} does not match {ns} signals ({} expected)",
            BLOCK_BYTES * (ns + 1)
        ));
    }
    if !(record_duration.is_finite() && record_duration > 0.0) {
        return Err(format!("record duration must be > 0, got {record_duration}"));
    }

    let mut block = vec![0u8; BLOCK_BYTES * ns];
    reader
        .read_exact(&mut block)
        .map_err(|e| format!("reading signal headers: {e}"))?;
    let mut cur = Fields::new(&block);

    let labels = cur.texts(ns, 16);
    let transducers = cur.texts(ns, 80);
    let dims = cur.texts(ns, 8);
    let pmins: Vec<f64> = cur.parses(ns, 8, "physical minimum")?;
    let pmaxs: Vec<f64> = cur.parses(ns, 8, "physical maximum")?;
    let dmins: Vec<i32> = cur.parses(ns, 8, "digital minimum")?;
    let dmaxs: Vec<i32> = cur.parses(ns, 8, "digital maximum")?;
    let prefilters = cur.texts(ns, 80);
    let sprs: Vec<usize> = cur.parses(ns, 8, "samples per record")?;

    let mut signals = Vec::with_capacity(ns);
    for i in 0..ns {
        let sig = SignalHeader {
            label: labels[i].clone(),
            transducer: transducers[i].clone(),
            physical_dim: dims[i].clone(),
            physical_min: pmins[i],
            physical_max: pmaxs[i],
            digital_min: dmins[i],
            digital_max: dmaxs[i],
            prefilter: prefilters[i].clone(),
            samples_per_record: sprs[i],
        };
        if !sig.is_annotation() && sig.digital_max <= sig.digital_min {
            return Err(format!(
                "signal {i} ({}): digital max {} ≤ digital min {}",
                sig.label, sig.digital_max, sig.digital_min
            ));
        }
        signals.push(sig);
    }

    Ok(EdfHeader {
        version,
        patient,
        recording,
        start_date,
        start_time,
        header_bytes,
        reserved,
        n_records: usize::try_from(n_records).ok(),
        record_duration,
        signals,
    })
}

/// Sequential cursor over fixed-width ASCII fields.
struct Fields<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn text(&mut self, width: usize) -> String {
        let raw = &self.buf[self.pos..self.pos + width];
        self.pos += width;
        // Latin-1 → char, then trim the space padding.
        raw.iter().map(|&b| b as char).collect::<String>().trim().to_string()
    }

    fn texts(&mut self, n: usize, width: usize) -> Vec<String> {
        (0..n).map(|_| self.text(width)).collect()
    }

    fn parse<T: std::str::FromStr>(&mut self, width: usize, what: &str) -> Result<T, String> {
        let s = self.text(width);
        s.parse().map_err(|_| format!("invalid {what}: {s:?}"))
    }

    fn parses<T: std::str::FromStr>(&mut self, n: usize, width: usize, what: &str) -> Result<Vec<T>, String> {
        (0..n).map(|_| self.parse(width, what)).collect()
    }
}
