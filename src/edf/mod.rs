//! EDF / EDF+ reader.
//!
//! Reads 16-bit European Data Format recordings natively, one sample range
//! at a time, so a window can be extracted without loading the whole file.
//!
//! # Quick start
//! ```no_run
//! use exg_window::edf::open_raw;
//! use exg_window::recording::Recording;
//!
//! let raw = open_raw("data/chb01_03.edf").unwrap();
//! println!("{} channels @ {} Hz", raw.n_chan(), raw.sfreq());
//! let first_window = raw.read_slice(0, 1024).unwrap();  // [n_chan, 1024] f64, volts
//! ```
pub mod header;
pub mod raw;
pub mod writer;

pub use header::{read_header, EdfHeader, SignalHeader, ANNOTATION_LABEL};
pub use raw::{open_raw, EdfOpener, RawEdf};
pub use writer::write_edf;
