//! FIR filter design.
//!
//! - [`design`]: windowed-sinc lowpass design, matching
//!   `scipy.signal.firwin`, plus the anti-aliasing filter used by
//!   [`crate::resample::resample_poly`].

pub mod design;

pub use design::{design_resample_lowpass, firwin, kaiser, KAISER_BETA};
