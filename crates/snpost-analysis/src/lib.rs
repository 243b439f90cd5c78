//! Frequency-domain analysis for snpost.
//!
//! This crate provides:
//! - Bracketing interpolation of impedance magnitude and phase at an
//!   arbitrary target frequency
//! - Single-ended to mixed-mode (differential/common) conversion and
//!   quadrant splitting
//! - Frequency-indexed R/L/C extraction at fixed diagnostic frequencies
//! - Time-domain (TDR) step-response derivation via inverse FFT

pub mod error;
pub mod interp;
pub mod mixed_mode;
pub mod rlc;
pub mod tdr;

pub use error::{Error, Result};
pub use interp::{interpolate_z, InterpolatedPoint};
pub use mixed_mode::{split_quadrants, to_mixed_mode};
pub use rlc::{extract_rlc, RlcSummary};
pub use tdr::{prepare_for_tdr, z_time_step, StepResponse, DEFAULT_TDR_STEP_HZ};
