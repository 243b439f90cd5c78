//! Frequency-indexed R/L/C extraction.
//!
//! The three probe frequencies encode the usual PDN corner assumptions:
//! at 1 kHz the impedance magnitude is dominated by series DC resistance,
//! at 10 kHz by bulk capacitance, and at 100 MHz by loop inductance.

use std::f64::consts::TAU;

use snpost_core::Network;

use crate::error::Result;
use crate::interp::interpolate_z;

/// Probe frequency for DC resistance.
pub const R_PROBE_HZ: f64 = 1e3;
/// Probe frequency for low-frequency (bulk) capacitance.
pub const C_PROBE_HZ: f64 = 1e4;
/// Probe frequency for high-frequency inductance.
pub const L_PROBE_HZ: f64 = 1e8;

/// Extracted R/L/C values in base SI units (ohm, henry, farad).
///
/// Presentation scaling (milliohm, picohenry, nanofarad) is the report
/// layer's job; keeping base units here avoids the unit drift that creeps
/// in when every call site scales for itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RlcSummary {
    /// Series DC resistance in ohms (|Z| at 1 kHz).
    pub r_dc: f64,
    /// High-frequency inductance in henries (|Z| / (2*pi*f) at 100 MHz).
    pub l_hf: f64,
    /// Low-frequency capacitance in farads (1 / (|Z| * 2*pi*f) at 10 kHz).
    pub c_lf: f64,
    /// True when any of the three interpolations ran out of bracketing
    /// samples and fell back to the nearest pair.
    pub degraded: bool,
}

/// Extract R, L, and C for the self-impedance of `port` (0-based).
pub fn extract_rlc(network: &Network, port: usize) -> Result<RlcSummary> {
    let r = interpolate_z(network, R_PROBE_HZ, port, port)?;
    let c = interpolate_z(network, C_PROBE_HZ, port, port)?;
    let l = interpolate_z(network, L_PROBE_HZ, port, port)?;

    Ok(RlcSummary {
        r_dc: r.magnitude,
        l_hf: l.magnitude / (TAU * L_PROBE_HZ),
        c_lf: 1.0 / (c.magnitude * TAU * C_PROBE_HZ),
        degraded: r.degraded || c.degraded || l.degraded,
    })
}
