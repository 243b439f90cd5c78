//! Bracketing interpolation of impedance at a target frequency.
//!
//! The sampled grid rarely lands exactly on the diagnostic frequencies used
//! for RLC extraction, so the interpolator searches outward from the nearest
//! sample in 10% steps of the target until it finds a sample on the far side,
//! then interpolates |Z| log-log and unwrapped phase linearly. When the grid
//! is too sparse to bracket the target within the search window, the last
//! pair found is used anyway and the result is flagged as degraded.

use snpost_core::frequency::nearest_index;
use snpost_core::Network;

use crate::error::Result;

/// Relative probe step of the outward bracket search.
const SEARCH_RATE: f64 = 0.1;

/// An interpolated impedance sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedPoint {
    /// |Z| in ohms.
    pub magnitude: f64,
    /// Unwrapped phase in radians.
    pub phase_rad: f64,
    /// True when the frequency grid could not bracket the target and the
    /// value was computed from the best available pair.
    pub degraded: bool,
}

/// Interpolate |Z(i, j)| and unwrapped phase at `target_hz`.
///
/// Ports are 0-based. Returns the exact sample when the target lies on the
/// grid. Emits a `log::warn!` in the degraded case; callers that need to act
/// on it should check [`InterpolatedPoint::degraded`].
pub fn interpolate_z(
    network: &Network,
    target_hz: f64,
    port_i: usize,
    port_j: usize,
) -> Result<InterpolatedPoint> {
    let mag = network.z_mag(port_i, port_j)?;
    let phase = network.z_phase_unwrapped(port_i, port_j)?;
    let freq = network.freq();

    let i1 = nearest_index(freq, target_hz);
    let f1 = freq[i1];
    if f1 == target_hz {
        return Ok(InterpolatedPoint {
            magnitude: mag[i1],
            phase_rad: phase[i1],
            degraded: false,
        });
    }

    // Probe outward from the target until a sample on the far side of it
    // turns up, at most ten 10% steps.
    let upward = f1 < target_hz;
    let mut n = 1;
    let max_steps = if upward { 10 } else { 9 };
    let mut i2 = probe(freq, target_hz, n, upward);
    while !brackets(freq[i2], target_hz, upward) && n < max_steps {
        n += 1;
        i2 = probe(freq, target_hz, n, upward);
    }

    let mut degraded = false;
    if !brackets(freq[i2], target_hz, upward) {
        log::warn!(
            "frequency samples are not sufficiently dense to interpolate \
             Z({}, {}) at {}Hz; results may be inaccurate",
            port_i + 1,
            port_j + 1,
            snpost_core::units::format_si(target_hz)
        );
        degraded = true;
    }

    if i2 == i1 {
        // The search collapsed onto the same sample (single-sided grid);
        // nothing to interpolate against.
        return Ok(InterpolatedPoint {
            magnitude: mag[i1],
            phase_rad: phase[i1],
            degraded: true,
        });
    }

    let (f2, z1, z2, a1, a2) = (freq[i2], mag[i1], mag[i2], phase[i1], phase[i2]);

    // |Z| linear in log10-log10 space, phase linear in frequency.
    let magnitude = 10f64.powf(
        z1.log10()
            + (target_hz.log10() - f1.log10()) / (f2.log10() - f1.log10())
                * (z2.log10() - z1.log10()),
    );
    let phase_rad = a1 + (target_hz - f1) / (f2 - f1) * (a2 - a1);

    Ok(InterpolatedPoint {
        magnitude,
        phase_rad,
        degraded,
    })
}

/// Index of the sample the n-th probe lands on: the first sample at or past
/// the probe frequency in the search direction, clamped to the grid ends.
fn probe(freq: &[f64], target: f64, n: usize, upward: bool) -> usize {
    if upward {
        let probe_hz = target * (1.0 + n as f64 * SEARCH_RATE);
        let i = freq.partition_point(|&f| f < probe_hz);
        i.min(freq.len() - 1)
    } else {
        let probe_hz = target * (1.0 - n as f64 * SEARCH_RATE);
        freq.partition_point(|&f| f <= probe_hz).saturating_sub(1)
    }
}

fn brackets(f2: f64, target: f64, upward: bool) -> bool {
    if upward {
        f2 > target
    } else {
        f2 < target
    }
}
