//! Time-domain (TDR) step-response derivation.
//!
//! The reflection trace S(p, p) over a uniform DC-anchored frequency grid is
//! expanded into a Hermitian double-sided spectrum, inverse transformed to an
//! impulse response, integrated into a step response, and converted to an
//! impedance profile z(t) = z0 * (1 + rho) / (1 - rho).

use num_complex::Complex;
use rustfft::FftPlanner;
use snpost_core::{frequency, Network};

use crate::error::{Error, Result};

/// Default uniform re-grid step ahead of time-domain conversion.
pub const DEFAULT_TDR_STEP_HZ: f64 = 10e6;

/// Reflection steps are clamped this far away from +/-1 before the
/// impedance conversion so an ideal open or short stays plottable.
const RHO_CLAMP: f64 = 1.0 - 1e-9;

/// A time-domain step response of the port impedance.
#[derive(Debug, Clone)]
pub struct StepResponse {
    /// Time axis in seconds, uniformly spaced from 0.
    pub time: Vec<f64>,
    /// Impedance profile in ohms.
    pub impedance: Vec<f64>,
}

/// Extrapolate to DC and re-grid uniformly, the required preconditioning
/// for [`z_time_step`].
pub fn prepare_for_tdr(network: &Network, step_hz: f64) -> Result<Network> {
    let with_dc = network.extrapolate_to_dc();
    let fmax = *with_dc.freq().last().unwrap_or(&0.0);
    let grid = frequency::linear_grid(step_hz, fmax);
    Ok(with_dc.resample(&grid)?)
}

/// Compute the impedance step response seen at `port` (0-based).
///
/// The network must contain a DC sample and be uniformly gridded; use
/// [`prepare_for_tdr`] first.
pub fn z_time_step(network: &Network, port: usize) -> Result<StepResponse> {
    let freq = network.freq();
    if freq[0] != 0.0 {
        return Err(Error::NeedsDcPoint);
    }
    if !frequency::is_uniform(freq) {
        return Err(Error::NonUniformGrid);
    }
    let n = freq.len();
    if n < 2 {
        return Err(Error::TooFewSamples { needed: 2, got: n });
    }

    let gamma = network.s_param(port, port)?;
    let z0 = network.z0()[port];

    // Hermitian double-sided spectrum: DC and Nyquist bins forced real.
    let m = 2 * (n - 1);
    let mut buf = vec![Complex::new(0.0, 0.0); m];
    buf[0] = Complex::new(gamma[0].re, 0.0);
    buf[n - 1] = Complex::new(gamma[n - 1].re, 0.0);
    for k in 1..n - 1 {
        buf[k] = gamma[k];
        buf[m - k] = gamma[k].conj();
    }

    FftPlanner::new().plan_fft_inverse(m).process(&mut buf);

    // rustfft leaves the inverse unnormalized; the real parts of the
    // normalized output are the reflection impulse response.
    let scale = 1.0 / m as f64;
    let mut impedance = Vec::with_capacity(m);
    let mut rho_step = 0.0;
    for v in &buf {
        rho_step += v.re * scale;
        let rho = rho_step.clamp(-RHO_CLAMP, RHO_CLAMP);
        impedance.push(z0 * (1.0 + rho) / (1.0 - rho));
    }

    let df = freq[1] - freq[0];
    let dt = 1.0 / (m as f64 * df);
    let time = (0..m).map(|k| k as f64 * dt).collect();

    Ok(StepResponse { time, impedance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    fn flat_reflection_network(nfreq: usize, step: f64, gamma: f64) -> Network {
        let freq: Vec<f64> = (0..nfreq).map(|k| k as f64 * step).collect();
        let s = freq
            .iter()
            .map(|_| DMatrix::from_element(1, 1, Complex::new(gamma, 0.0)))
            .collect();
        Network::new(freq, s, vec![50.0]).unwrap()
    }

    #[test]
    fn test_requires_dc_point() {
        let freq = vec![1e6, 2e6, 3e6];
        let s = freq
            .iter()
            .map(|_| DMatrix::from_element(1, 1, Complex::new(0.0, 0.0)))
            .collect();
        let nw = Network::new(freq, s, vec![50.0]).unwrap();
        assert!(matches!(z_time_step(&nw, 0), Err(Error::NeedsDcPoint)));
    }

    #[test]
    fn test_requires_uniform_grid() {
        let freq = vec![0.0, 1e6, 3e6];
        let s = freq
            .iter()
            .map(|_| DMatrix::from_element(1, 1, Complex::new(0.0, 0.0)))
            .collect();
        let nw = Network::new(freq, s, vec![50.0]).unwrap();
        assert!(matches!(z_time_step(&nw, 0), Err(Error::NonUniformGrid)));
    }

    #[test]
    fn test_matched_port_reads_z0() {
        let nw = flat_reflection_network(64, 10e6, 0.0);
        let step = z_time_step(&nw, 0).unwrap();
        assert_eq!(step.time[0], 0.0);
        for z in &step.impedance {
            assert!((z - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_resistive_load_reads_dc_impedance() {
        // Gamma = -1/3 flat in frequency is a 25 ohm load on a 50 ohm
        // system; the whole impulse lands at t = 0, so every step sample
        // reads 25 ohms.
        let nw = flat_reflection_network(64, 10e6, -1.0 / 3.0);
        let step = z_time_step(&nw, 0).unwrap();
        for z in &step.impedance {
            assert!((z - 25.0).abs() < 1e-6, "z = {}", z);
        }
    }

    #[test]
    fn test_time_axis_spacing() {
        let nw = flat_reflection_network(101, 10e6, 0.0);
        let step = z_time_step(&nw, 0).unwrap();
        let m = 2 * (101 - 1);
        assert_eq!(step.time.len(), m);
        let dt = step.time[1] - step.time[0];
        assert!((dt - 1.0 / (m as f64 * 10e6)).abs() < 1e-18);
    }

    #[test]
    fn test_prepare_for_tdr_adds_dc_and_regrids() {
        let freq = vec![5e6, 20e6, 40e6];
        let s = freq
            .iter()
            .map(|_| DMatrix::from_element(1, 1, Complex::new(0.1, 0.0)))
            .collect();
        let nw = Network::new(freq, s, vec![50.0]).unwrap();
        let prepared = prepare_for_tdr(&nw, DEFAULT_TDR_STEP_HZ).unwrap();
        assert_eq!(prepared.freq()[0], 0.0);
        assert!(frequency::is_uniform(prepared.freq()));
        assert!(*prepared.freq().last().unwrap() >= 40e6);
    }
}
