//! Immutable n-port network value type.

use std::path::Path;

use nalgebra::DMatrix;
use num_complex::Complex;

use crate::error::{Error, Result};
use crate::frequency;
use crate::touchstone;

type C64 = Complex<f64>;

/// Magnitudes at or below this floor are reported as -400 dB instead of -inf.
const DB_FLOOR_MAG: f64 = 1e-20;
const DB_FLOOR: f64 = -400.0;

/// An n-port frequency-domain network.
///
/// Holds a strictly increasing frequency grid (Hz), one dense complex
/// S-matrix per frequency point, and a per-port reference impedance.
///
/// `Network` is an immutable value type: every transformation (`renumber`,
/// `resample`, `connect_short`, ...) returns a new instance, so a loaded
/// network can be shared across several post-processing steps without
/// aliasing surprises. Port indices are 0-based internally; user-facing
/// labels are 1-based.
#[derive(Debug, Clone)]
pub struct Network {
    freq: Vec<f64>,
    s: Vec<DMatrix<C64>>,
    z0: Vec<f64>,
}

impl Network {
    /// Create a network from raw parts, validating the invariants.
    pub fn new(freq: Vec<f64>, s: Vec<DMatrix<C64>>, z0: Vec<f64>) -> Result<Self> {
        if freq.is_empty() {
            return Err(Error::Grid("network has no frequency samples".into()));
        }
        if freq.len() != s.len() {
            return Err(Error::Format(format!(
                "{} frequency samples but {} S-matrices",
                freq.len(),
                s.len()
            )));
        }
        if freq.iter().any(|f| !f.is_finite()) {
            return Err(Error::Grid(
                "frequency samples must be finite".into(),
            ));
        }
        if freq.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(Error::Format(
                "frequency samples must be strictly increasing".into(),
            ));
        }
        let nports = s[0].nrows();
        for (k, m) in s.iter().enumerate() {
            if m.nrows() != nports || m.ncols() != nports {
                return Err(Error::Format(format!(
                    "S-matrix at frequency index {} is {}x{}, expected {}x{}",
                    k,
                    m.nrows(),
                    m.ncols(),
                    nports,
                    nports
                )));
            }
        }
        if z0.len() != nports {
            return Err(Error::Format(format!(
                "{} reference impedances for a {}-port network",
                z0.len(),
                nports
            )));
        }
        Ok(Self { freq, s, z0 })
    }

    /// Load a network from a Touchstone file; the port count is inferred
    /// from the extension digit (`.s4p` => 4 ports).
    pub fn from_touchstone<P: AsRef<Path>>(path: P) -> Result<Self> {
        touchstone::load(path)
    }

    /// Write the network to a Touchstone file in real/imaginary format.
    pub fn write_touchstone<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        touchstone::write(self, path)
    }

    /// Number of ports.
    pub fn nports(&self) -> usize {
        self.s[0].nrows()
    }

    /// Number of frequency samples.
    pub fn nfreq(&self) -> usize {
        self.freq.len()
    }

    /// Frequency grid in Hz.
    pub fn freq(&self) -> &[f64] {
        &self.freq
    }

    /// Frequency grid in GHz, the unit used on plot axes.
    pub fn freq_ghz(&self) -> Vec<f64> {
        self.freq.iter().map(|f| f / 1e9).collect()
    }

    /// Per-port reference impedances.
    pub fn z0(&self) -> &[f64] {
        &self.z0
    }

    /// S-matrix at frequency index `k`.
    pub fn s_at(&self, k: usize) -> &DMatrix<C64> {
        &self.s[k]
    }

    fn check_port(&self, index: usize) -> Result<()> {
        if index >= self.nports() {
            return Err(Error::PortIndex {
                index,
                nports: self.nports(),
            });
        }
        Ok(())
    }

    /// The S(i, j) trace across all frequencies (0-based ports).
    pub fn s_param(&self, port_i: usize, port_j: usize) -> Result<Vec<C64>> {
        self.check_port(port_i)?;
        self.check_port(port_j)?;
        Ok(self.s.iter().map(|m| m[(port_i, port_j)]).collect())
    }

    /// |S(i, j)| in dB per frequency.
    pub fn s_db(&self, port_i: usize, port_j: usize) -> Result<Vec<f64>> {
        Ok(self
            .s_param(port_i, port_j)?
            .iter()
            .map(|s| {
                let mag = s.norm();
                if mag > DB_FLOOR_MAG {
                    20.0 * mag.log10()
                } else {
                    DB_FLOOR
                }
            })
            .collect())
    }

    /// Z-matrix at frequency index `k`.
    ///
    /// Z = D (I + S) (I - S)^-1 D with D = diag(sqrt(z0)).
    pub fn z_at(&self, k: usize) -> Result<DMatrix<C64>> {
        let n = self.nports();
        let identity = DMatrix::<C64>::identity(n, n);
        let i_plus_s = &identity + &self.s[k];
        let i_minus_s = &identity - &self.s[k];
        let x = i_minus_s
            .lu()
            .solve(&i_plus_s)
            .ok_or(Error::Singular(k))?;
        let mut z = x;
        for i in 0..n {
            for j in 0..n {
                z[(i, j)] *= C64::new((self.z0[i] * self.z0[j]).sqrt(), 0.0);
            }
        }
        Ok(z)
    }

    /// |Z(i, j)| per frequency (0-based ports).
    pub fn z_mag(&self, port_i: usize, port_j: usize) -> Result<Vec<f64>> {
        self.check_port(port_i)?;
        self.check_port(port_j)?;
        let mut out = Vec::with_capacity(self.nfreq());
        for k in 0..self.nfreq() {
            out.push(self.z_at(k)?[(port_i, port_j)].norm());
        }
        Ok(out)
    }

    /// Unwrapped phase of Z(i, j) in radians per frequency.
    pub fn z_phase_unwrapped(&self, port_i: usize, port_j: usize) -> Result<Vec<f64>> {
        self.check_port(port_i)?;
        self.check_port(port_j)?;
        let mut raw = Vec::with_capacity(self.nfreq());
        for k in 0..self.nfreq() {
            raw.push(self.z_at(k)?[(port_i, port_j)].arg());
        }
        Ok(frequency::unwrap_phase(&raw))
    }

    /// Return a new network with ports permuted: the port at `old[k]` moves
    /// to position `new[k]`. Both slices must be permutations of `0..nports`.
    pub fn renumber(&self, old: &[usize], new: &[usize]) -> Result<Network> {
        let n = self.nports();
        if old.len() != n || new.len() != n {
            return Err(Error::Format(format!(
                "renumber orders must have length {}, got {} and {}",
                n,
                old.len(),
                new.len()
            )));
        }
        let mut seen_old = vec![false; n];
        let mut seen_new = vec![false; n];
        for (&o, &m) in old.iter().zip(new) {
            self.check_port(o)?;
            self.check_port(m)?;
            if seen_old[o] || seen_new[m] {
                return Err(Error::Format(
                    "renumber orders must be permutations without repeats".into(),
                ));
            }
            seen_old[o] = true;
            seen_new[m] = true;
        }

        // dest[new[k]] = src[old[k]]
        let mut map = vec![0usize; n];
        for (&o, &m) in old.iter().zip(new) {
            map[m] = o;
        }
        let s = self
            .s
            .iter()
            .map(|m| DMatrix::from_fn(n, n, |i, j| m[(map[i], map[j])]))
            .collect();
        let z0 = (0..n).map(|i| self.z0[map[i]]).collect();
        Network::new(self.freq.clone(), s, z0)
    }

    /// Slice out a sub-network taking `rows` as output ports and `cols` as
    /// input ports. `rows` and `cols` must have equal length; the reference
    /// impedances of the row ports are kept.
    pub fn subnetwork(&self, rows: &[usize], cols: &[usize]) -> Result<Network> {
        if rows.len() != cols.len() || rows.is_empty() {
            return Err(Error::Format(
                "subnetwork row/column selections must be non-empty and equal length".into(),
            ));
        }
        for &p in rows.iter().chain(cols) {
            self.check_port(p)?;
        }
        let n = rows.len();
        let s = self
            .s
            .iter()
            .map(|m| DMatrix::from_fn(n, n, |i, j| m[(rows[i], cols[j])]))
            .collect();
        let z0 = rows.iter().map(|&i| self.z0[i]).collect();
        Network::new(self.freq.clone(), s, z0)
    }

    /// Terminate `port` into a 1-port reference network and return the
    /// reduced (P-1)-port network.
    ///
    /// The termination is resampled onto this network's frequency grid.
    /// When several ports must be terminated, call this highest port index
    /// first so remaining indices stay valid.
    pub fn terminate(&self, port: usize, termination: &Network) -> Result<Network> {
        self.check_port(port)?;
        if termination.nports() != 1 {
            return Err(Error::Format(format!(
                "termination must be a 1-port network, got {} ports",
                termination.nports()
            )));
        }
        if self.nports() < 2 {
            return Err(Error::Format(
                "cannot terminate the only port of a 1-port network".into(),
            ));
        }
        let term = termination.resample(&self.freq)?;

        let keep: Vec<usize> = (0..self.nports()).filter(|&p| p != port).collect();
        let n = keep.len();
        let mut s = Vec::with_capacity(self.nfreq());
        for (k, m) in self.s.iter().enumerate() {
            let gamma = term.s[k][(0, 0)];
            let denom = C64::new(1.0, 0.0) - gamma * m[(port, port)];
            if denom.norm() < 1e-12 {
                return Err(Error::Singular(k));
            }
            s.push(DMatrix::from_fn(n, n, |i, j| {
                let (pi, pj) = (keep[i], keep[j]);
                m[(pi, pj)] + m[(pi, port)] * gamma * m[(port, pj)] / denom
            }));
        }
        let z0 = keep.iter().map(|&i| self.z0[i]).collect();
        Network::new(self.freq.clone(), s, z0)
    }

    /// Terminate `port` into an ideal short circuit (reflection coefficient
    /// -1 at every frequency).
    pub fn connect_short(&self, port: usize) -> Result<Network> {
        self.terminate(port, &Network::short_reference(&self.freq)?)
    }

    /// Ideal 1-port short-circuit reference on the given frequency grid.
    pub fn short_reference(freq: &[f64]) -> Result<Network> {
        let s = freq
            .iter()
            .map(|_| DMatrix::from_element(1, 1, C64::new(-1.0, 0.0)))
            .collect();
        Network::new(freq.to_vec(), s, vec![50.0])
    }

    /// Prepend a DC (0 Hz) sample by linear extrapolation from the two
    /// lowest samples. Identity when the grid already starts at DC.
    pub fn extrapolate_to_dc(&self) -> Network {
        if self.freq[0] <= 0.0 {
            return self.clone();
        }
        let s0 = if self.nfreq() >= 2 {
            let f0 = self.freq[0];
            let f1 = self.freq[1];
            let t = -f0 / (f1 - f0);
            let mut m = self.s[0].clone();
            for i in 0..self.nports() {
                for j in 0..self.nports() {
                    m[(i, j)] = self.s[0][(i, j)]
                        + (self.s[1][(i, j)] - self.s[0][(i, j)]) * C64::new(t, 0.0);
                }
            }
            m
        } else {
            self.s[0].clone()
        };
        let mut freq = Vec::with_capacity(self.nfreq() + 1);
        freq.push(0.0);
        freq.extend_from_slice(&self.freq);
        let mut s = Vec::with_capacity(self.nfreq() + 1);
        s.push(s0);
        s.extend(self.s.iter().cloned());
        Network {
            freq,
            s,
            z0: self.z0.clone(),
        }
    }

    /// Re-grid the network onto `grid` by per-element linear interpolation.
    ///
    /// Targets outside the sampled span clamp to the end samples; the
    /// uniform grids used ahead of time-domain conversion overshoot the
    /// highest sample by less than one step.
    pub fn resample(&self, grid: &[f64]) -> Result<Network> {
        if grid.is_empty() {
            return Err(Error::Grid("resample grid is empty".into()));
        }
        if grid.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::Grid(
                "resample grid must be strictly increasing".into(),
            ));
        }
        let n = self.nports();
        let mut s = Vec::with_capacity(grid.len());
        for &f in grid {
            let m = if f <= self.freq[0] {
                self.s[0].clone()
            } else if f >= *self.freq.last().unwrap() {
                self.s[self.nfreq() - 1].clone()
            } else {
                let hi = self.freq.partition_point(|&g| g < f);
                let lo = hi - 1;
                if self.freq[hi] == f {
                    self.s[hi].clone()
                } else {
                    let t = (f - self.freq[lo]) / (self.freq[hi] - self.freq[lo]);
                    DMatrix::from_fn(n, n, |i, j| {
                        self.s[lo][(i, j)]
                            + (self.s[hi][(i, j)] - self.s[lo][(i, j)]) * C64::new(t, 0.0)
                    })
                }
            };
            s.push(m);
        }
        Network::new(grid.to_vec(), s, self.z0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> C64 {
        C64::new(re, im)
    }

    /// 2-port with S21 = S12 = g, S11 = S22 = r at every frequency.
    fn symmetric_two_port(freq: Vec<f64>, r: f64, g: f64) -> Network {
        let s = freq
            .iter()
            .map(|_| {
                DMatrix::from_row_slice(2, 2, &[c(r, 0.0), c(g, 0.0), c(g, 0.0), c(r, 0.0)])
            })
            .collect();
        Network::new(freq, s, vec![50.0, 50.0]).unwrap()
    }

    #[test]
    fn test_new_rejects_non_monotonic_frequency() {
        let s = vec![
            DMatrix::from_element(1, 1, c(0.0, 0.0)),
            DMatrix::from_element(1, 1, c(0.0, 0.0)),
        ];
        let err = Network::new(vec![2.0, 1.0], s, vec![50.0]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_new_rejects_non_finite_frequency() {
        let s = vec![
            DMatrix::from_element(1, 1, c(0.0, 0.0)),
            DMatrix::from_element(1, 1, c(0.0, 0.0)),
        ];
        let err = Network::new(vec![1.0, f64::NAN], s, vec![50.0]).unwrap_err();
        assert!(matches!(err, Error::Grid(_)));
    }

    #[test]
    fn test_new_rejects_inconsistent_dims() {
        let s = vec![
            DMatrix::from_element(2, 2, c(0.0, 0.0)),
            DMatrix::from_element(1, 1, c(0.0, 0.0)),
        ];
        let err = Network::new(vec![1.0, 2.0], s, vec![50.0, 50.0]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_z_of_matched_port() {
        // S = 0 everywhere => Z = z0 on the diagonal
        let s = vec![DMatrix::from_element(1, 1, c(0.0, 0.0))];
        let nw = Network::new(vec![1e6], s, vec![50.0]).unwrap();
        let z = nw.z_mag(0, 0).unwrap();
        assert!((z[0] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_z_of_known_reflection() {
        // Gamma for a 25 ohm load on a 50 ohm system: (25-50)/(25+50) = -1/3
        let s = vec![DMatrix::from_element(1, 1, c(-1.0 / 3.0, 0.0))];
        let nw = Network::new(vec![1e6], s, vec![50.0]).unwrap();
        let z = nw.z_mag(0, 0).unwrap();
        assert!((z[0] - 25.0).abs() < 1e-9, "z = {}", z[0]);
    }

    #[test]
    fn test_s_db_flat_minus_3db() {
        let g = 10f64.powf(-3.0103 / 20.0);
        let nw = symmetric_two_port(vec![1e6, 1e9], 0.0, g);
        let db = nw.s_db(1, 0).unwrap();
        for v in db {
            assert!((v + 3.0103).abs() < 1e-6);
        }
    }

    #[test]
    fn test_renumber_swaps_ports() {
        let s = vec![DMatrix::from_row_slice(
            2,
            2,
            &[c(0.1, 0.0), c(0.2, 0.0), c(0.3, 0.0), c(0.4, 0.0)],
        )];
        let nw = Network::new(vec![1e6], s, vec![50.0, 75.0]).unwrap();
        let swapped = nw.renumber(&[0, 1], &[1, 0]).unwrap();
        assert_eq!(swapped.s_at(0)[(0, 0)], c(0.4, 0.0));
        assert_eq!(swapped.s_at(0)[(1, 1)], c(0.1, 0.0));
        assert_eq!(swapped.s_at(0)[(0, 1)], c(0.3, 0.0));
        assert_eq!(swapped.z0()[0], 75.0);
    }

    #[test]
    fn test_renumber_rejects_bad_permutation() {
        let nw = symmetric_two_port(vec![1e6], 0.0, 0.5);
        assert!(nw.renumber(&[0, 0], &[0, 1]).is_err());
        assert!(nw.renumber(&[0], &[0, 1]).is_err());
    }

    #[test]
    fn test_connect_short_reduces_port_count() {
        let nw = symmetric_two_port(vec![1e6, 1e9], 0.0, 0.5);
        let reduced = nw.connect_short(1).unwrap();
        assert_eq!(reduced.nports(), 1);
        assert_eq!(reduced.nfreq(), 2);
        // Shorting a coupled port must change the remaining self term:
        // S'11 = S11 - S12*S21/(1 + S22) = 0 - 0.25/1 = -0.25
        let s11 = reduced.s_at(0)[(0, 0)];
        assert!((s11.re + 0.25).abs() < 1e-12, "s11 = {}", s11);
    }

    #[test]
    fn test_connect_short_decoupled_port_is_noop_for_rest() {
        // Two fully decoupled ports
        let nw = symmetric_two_port(vec![1e6], 0.2, 0.0);
        let reduced = nw.connect_short(1).unwrap();
        assert_eq!(reduced.s_at(0)[(0, 0)], c(0.2, 0.0));
    }

    #[test]
    fn test_extrapolate_to_dc_linear() {
        let s = vec![
            DMatrix::from_element(1, 1, c(0.2, 0.0)),
            DMatrix::from_element(1, 1, c(0.4, 0.0)),
        ];
        let nw = Network::new(vec![1e6, 2e6], s, vec![50.0]).unwrap();
        let with_dc = nw.extrapolate_to_dc();
        assert_eq!(with_dc.nfreq(), 3);
        assert_eq!(with_dc.freq()[0], 0.0);
        // Linear extension of 0.2 @ 1 MHz, 0.4 @ 2 MHz back to 0 Hz: 0.0
        assert!((with_dc.s_at(0)[(0, 0)].re - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolate_to_dc_identity_when_present() {
        let s = vec![DMatrix::from_element(1, 1, c(0.2, 0.0))];
        let nw = Network::new(vec![0.0], s, vec![50.0]).unwrap();
        assert_eq!(nw.extrapolate_to_dc().nfreq(), 1);
    }

    #[test]
    fn test_resample_linear_midpoint() {
        let s = vec![
            DMatrix::from_element(1, 1, c(0.0, 0.0)),
            DMatrix::from_element(1, 1, c(1.0, 0.0)),
        ];
        let nw = Network::new(vec![0.0, 2e6], s, vec![50.0]).unwrap();
        let re = nw.resample(&[0.0, 1e6, 2e6]).unwrap();
        assert_eq!(re.nfreq(), 3);
        assert!((re.s_at(1)[(0, 0)].re - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_resample_rejects_unsorted_grid() {
        let nw = symmetric_two_port(vec![1e6, 1e9], 0.0, 0.5);
        assert!(nw.resample(&[1e9, 1e6]).is_err());
    }

    #[test]
    fn test_port_index_out_of_range() {
        let nw = symmetric_two_port(vec![1e6], 0.0, 0.5);
        assert!(matches!(
            nw.s_db(2, 0),
            Err(Error::PortIndex { index: 2, nports: 2 })
        ));
    }
}
