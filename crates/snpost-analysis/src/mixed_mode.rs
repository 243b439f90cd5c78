//! Single-ended to mixed-mode conversion and quadrant splitting.
//!
//! A 2N-port single-ended network whose ports have been renumbered so each
//! differential pair occupies adjacent positions (p1+, p1-, p2+, p2-, ...)
//! converts to a mixed-mode network of the same size: the first N ports
//! carry the differential modes, the last N the common modes.

use nalgebra::DMatrix;
use num_complex::Complex;
use snpost_core::Network;

use crate::error::{Error, Result};

type C64 = Complex<f64>;

/// Convert a single-ended network to mixed-mode.
///
/// `se_to_mm_order` is the explicit port permutation (0-based) that places
/// the members of each differential pair adjacently: the single-ended port
/// at position `k` moves to position `se_to_mm_order[k]` before the modal
/// transform is applied. Pairing is never inferred; the caller owns the
/// physical pair assignment.
pub fn to_mixed_mode(network: &Network, se_to_mm_order: &[usize]) -> Result<Network> {
    let nports = network.nports();
    if nports % 2 != 0 {
        return Err(Error::OddPortCount(nports));
    }
    let identity: Vec<usize> = (0..nports).collect();
    let ordered = network.renumber(&identity, se_to_mm_order)?;

    let p = nports / 2;
    let inv_sqrt2 = 1.0 / 2f64.sqrt();

    // Orthonormal modal matrix: row k is the differential combination of
    // pair k, row p + k the common combination.
    let mut m = DMatrix::from_element(nports, nports, C64::new(0.0, 0.0));
    for k in 0..p {
        m[(k, 2 * k)] = C64::new(inv_sqrt2, 0.0);
        m[(k, 2 * k + 1)] = C64::new(-inv_sqrt2, 0.0);
        m[(p + k, 2 * k)] = C64::new(inv_sqrt2, 0.0);
        m[(p + k, 2 * k + 1)] = C64::new(inv_sqrt2, 0.0);
    }
    let m_t = m.transpose();

    let s = (0..ordered.nfreq())
        .map(|k| &m * ordered.s_at(k) * &m_t)
        .collect();

    // Differential modes see twice the single-ended reference impedance,
    // common modes half of it.
    let mut z0 = Vec::with_capacity(nports);
    for k in 0..p {
        z0.push(2.0 * ordered.z0()[2 * k]);
    }
    for k in 0..p {
        z0.push(ordered.z0()[2 * k] / 2.0);
    }

    Ok(Network::new(ordered.freq().to_vec(), s, z0)?)
}

/// Split a mixed-mode network into its four quadrants
/// (diff-diff, diff-common, common-diff, common-common).
///
/// Pure index slicing; no values are recomputed.
pub fn split_quadrants(network: &Network) -> Result<(Network, Network, Network, Network)> {
    let nports = network.nports();
    if nports % 2 != 0 {
        return Err(Error::OddPortCount(nports));
    }
    let p = nports / 2;
    let diff: Vec<usize> = (0..p).collect();
    let comm: Vec<usize> = (p..nports).collect();

    let dd = network.subnetwork(&diff, &diff)?;
    let dc = network.subnetwork(&diff, &comm)?;
    let cd = network.subnetwork(&comm, &diff)?;
    let cc = network.subnetwork(&comm, &comm)?;
    Ok((dd, dc, cd, cc))
}
