//! Frequency grid helpers.

/// Generate a uniform linear grid from 0 Hz up to (and just past) `fmax`.
///
/// Matches the convention used before time-domain conversion: points at
/// `0, step, 2*step, ...` where the last point lies in `[fmax, fmax + step)`.
pub fn linear_grid(step: f64, fmax: f64) -> Vec<f64> {
    assert!(step > 0.0, "grid step must be positive");
    let mut grid = Vec::new();
    let mut k = 0u64;
    loop {
        let f = k as f64 * step;
        grid.push(f);
        if f >= fmax {
            break;
        }
        k += 1;
    }
    grid
}

/// Check whether a frequency grid is uniformly spaced (within a relative
/// tolerance of the nominal step).
pub fn is_uniform(freq: &[f64]) -> bool {
    if freq.len() < 3 {
        return true;
    }
    let step = freq[1] - freq[0];
    if step <= 0.0 {
        return false;
    }
    freq.windows(2)
        .all(|w| ((w[1] - w[0]) - step).abs() <= step * 1e-6)
}

/// Unwrap a phase sequence (radians) by removing 2π jumps between
/// consecutive samples.
pub fn unwrap_phase(phases: &[f64]) -> Vec<f64> {
    use std::f64::consts::PI;

    let mut out: Vec<f64> = Vec::with_capacity(phases.len());
    let mut offset = 0.0;
    for (k, &p) in phases.iter().enumerate() {
        if k > 0 {
            let jump = p + offset - out[k - 1];
            if jump > PI {
                offset -= 2.0 * PI * ((jump + PI) / (2.0 * PI)).floor();
            } else if jump < -PI {
                offset += 2.0 * PI * ((-jump + PI) / (2.0 * PI)).floor();
            }
        }
        out.push(p + offset);
    }
    out
}

/// Index of the grid sample nearest to `target`.
///
/// The grid must be non-empty and sorted ascending.
pub fn nearest_index(freq: &[f64], target: f64) -> usize {
    debug_assert!(!freq.is_empty());
    match freq.binary_search_by(|f| f.partial_cmp(&target).unwrap()) {
        Ok(i) => i,
        Err(i) => {
            if i == 0 {
                0
            } else if i >= freq.len() {
                freq.len() - 1
            } else if (target - freq[i - 1]) <= (freq[i] - target) {
                i - 1
            } else {
                i
            }
        }
    }
}
