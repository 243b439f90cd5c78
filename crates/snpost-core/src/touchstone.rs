//! Touchstone (.sNp) file parsing and writing.
//!
//! Supports version-1 files with S-parameters in RI, MA, or DB format and
//! Hz/kHz/MHz/GHz frequency units. The port count comes from the extension
//! digit, e.g. `.s4p` is a 4-port file.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use nalgebra::DMatrix;
use num_complex::Complex;

use crate::error::{Error, Result};
use crate::network::Network;
use crate::units;

type C64 = Complex<f64>;

/// Number format of the complex entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueFormat {
    /// Real/imaginary pairs.
    Ri,
    /// Magnitude/angle-in-degrees pairs.
    Ma,
    /// dB-magnitude/angle-in-degrees pairs.
    Db,
}

/// Infer the port count from a Touchstone file extension.
pub fn ports_from_extension<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| {
            Error::Format(format!("{} has no Touchstone extension", path.display()))
        })?
        .to_ascii_lowercase();
    let digits = ext
        .strip_prefix('s')
        .and_then(|rest| rest.strip_suffix('p'))
        .ok_or_else(|| {
            Error::Format(format!(
                "{} is not a .sNp Touchstone file",
                path.display()
            ))
        })?;
    let nports: usize = digits
        .parse()
        .map_err(|_| Error::Format(format!("bad port count in extension .{}", ext)))?;
    if nports == 0 {
        return Err(Error::Format("Touchstone port count cannot be 0".into()));
    }
    Ok(nports)
}

/// Load a network from a Touchstone file on disk.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
    let path = path.as_ref();
    let nports = ports_from_extension(path)?;
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content, nports)
}

/// Parse Touchstone file content with a known port count.
pub fn parse(content: &str, nports: usize) -> Result<Network> {
    // Touchstone v1 defaults apply when no option line is present.
    let mut freq_mult = 1e9;
    let mut format = ValueFormat::Ma;
    let mut z0_ref = 50.0;
    let mut saw_options = false;

    let mut values: Vec<f64> = Vec::new();
    let mut z0_ports: Option<Vec<f64>> = None;

    for raw_line in content.lines() {
        // Per-port reference impedances ride in a comment annotation; the
        // option line's single R value cannot express them.
        if let Some(rest) = raw_line.trim().strip_prefix('!') {
            if let Some(vals) = rest.trim().strip_prefix("Port Impedance") {
                z0_ports = Some(parse_port_impedances(vals, nports)?);
            }
            continue;
        }
        let line = match raw_line.find('!') {
            Some(pos) => &raw_line[..pos],
            None => raw_line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('#') {
            if saw_options {
                // Only the first option line counts in v1 files.
                continue;
            }
            saw_options = true;
            parse_option_line(rest, &mut freq_mult, &mut format, &mut z0_ref)?;
            continue;
        }
        if line.starts_with('[') {
            return Err(Error::Format(
                "Touchstone v2 keyword sections are not supported".into(),
            ));
        }
        for token in line.split_whitespace() {
            let v: f64 = token
                .parse()
                .map_err(|_| Error::Format(format!("bad numeric token: {:?}", token)))?;
            if !v.is_finite() {
                return Err(Error::Format(format!(
                    "non-finite data value: {:?}",
                    token
                )));
            }
            values.push(v);
        }
    }

    let per_sample = 1 + 2 * nports * nports;
    if values.is_empty() || values.len() % per_sample != 0 {
        return Err(Error::Format(format!(
            "expected a multiple of {} values for a {}-port file, got {}",
            per_sample,
            nports,
            values.len()
        )));
    }

    let nfreq = values.len() / per_sample;
    let mut freq = Vec::with_capacity(nfreq);
    let mut s = Vec::with_capacity(nfreq);
    for k in 0..nfreq {
        let chunk = &values[k * per_sample..(k + 1) * per_sample];
        freq.push(chunk[0] * freq_mult);
        let mut m = DMatrix::from_element(nports, nports, C64::new(0.0, 0.0));
        for e in 0..nports * nports {
            let a = chunk[1 + 2 * e];
            let b = chunk[2 + 2 * e];
            // 2-port files order the data S11 S21 S12 S22; every other size
            // is row-major.
            let (i, j) = if nports == 2 {
                (e % 2, e / 2)
            } else {
                (e / nports, e % nports)
            };
            m[(i, j)] = decode_value(a, b, format);
        }
        s.push(m);
    }

    let z0 = z0_ports.unwrap_or_else(|| vec![z0_ref; nports]);
    Network::new(freq, s, z0)
}

/// Parse a `! Port Impedance` annotation: either one real value per port,
/// or real/imaginary pairs (the imaginary parts are dropped).
fn parse_port_impedances(vals: &str, nports: usize) -> Result<Vec<f64>> {
    let parsed = vals
        .split_whitespace()
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| Error::Format(format!("bad port impedance token: {:?}", t)))
        })
        .collect::<Result<Vec<f64>>>()?;
    let z0 = if parsed.len() == nports {
        parsed
    } else if parsed.len() == 2 * nports {
        parsed.iter().step_by(2).copied().collect()
    } else {
        return Err(Error::Format(format!(
            "port impedance annotation has {} values for a {}-port file",
            parsed.len(),
            nports
        )));
    };
    if z0.iter().any(|z| !z.is_finite() || *z <= 0.0) {
        return Err(Error::Format(
            "port impedances must be positive and finite".into(),
        ));
    }
    Ok(z0)
}

fn parse_option_line(
    rest: &str,
    freq_mult: &mut f64,
    format: &mut ValueFormat,
    z0_ref: &mut f64,
) -> Result<()> {
    let mut tokens = rest.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        let upper = token.to_ascii_uppercase();
        if let Some(mult) = units::frequency_multiplier(&upper) {
            *freq_mult = mult;
        } else {
            match upper.as_str() {
                "S" => {}
                "Z" | "Y" | "H" | "G" => {
                    return Err(Error::Format(format!(
                        "only S-parameter Touchstone files are supported, got {}",
                        upper
                    )));
                }
                "RI" => *format = ValueFormat::Ri,
                "MA" => *format = ValueFormat::Ma,
                "DB" => *format = ValueFormat::Db,
                "R" => {
                    let v = tokens.next().ok_or_else(|| {
                        Error::Format("option line R has no impedance value".into())
                    })?;
                    *z0_ref = v.parse().map_err(|_| {
                        Error::Format(format!("bad reference impedance: {:?}", v))
                    })?;
                }
                other => {
                    return Err(Error::Format(format!(
                        "unrecognized option-line token: {:?}",
                        other
                    )));
                }
            }
        }
    }
    Ok(())
}

fn decode_value(a: f64, b: f64, format: ValueFormat) -> C64 {
    match format {
        ValueFormat::Ri => C64::new(a, b),
        ValueFormat::Ma => C64::from_polar(a, b.to_radians()),
        ValueFormat::Db => C64::from_polar(10f64.powf(a / 20.0), b.to_radians()),
    }
}

/// Write a network as a version-1 Touchstone file in RI format, Hz units.
pub fn write<P: AsRef<Path>>(network: &Network, path: P) -> Result<()> {
    let path = path.as_ref();
    let n = network.nports();
    let mut out = String::new();
    let _ = writeln!(out, "! {}-port S-parameter data", n);
    let _ = writeln!(out, "# HZ S RI R {}", network.z0()[0]);
    // The option line carries one impedance; mixed-mode networks have
    // per-port values (2x on differential ports, x/2 on common), so those
    // go in an annotation the parser restores.
    if network.z0().iter().any(|&z| z != network.z0()[0]) {
        let _ = write!(out, "! Port Impedance");
        for z in network.z0() {
            let _ = write!(out, " {}", z);
        }
        out.push('\n');
    }
    for k in 0..network.nfreq() {
        let m = network.s_at(k);
        let _ = write!(out, "{:.6e}", network.freq()[k]);
        if n == 2 {
            // 2-port data order is S11 S21 S12 S22
            for (i, j) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let v = m[(i, j)];
                let _ = write!(out, " {:.9e} {:.9e}", v.re, v.im);
            }
            out.push('\n');
        } else {
            for i in 0..n {
                for j in 0..n {
                    let v = m[(i, j)];
                    let _ = write!(out, " {:.9e} {:.9e}", v.re, v.im);
                    // Keep rows readable: at most four pairs per line.
                    if (j + 1) % 4 == 0 && j + 1 < n {
                        out.push('\n');
                    }
                }
                if i + 1 < n {
                    out.push('\n');
                }
            }
            out.push('\n');
        }
    }
    fs::write(path, out).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_from_extension() {
        assert_eq!(ports_from_extension("a/b/model.s1p").unwrap(), 1);
        assert_eq!(ports_from_extension("model.s2p").unwrap(), 2);
        assert_eq!(ports_from_extension("MODEL.S12P").unwrap(), 12);
        assert!(ports_from_extension("model.txt").is_err());
        assert!(ports_from_extension("model").is_err());
    }

    #[test]
    fn test_parse_s1p_ri() {
        let content = "\
! simple one-port
# HZ S RI R 50
1.0e6 0.5 0.0
2.0e6 0.25 -0.25
";
        let nw = parse(content, 1).unwrap();
        assert_eq!(nw.nports(), 1);
        assert_eq!(nw.nfreq(), 2);
        assert_eq!(nw.freq()[1], 2.0e6);
        assert_eq!(nw.s_at(1)[(0, 0)], C64::new(0.25, -0.25));
        assert_eq!(nw.z0()[0], 50.0);
    }

    #[test]
    fn test_parse_s2p_column_order() {
        // S11=0.1, S21=0.2, S12=0.3, S22=0.4
        let content = "# MHZ S RI R 50\n1.0 0.1 0 0.2 0 0.3 0 0.4 0\n";
        let nw = parse(content, 2).unwrap();
        assert_eq!(nw.freq()[0], 1.0e6);
        assert_eq!(nw.s_at(0)[(0, 0)].re, 0.1);
        assert_eq!(nw.s_at(0)[(1, 0)].re, 0.2);
        assert_eq!(nw.s_at(0)[(0, 1)].re, 0.3);
        assert_eq!(nw.s_at(0)[(1, 1)].re, 0.4);
    }

    #[test]
    fn test_parse_ma_format() {
        let content = "# GHZ S MA R 75\n1.0 0.5 90.0\n";
        let nw = parse(content, 1).unwrap();
        assert_eq!(nw.freq()[0], 1.0e9);
        let v = nw.s_at(0)[(0, 0)];
        assert!(v.re.abs() < 1e-12);
        assert!((v.im - 0.5).abs() < 1e-12);
        assert_eq!(nw.z0()[0], 75.0);
    }

    #[test]
    fn test_parse_db_format() {
        let content = "# HZ S DB R 50\n1.0e6 -6.0206 0.0\n";
        let nw = parse(content, 1).unwrap();
        let v = nw.s_at(0)[(0, 0)];
        assert!((v.re - 0.5).abs() < 1e-4, "re = {}", v.re);
    }

    #[test]
    fn test_parse_multiline_s4p_rows() {
        // One frequency sample of a 4-port, rows on separate lines
        let mut content = String::from("# HZ S RI R 50\n1.0e9");
        for i in 0..4 {
            for j in 0..4 {
                content.push_str(&format!(" {}.0 0.0", i * 4 + j));
            }
            content.push('\n');
        }
        let nw = parse(&content, 4).unwrap();
        assert_eq!(nw.s_at(0)[(2, 3)].re, 11.0);
        assert_eq!(nw.s_at(0)[(0, 0)].re, 0.0);
    }

    #[test]
    fn test_parse_rejects_truncated_data() {
        let content = "# HZ S RI R 50\n1.0e6 0.5\n";
        assert!(matches!(parse(content, 2), Err(Error::Format(_))));
    }

    #[test]
    fn test_parse_rejects_non_s_parameters() {
        let content = "# HZ Z RI R 50\n1.0e6 0.5 0.0\n";
        assert!(matches!(parse(content, 1), Err(Error::Format(_))));
    }

    #[test]
    fn test_parse_rejects_decreasing_frequency() {
        let content = "# HZ S RI R 50\n2.0e6 0.5 0.0\n1.0e6 0.5 0.0\n";
        assert!(parse(content, 1).is_err());
    }

    #[test]
    fn test_parse_port_impedance_annotation() {
        let content = "\
# HZ S RI R 50
! Port Impedance 100 100 25 25
1.0e6 0.1 0 0.2 0 0.3 0 0.4 0 0.5 0 0.6 0 0.7 0 0.8 0 0.9 0 1.0 0 1.1 0 1.2 0 1.3 0 1.4 0 1.5 0 1.6 0
";
        let nw = parse(content, 4).unwrap();
        assert_eq!(nw.z0(), &[100.0, 100.0, 25.0, 25.0]);
    }

    #[test]
    fn test_parse_port_impedance_pairs() {
        // Real/imaginary pairs; imaginary parts dropped
        let content = "# HZ S RI R 50\n! Port Impedance 100 0 25 0\n1.0e6 0.1 0 0.2 0 0.3 0 0.4 0\n";
        let nw = parse(content, 2).unwrap();
        assert_eq!(nw.z0(), &[100.0, 25.0]);
    }

    #[test]
    fn test_parse_rejects_wrong_impedance_count() {
        let content = "# HZ S RI R 50\n! Port Impedance 100 25 50\n1.0e6 0.1 0 0.2 0 0.3 0 0.4 0\n";
        assert!(matches!(parse(content, 2), Err(Error::Format(_))));
    }

    #[test]
    fn test_parse_rejects_non_finite_data() {
        for bad in ["NaN", "inf", "-inf"] {
            let content = format!("# HZ S RI R 50\n1.0e6 {} 0.0\n", bad);
            assert!(
                matches!(parse(&content, 1), Err(Error::Format(_))),
                "token {:?} must be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_write_preserves_per_port_impedance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mm.s4p");

        let freq = vec![1.0e6, 2.0e6];
        let s: Vec<_> = freq
            .iter()
            .map(|_| DMatrix::from_element(4, 4, C64::new(0.1, 0.0)))
            .collect();
        let nw = Network::new(freq, s, vec![100.0, 100.0, 25.0, 25.0]).unwrap();
        write(&nw, &path).unwrap();

        let back = load(&path).unwrap();
        assert_eq!(back.z0(), &[100.0, 100.0, 25.0, 25.0]);
    }

    #[test]
    fn test_write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rt.s2p");

        let content = "# HZ S RI R 50\n1.0e6 0.1 0.01 0.2 0.02 0.3 0.03 0.4 0.04\n\
                       2.0e6 0.5 0.0 0.6 0.0 0.7 0.0 0.8 0.0\n";
        let nw = parse(content, 2).unwrap();
        write(&nw, &path).unwrap();

        let back = load(&path).unwrap();
        assert_eq!(back.nports(), 2);
        assert_eq!(back.nfreq(), 2);
        for k in 0..2 {
            for i in 0..2 {
                for j in 0..2 {
                    let a = nw.s_at(k)[(i, j)];
                    let b = back.s_at(k)[(i, j)];
                    assert!((a - b).norm() < 1e-9);
                }
            }
        }
    }
}
