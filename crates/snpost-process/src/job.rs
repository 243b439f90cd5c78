//! One Touchstone file plus the configuration needed to post-process it.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;
use snpost_analysis::{
    extract_rlc, prepare_for_tdr, split_quadrants, to_mixed_mode, z_time_step,
    DEFAULT_TDR_STEP_HZ,
};
use snpost_core::Network;
use snpost_plot::{plot_impedance_magnitude, plot_s_parameter_db, plot_time_domain_step, Curve};

use serde::{Deserialize, Serialize};

use crate::connectivity::Connectivity;
use crate::error::{Error, Result};
use crate::result::{KeyResult, MetricResult, Quadrant};
use crate::spec::{ProcessKey, SpecType};

/// One parsed input row: a Touchstone file and the simulation key naming it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub file_path: PathBuf,
    pub key_name: String,
}

/// A single post-processing job: the Touchstone file, the simulation key it
/// belongs to, where plots go, and what to run on it.
#[derive(Debug, Clone)]
pub struct SnpJob {
    /// Path to the .sNp file.
    pub file_path: PathBuf,
    /// Simulation key, used as the prefix of every plot title and filename.
    pub key_name: String,
    /// Directory receiving the rendered plot images.
    pub plot_dir: PathBuf,
    /// Ordered post-processing keys to run.
    pub spec_type: SpecType,
    /// Port roles for each metric.
    pub connectivity: Connectivity,
}

impl SnpJob {
    pub fn new(
        file_path: impl Into<PathBuf>,
        key_name: impl Into<String>,
        plot_dir: impl Into<PathBuf>,
        spec_type: SpecType,
        connectivity: Connectivity,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            key_name: key_name.into(),
            plot_dir: plot_dir.into(),
            spec_type,
            connectivity,
        }
    }

    /// Build one job per record, all sharing the same plot directory, spec
    /// type, and connectivity. The usual shape of a simulation batch: many
    /// extracted files, one configuration.
    pub fn from_records(
        records: &[JobRecord],
        plot_dir: impl Into<PathBuf>,
        spec_type: &SpecType,
        connectivity: &Connectivity,
    ) -> Vec<SnpJob> {
        let plot_dir = plot_dir.into();
        records
            .iter()
            .map(|r| {
                SnpJob::new(
                    &r.file_path,
                    &r.key_name,
                    &plot_dir,
                    spec_type.clone(),
                    connectivity.clone(),
                )
            })
            .collect()
    }

    /// Run every requested post-processing key in order.
    ///
    /// Loads the network once, validates the connectivity against its port
    /// count, and derives the mixed-mode network once if any key needs it.
    /// Returns one [`KeyResult`] per key, in request order.
    pub fn auto_process(&self) -> Result<IndexMap<ProcessKey, KeyResult>> {
        info!("post-processing {}", self.file_path.display());
        let network = Network::from_touchstone(&self.file_path)?;
        self.connectivity.validate(network.nports())?;
        fs::create_dir_all(&self.plot_dir).map_err(|e| Error::Io {
            path: self.plot_dir.display().to_string(),
            source: e,
        })?;

        let mixed = if self.spec_type.needs_mixed_mode() {
            let key = self
                .spec_type
                .post_process_keys
                .iter()
                .copied()
                .find(|k| k.is_mixed_mode())
                .unwrap_or(ProcessKey::IlMm);
            Some(self.mixed_mode_network(&network, key)?)
        } else {
            None
        };

        let mut out = IndexMap::new();
        for &key in &self.spec_type.post_process_keys {
            let result = match key {
                ProcessKey::ZOpen => KeyResult::Single(self.z_self(&network, key, false)?),
                ProcessKey::ZShort => KeyResult::Single(self.z_self(&network, key, true)?),
                ProcessKey::Il => KeyResult::Single(self.insertion_loss(&network, key, "S")?),
                ProcessKey::Rl => KeyResult::Single(self.return_loss(&network, key, "S")?),
                ProcessKey::IlMm => {
                    let mm = require_mixed(&mixed, key)?;
                    let (dd, dc, cd, cc) = split_quadrants(mm)?;
                    let mut map = IndexMap::new();
                    map.insert(
                        Quadrant::Dd,
                        self.insertion_loss(&dd, key, Quadrant::Dd.s_header())?,
                    );
                    map.insert(
                        Quadrant::Cc,
                        self.insertion_loss(&cc, key, Quadrant::Cc.s_header())?,
                    );
                    map.insert(
                        Quadrant::Dc,
                        self.insertion_loss(&dc, key, Quadrant::Dc.s_header())?,
                    );
                    map.insert(
                        Quadrant::Cd,
                        self.insertion_loss(&cd, key, Quadrant::Cd.s_header())?,
                    );
                    KeyResult::MixedMode(map)
                }
                ProcessKey::RlMm => {
                    let mm = require_mixed(&mixed, key)?;
                    let (dd, _, _, cc) = split_quadrants(mm)?;
                    let mut map = IndexMap::new();
                    map.insert(
                        Quadrant::Dd,
                        self.return_loss(&dd, key, Quadrant::Dd.s_header())?,
                    );
                    map.insert(
                        Quadrant::Cc,
                        self.return_loss(&cc, key, Quadrant::Cc.s_header())?,
                    );
                    KeyResult::MixedMode(map)
                }
                ProcessKey::Tdr => KeyResult::Single(self.tdr_step(&network, key, "SE", 0)?),
                ProcessKey::TdrMm => {
                    let mm = require_mixed(&mixed, key)?;
                    let half = mm.nports() / 2;
                    let mut map = IndexMap::new();
                    map.insert(Quadrant::Dd, self.tdr_step(mm, key, "DD", 0)?);
                    map.insert(Quadrant::Cc, self.tdr_step(mm, key, "CC", half)?);
                    KeyResult::MixedMode(map)
                }
            };
            out.insert(key, result);
        }
        Ok(out)
    }

    /// Convert to mixed-mode per the configured port ordering and persist the
    /// converted network to a `Mixed_Mode/` directory beside the source file.
    fn mixed_mode_network(&self, network: &Network, key: ProcessKey) -> Result<Network> {
        let order = self
            .connectivity
            .mm_order
            .as_ref()
            .ok_or(Error::MissingConnectivity {
                key,
                section: "MM_ORDER_IN_SE",
            })?;
        let order0: Vec<usize> = order.iter().map(|p| p - 1).collect();
        let mm = to_mixed_mode(network, &order0)?;

        let parent = self.file_path.parent().unwrap_or(Path::new("."));
        let mm_dir = parent.join("Mixed_Mode");
        fs::create_dir_all(&mm_dir).map_err(|e| Error::Io {
            path: mm_dir.display().to_string(),
            source: e,
        })?;
        let stem = self
            .file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("network");
        let ext = self
            .file_path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("snp");
        let mm_path = mm_dir.join(format!("{stem}_mm.{ext}"));
        mm.write_touchstone(&mm_path)?;
        info!("wrote mixed-mode network to {}", mm_path.display());
        Ok(mm)
    }

    fn title(&self, key: ProcessKey, suffix: &str) -> String {
        format!("{}__{}{}", self.key_name, key.as_str(), suffix)
    }

    fn fig_path(&self, title: &str) -> PathBuf {
        self.plot_dir.join(format!("{title}.png"))
    }

    /// Self-impedance plots plus R/L/C report fields, one per observation
    /// port. With `shorted` the sense ports (everything past the observation
    /// ports) are folded in as short terminations, highest index first, and
    /// the fields report R and L; open fields report L and C.
    fn z_self(&self, network: &Network, key: ProcessKey, shorted: bool) -> Result<Vec<MetricResult>> {
        let plot_ports = self.connectivity.zin.len();
        if plot_ports == 0 {
            return Err(Error::MissingConnectivity {
                key,
                section: "ZIN",
            });
        }
        let network = if shorted {
            let mut reduced = network.clone();
            for port in (plot_ports..network.nports()).rev() {
                reduced = reduced.connect_short(port)?;
            }
            reduced
        } else {
            network.clone()
        };

        let freq_ghz = network.freq_ghz();
        let mut results = Vec::with_capacity(plot_ports);
        for port in 0..plot_ports {
            let title = self.title(key, &format!("_Port{}", port + 1));
            let path = self.fig_path(&title);
            let curve = Curve::new(freq_ghz.clone(), network.z_mag(port, port)?);
            plot_impedance_magnitude(&[curve], &title, &path)?;

            let rlc = extract_rlc(&network, port)?;
            // Report units: milliohm, picohenry, nanofarad.
            let fields = if shorted {
                vec![
                    format!("{:.2}", rlc.r_dc * 1e3),
                    format!("{:.2}", rlc.l_hf * 1e12),
                    String::new(),
                ]
            } else {
                vec![
                    String::new(),
                    format!("{:.2}", rlc.l_hf * 1e12),
                    format!("{:.2}", rlc.c_lf * 1e9),
                ]
            };
            results.push(MetricResult::with_fields(title, path, fields).flag_degraded(rlc.degraded));
        }
        Ok(results)
    }

    /// All configured insertion-loss paths on one figure.
    fn insertion_loss(
        &self,
        network: &Network,
        key: ProcessKey,
        header: &str,
    ) -> Result<Vec<MetricResult>> {
        if self.connectivity.il.is_empty() {
            return Err(Error::MissingConnectivity { key, section: "IL" });
        }
        let freq_ghz = network.freq_ghz();
        let mut curves = Vec::with_capacity(self.connectivity.il.len());
        for pair in &self.connectivity.il {
            let db = network.s_db(pair.output - 1, pair.input - 1)?;
            curves.push(Curve::with_label(freq_ghz.clone(), db, pair.label(header)));
        }
        let title = self.title(key, &format!("__{header}"));
        let path = self.fig_path(&title);
        plot_s_parameter_db(&curves, &title, &path)?;
        Ok(vec![MetricResult::new(title, path)])
    }

    /// All configured return-loss self terms on one figure.
    fn return_loss(
        &self,
        network: &Network,
        key: ProcessKey,
        header: &str,
    ) -> Result<Vec<MetricResult>> {
        if self.connectivity.rl.is_empty() {
            return Err(Error::MissingConnectivity { key, section: "RL" });
        }
        let freq_ghz = network.freq_ghz();
        let mut curves = Vec::with_capacity(self.connectivity.rl.len());
        for &p in &self.connectivity.rl {
            let db = network.s_db(p - 1, p - 1)?;
            curves.push(Curve::with_label(freq_ghz.clone(), db, format!("{header}{p}{p}")));
        }
        let title = self.title(key, &format!("__{header}"));
        let path = self.fig_path(&title);
        plot_s_parameter_db(&curves, &title, &path)?;
        Ok(vec![MetricResult::new(title, path)])
    }

    /// Time-domain step impedance for each configured port, one figure per
    /// side. `port_offset` shifts the configured ports, which for the
    /// common-mode view of a mixed-mode network is half the port count.
    fn tdr_step(
        &self,
        network: &Network,
        key: ProcessKey,
        header: &str,
        port_offset: usize,
    ) -> Result<Vec<MetricResult>> {
        let sides = self
            .connectivity
            .tdr
            .as_ref()
            .ok_or(Error::MissingConnectivity {
                key,
                section: "TDR",
            })?;
        let prepared = prepare_for_tdr(network, DEFAULT_TDR_STEP_HZ)?;

        let mut results = Vec::with_capacity(2);
        for (side, ports) in [("Left", &sides.left), ("Right", &sides.right)] {
            if ports.is_empty() {
                continue;
            }
            let mut curves = Vec::with_capacity(ports.len());
            for &p in ports {
                let port = p + port_offset;
                let step = z_time_step(&prepared, port - 1)?;
                let time_ns: Vec<f64> = step.time.iter().map(|t| t * 1e9).collect();
                curves.push(Curve::with_label(time_ns, step.impedance, format!("Port_{port}")));
            }
            let title = self.title(key, &format!("__{header}_{side}"));
            let path = self.fig_path(&title);
            plot_time_domain_step(&curves, &title, &path)?;
            results.push(MetricResult::new(title, path));
        }
        Ok(results)
    }
}

fn require_mixed<'a>(mixed: &'a Option<Network>, key: ProcessKey) -> Result<&'a Network> {
    mixed.as_ref().ok_or(Error::MissingConnectivity {
        key,
        section: "MM_ORDER_IN_SE",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::PortPair;

    /// Flat 2-port: S11 = S22 = -40 dB, S21 = S12 = -3 dB.
    fn write_flat_s2p(dir: &Path) -> PathBuf {
        let path = dir.join("flat.s2p");
        let mut text = String::from("# GHZ S DB R 50\n");
        for k in 1..=10 {
            let f = k as f64 * 0.1;
            text.push_str(&format!("{f} -40 0 -3 0 -3 0 -40 0\n"));
        }
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_il_and_rl_produce_one_figure_each() {
        let dir = tempfile::tempdir().unwrap();
        let snp = write_flat_s2p(dir.path());
        let job = SnpJob::new(
            &snp,
            "pcie_tx0",
            dir.path().join("plots"),
            SpecType::from_key_names("SDDR5", &["IL", "RL"]).unwrap(),
            Connectivity {
                il: vec![PortPair::new(1, 2)],
                rl: vec![1, 2],
                ..Default::default()
            },
        );
        let out = job.auto_process().unwrap();
        assert_eq!(out.len(), 2);

        let il = &out[&ProcessKey::Il];
        let results: Vec<_> = il.iter().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "pcie_tx0__IL__S");
        assert!(results[0].image_path.exists());

        let rl = &out[&ProcessKey::Rl];
        let results: Vec<_> = rl.iter().collect();
        assert_eq!(results[0].title, "pcie_tx0__RL__S");
        assert!(results[0].image_path.exists());
    }

    #[test]
    fn test_from_records_shares_configuration() {
        let spec = SpecType::from_key_names("SDDR5", &["IL"]).unwrap();
        let conn = Connectivity {
            il: vec![PortPair::new(1, 2)],
            ..Default::default()
        };
        let records = vec![
            JobRecord {
                file_path: PathBuf::from("a/lane0.s2p"),
                key_name: "lane0".into(),
            },
            JobRecord {
                file_path: PathBuf::from("a/lane1.s2p"),
                key_name: "lane1".into(),
            },
        ];
        let jobs = SnpJob::from_records(&records, "plots", &spec, &conn);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].key_name, "lane1");
        assert_eq!(jobs[0].plot_dir, jobs[1].plot_dir);
        assert_eq!(jobs[0].connectivity.il, jobs[1].connectivity.il);
    }

    #[test]
    fn test_results_follow_request_order() {
        let dir = tempfile::tempdir().unwrap();
        let snp = write_flat_s2p(dir.path());
        let job = SnpJob::new(
            &snp,
            "lane",
            dir.path().join("plots"),
            SpecType::from_key_names("SDDR5", &["RL", "IL"]).unwrap(),
            Connectivity {
                il: vec![PortPair::new(1, 2)],
                rl: vec![1],
                ..Default::default()
            },
        );
        let out = job.auto_process().unwrap();
        let keys: Vec<_> = out.keys().copied().collect();
        assert_eq!(keys, vec![ProcessKey::Rl, ProcessKey::Il]);
    }

    #[test]
    fn test_tdr_without_port_groups_errors() {
        let dir = tempfile::tempdir().unwrap();
        let snp = write_flat_s2p(dir.path());
        let job = SnpJob::new(
            &snp,
            "lane",
            dir.path().join("plots"),
            SpecType::from_key_names("SDDR5", &["TDR"]).unwrap(),
            Connectivity::default(),
        );
        let err = job.auto_process().unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConnectivity {
                key: ProcessKey::Tdr,
                section: "TDR"
            }
        ));
    }

    #[test]
    fn test_zopen_without_zin_ports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let snp = write_flat_s2p(dir.path());
        let job = SnpJob::new(
            &snp,
            "vdd",
            dir.path().join("plots"),
            SpecType::from_key_names("ZPDN", &["ZOPEN"]).unwrap(),
            Connectivity::default(),
        );
        assert!(matches!(
            job.auto_process().unwrap_err(),
            Error::MissingConnectivity { section: "ZIN", .. }
        ));
    }

    #[test]
    fn test_mixed_mode_key_without_order_errors() {
        let dir = tempfile::tempdir().unwrap();
        let snp = write_flat_s2p(dir.path());
        let job = SnpJob::new(
            &snp,
            "lane",
            dir.path().join("plots"),
            SpecType::from_key_names("SDDR5", &["IL_MM"]).unwrap(),
            Connectivity {
                il: vec![PortPair::new(1, 1)],
                ..Default::default()
            },
        );
        assert!(matches!(
            job.auto_process().unwrap_err(),
            Error::MissingConnectivity {
                section: "MM_ORDER_IN_SE",
                ..
            }
        ));
    }

    #[test]
    fn test_out_of_range_connectivity_rejected_before_plotting() {
        let dir = tempfile::tempdir().unwrap();
        let snp = write_flat_s2p(dir.path());
        let job = SnpJob::new(
            &snp,
            "lane",
            dir.path().join("plots"),
            SpecType::from_key_names("SDDR5", &["RL"]).unwrap(),
            Connectivity {
                rl: vec![3],
                ..Default::default()
            },
        );
        assert!(matches!(
            job.auto_process().unwrap_err(),
            Error::PortOutOfRange {
                section: "RL",
                port: 3,
                nports: 2
            }
        ));
    }
}
