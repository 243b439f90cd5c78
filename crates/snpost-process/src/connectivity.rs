//! Typed port-connectivity input.
//!
//! The upstream spreadsheet parser produces, per simulation key, the port
//! roles each metric operates on. Representing each metric's ports as its
//! own typed field (rather than one loosely-shaped map) makes malformed
//! connectivity a constructor-time error instead of an indexing panic deep
//! inside a metric.
//!
//! All port numbers here are 1-based, matching every user-facing label;
//! conversion to 0-based indices happens at the network boundary.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An insertion-loss path: stimulus into `input`, response read at `output`
/// (the plotted trace is S(output, input)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPair {
    pub input: usize,
    pub output: usize,
}

impl PortPair {
    pub fn new(input: usize, output: usize) -> Self {
        Self { input, output }
    }

    /// Label convention: response port first, e.g. S21 for input 1, output 2.
    pub fn label(&self, header: &str) -> String {
        format!("{}{}{}", header, self.output, self.input)
    }
}

/// Port groups for the two ends of a TDR view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdrSides {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
}

/// Per-simulation-key port connectivity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Connectivity {
    /// Input-impedance ports; also the count of non-sense ports for ZSHORT.
    pub zin: Vec<usize>,
    /// Insertion-loss paths.
    pub il: Vec<PortPair>,
    /// Return-loss self ports.
    pub rl: Vec<usize>,
    /// TDR left/right port groups.
    pub tdr: Option<TdrSides>,
    /// Permutation placing differential-pair members adjacently for the
    /// mixed-mode transform: the single-ended port at 1-based position `k`
    /// moves to 1-based position `mm_order[k - 1]`.
    pub mm_order: Option<Vec<usize>>,
}

impl Connectivity {
    /// Check every referenced port against the network's port count.
    pub fn validate(&self, nports: usize) -> Result<()> {
        let check = |section: &'static str, port: usize| {
            if port == 0 || port > nports {
                Err(Error::PortOutOfRange {
                    section,
                    port,
                    nports,
                })
            } else {
                Ok(())
            }
        };
        for &p in &self.zin {
            check("ZIN", p)?;
        }
        for pair in &self.il {
            check("IL", pair.input)?;
            check("IL", pair.output)?;
        }
        for &p in &self.rl {
            check("RL", p)?;
        }
        if let Some(sides) = &self.tdr {
            for &p in sides.left.iter().chain(&sides.right) {
                check("TDR", p)?;
            }
        }
        if let Some(order) = &self.mm_order {
            for &p in order {
                check("MM_ORDER_IN_SE", p)?;
            }
        }
        Ok(())
    }
}
