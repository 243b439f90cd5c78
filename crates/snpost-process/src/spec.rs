//! Spec types: the ordered list of post-processing keys for a simulation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One post-processing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessKey {
    /// Self impedance with sense ports left floating.
    ZOpen,
    /// Self impedance with sense ports shorted.
    ZShort,
    /// Insertion loss.
    Il,
    /// Return loss.
    Rl,
    /// Mixed-mode insertion loss.
    IlMm,
    /// Mixed-mode return loss.
    RlMm,
    /// Time-domain step response.
    Tdr,
    /// Mixed-mode time-domain step response.
    TdrMm,
}

impl ProcessKey {
    /// Canonical spelling used in spec files and plot titles.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessKey::ZOpen => "ZOPEN",
            ProcessKey::ZShort => "ZSHORT",
            ProcessKey::Il => "IL",
            ProcessKey::Rl => "RL",
            ProcessKey::IlMm => "IL_MM",
            ProcessKey::RlMm => "RL_MM",
            ProcessKey::Tdr => "TDR",
            ProcessKey::TdrMm => "TDR_MM",
        }
    }

    /// Whether this key operates on the mixed-mode network.
    pub fn is_mixed_mode(&self) -> bool {
        matches!(
            self,
            ProcessKey::IlMm | ProcessKey::RlMm | ProcessKey::TdrMm
        )
    }
}

impl fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ZOPEN" => Ok(ProcessKey::ZOpen),
            "ZSHORT" => Ok(ProcessKey::ZShort),
            "IL" => Ok(ProcessKey::Il),
            "RL" => Ok(ProcessKey::Rl),
            "IL_MM" => Ok(ProcessKey::IlMm),
            "RL_MM" => Ok(ProcessKey::RlMm),
            "TDR" => Ok(ProcessKey::Tdr),
            "TDR_MM" => Ok(ProcessKey::TdrMm),
            other => Err(Error::UnknownProcessKey(other.to_string())),
        }
    }
}

/// A spec type tag and the ordered post-processing keys it expands to.
///
/// Produced by the upstream spreadsheet parser (e.g. "ZPDN" maps to
/// ZOPEN + ZSHORT); never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecType {
    /// Tag such as "ZPDN" or "SDDR5".
    pub name: String,
    /// Keys to run, in order.
    pub post_process_keys: Vec<ProcessKey>,
}

impl SpecType {
    pub fn new(name: impl Into<String>, post_process_keys: Vec<ProcessKey>) -> Self {
        Self {
            name: name.into(),
            post_process_keys,
        }
    }

    /// Parse the key list from its spec-file spellings.
    pub fn from_key_names<S: AsRef<str>>(
        name: impl Into<String>,
        keys: &[S],
    ) -> Result<Self, Error> {
        let post_process_keys = keys
            .iter()
            .map(|k| k.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            post_process_keys,
        })
    }

    /// Whether any requested key needs the mixed-mode network.
    pub fn needs_mixed_mode(&self) -> bool {
        self.post_process_keys.iter().any(|k| k.is_mixed_mode())
    }
}
