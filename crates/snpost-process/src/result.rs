//! Result types handed back to the reporting layer.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One plotted metric: title, image artifact, and the numeric report
/// fields (already formatted; empty string for a field a key does not
/// produce, so report columns stay aligned).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricResult {
    pub title: String,
    pub image_path: PathBuf,
    pub fields: Vec<String>,
    /// True when the metric was computed from an under-sampled frequency
    /// grid and should be treated as lower confidence.
    #[serde(default)]
    pub degraded: bool,
}

impl MetricResult {
    pub fn new(title: impl Into<String>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            image_path: image_path.into(),
            fields: Vec::new(),
            degraded: false,
        }
    }

    pub fn with_fields(
        title: impl Into<String>,
        image_path: impl Into<PathBuf>,
        fields: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            image_path: image_path.into(),
            fields,
            degraded: false,
        }
    }

    pub fn flag_degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }
}

/// Mixed-mode quadrant of a 2N-port network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Quadrant {
    /// Differential response to differential stimulus.
    Dd,
    /// Differential response to common stimulus.
    Dc,
    /// Common response to differential stimulus.
    Cd,
    /// Common response to common stimulus.
    Cc,
}

impl Quadrant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::Dd => "DD",
            Quadrant::Dc => "DC",
            Quadrant::Cd => "CD",
            Quadrant::Cc => "CC",
        }
    }

    /// S-parameter header for labels in this quadrant, e.g. "SDD".
    pub fn s_header(&self) -> &'static str {
        match self {
            Quadrant::Dd => "SDD",
            Quadrant::Dc => "SDC",
            Quadrant::Cd => "SCD",
            Quadrant::Cc => "SCC",
        }
    }
}

/// The results of one post-processing key: a flat list, or one list per
/// mixed-mode quadrant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyResult {
    Single(Vec<MetricResult>),
    MixedMode(IndexMap<Quadrant, Vec<MetricResult>>),
}

impl KeyResult {
    /// Flat view over all metric results regardless of grouping.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &MetricResult> + '_> {
        match self {
            KeyResult::Single(list) => Box::new(list.iter()),
            KeyResult::MixedMode(map) => Box::new(map.values().flatten()),
        }
    }
}
