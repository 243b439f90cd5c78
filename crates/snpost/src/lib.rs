//! # snpost
//!
//! Touchstone S-parameter post-processing and frequency-domain metric
//! extraction.
//!
//! snpost reads `.sNp` network files and derives the signal-integrity and
//! power-integrity views an interconnect report needs:
//! - Self-impedance versus frequency, open and shorted sense ports
//! - Insertion and return loss, single-ended and mixed-mode
//! - Frequency-indexed R/L/C summaries
//! - Time-domain (TDR) step impedance
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use snpost::prelude::*;
//!
//! let job = SnpJob::new(
//!     "sims/vdd_core.s4p",
//!     "vdd_core",
//!     "plots",
//!     SpecType::from_key_names("ZPDN", &["ZOPEN", "ZSHORT"])?,
//!     Connectivity {
//!         zin: vec![1, 2],
//!         ..Default::default()
//!     },
//! );
//! for (key, result) in job.auto_process()? {
//!     for metric in result.iter() {
//!         println!("{key}: {} -> {}", metric.title, metric.image_path.display());
//!     }
//! }
//! ```

// Re-export member crates
pub use snpost_analysis as analysis;
pub use snpost_core as core;
pub use snpost_plot as plot;
pub use snpost_process as process;

// ============================================================================
// Convenient re-exports from snpost_core
// ============================================================================

pub use snpost_core::{
    // Errors
    Error as CoreError,
    // The immutable network value type
    Network,
};

// ============================================================================
// Convenient re-exports from snpost_analysis
// ============================================================================

pub use snpost_analysis::{
    // Errors
    Error as AnalysisError,
    InterpolatedPoint,
    RlcSummary,
    StepResponse,
    DEFAULT_TDR_STEP_HZ,
    extract_rlc,
    // Bracketing impedance interpolation
    interpolate_z,
    prepare_for_tdr,
    split_quadrants,
    // Mixed-mode conversion
    to_mixed_mode,
    // TDR
    z_time_step,
};

// ============================================================================
// Convenient re-exports from snpost_plot
// ============================================================================

pub use snpost_plot::{
    Curve,
    // Errors
    Error as PlotError,
    plot_impedance_magnitude,
    plot_s_parameter_db,
    plot_time_domain_step,
};

// ============================================================================
// Convenient re-exports from snpost_process
// ============================================================================

pub use snpost_process::{
    Connectivity,
    // Errors
    Error as ProcessError,
    JobRecord,
    KeyResult,
    MetricResult,
    PortPair,
    ProcessKey,
    Quadrant,
    // The dispatch entry point
    SnpJob,
    SpecType,
    TdrSides,
};

// ============================================================================
// Re-export commonly used external types
// ============================================================================

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

/// Re-export of num_complex's Complex type.
pub use num_complex::Complex;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module containing commonly used types and traits.
///
/// ```rust
/// use snpost::prelude::*;
/// ```
pub mod prelude {
    // Network
    pub use crate::Network;

    // Analysis
    pub use crate::{
        extract_rlc, interpolate_z, prepare_for_tdr, split_quadrants, to_mixed_mode,
        z_time_step, InterpolatedPoint, RlcSummary, StepResponse,
    };

    // Plotting
    pub use crate::{plot_impedance_magnitude, plot_s_parameter_db, plot_time_domain_step, Curve};

    // Dispatch
    pub use crate::{
        Connectivity, JobRecord, KeyResult, MetricResult, PortPair, ProcessKey, Quadrant,
        SnpJob, SpecType, TdrSides,
    };
}
