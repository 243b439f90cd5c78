//! PNG chart rendering for snpost.
//!
//! Three chart styles cover every post-processing key: impedance magnitude
//! (log-log), S-parameter magnitude in dB (linear), and time-domain step
//! response. All functions write an image file as their only effect and
//! accept an empty curve list (a valid, if empty, plot).

pub mod chart;
pub mod error;

pub use chart::{
    plot_impedance_magnitude, plot_s_parameter_db, plot_time_domain_step, Curve,
};
pub use error::{Error, Result};
