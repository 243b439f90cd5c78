//! Post-processing dispatch for snpost.
//!
//! Ties the network, analysis, and plot crates together: an [`SnpJob`]
//! couples one Touchstone file with its connectivity and spec type, and
//! [`SnpJob::auto_process`] runs the requested post-processing keys in
//! order, producing plots and per-key metric results.

pub mod connectivity;
pub mod error;
pub mod job;
pub mod result;
pub mod spec;

pub use connectivity::{Connectivity, PortPair, TdrSides};
pub use error::{Error, Result};
pub use job::{JobRecord, SnpJob};
pub use result::{KeyResult, MetricResult, Quadrant};
pub use spec::{ProcessKey, SpecType};
