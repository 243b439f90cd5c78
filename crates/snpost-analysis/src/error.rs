//! Error types for snpost-analysis.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("mixed-mode conversion requires an even port count, got {0}")]
    OddPortCount(usize),

    #[error("time-domain step response requires a DC (0 Hz) sample")]
    NeedsDcPoint,

    #[error("time-domain step response requires a uniform frequency grid")]
    NonUniformGrid,

    #[error("at least {needed} frequency samples are required, got {got}")]
    TooFewSamples { needed: usize, got: usize },

    #[error(transparent)]
    Core(#[from] snpost_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
