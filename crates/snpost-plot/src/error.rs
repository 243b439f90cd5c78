//! Error types for snpost-plot.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("chart rendering failed: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
