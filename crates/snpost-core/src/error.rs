//! Error types for snpost-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("touchstone format error: {0}")]
    Format(String),

    #[error("port index {index} out of range for {nports}-port network")]
    PortIndex { index: usize, nports: usize },

    #[error("frequency grid error: {0}")]
    Grid(String),

    #[error("singular matrix at frequency index {0}")]
    Singular(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
