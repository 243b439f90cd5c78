//! Error types for snpost-process.

use thiserror::Error;

use crate::spec::ProcessKey;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown post-process key: {0:?}")]
    UnknownProcessKey(String),

    #[error("process key {key} requires the {section} connectivity section")]
    MissingConnectivity {
        key: ProcessKey,
        section: &'static str,
    },

    #[error("{section} connectivity references port {port}, but the network has {nports} ports")]
    PortOutOfRange {
        section: &'static str,
        port: usize,
        nports: usize,
    },

    #[error("failed to create {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] snpost_core::Error),

    #[error(transparent)]
    Analysis(#[from] snpost_analysis::Error),

    #[error(transparent)]
    Plot(#[from] snpost_plot::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
