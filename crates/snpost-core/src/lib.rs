//! Core n-port network representation and Touchstone I/O for snpost.
//!
//! This crate provides the fundamental data structures for frequency-domain
//! scattering-parameter data: the immutable [`Network`] value type, the
//! Touchstone file parser/writer, and frequency-grid helpers.

pub mod error;
pub mod frequency;
pub mod network;
pub mod touchstone;
pub mod units;

pub use error::{Error, Result};
pub use network::Network;
