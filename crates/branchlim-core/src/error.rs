//! Error types for network data handling.
//!
//! [`CoreError`] covers everything that can go wrong while turning a
//! [`Network`](crate::Network) into indexed branch data. Algorithm crates wrap
//! it in their own error enums via `#[from]`.

use thiserror::Error;

/// Errors raised while validating or indexing network data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Network has no buses at all
    #[error("Network has no buses")]
    NoBuses,

    /// The same bus id was added twice
    #[error("Duplicate bus id {0}")]
    DuplicateBus(usize),

    /// A branch references a bus id that is not in the network
    #[error("Branch {branch} references unknown bus {bus}")]
    UnknownBus { branch: String, bus: usize },

    /// Series impedance too small to invert
    #[error("Branch {0} has zero impedance")]
    ZeroImpedance(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Convenience type alias for Results using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
