//! Errors from branch flow-limit derivative evaluation.

use branchlim_core::CoreError;
use thiserror::Error;

/// Fatal errors. Unsupported metric/coordinate combinations are *not* here:
/// they are reported as warnings and contribute nothing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HessianError {
    /// Dimensions of admittance, incidence, state or multiplier data disagree
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Polar state with a zero or negative magnitude
    #[error("Bus {bus} has non-positive voltage magnitude {vm}")]
    NonPositiveMagnitude { bus: usize, vm: f64 },

    /// Branch endpoint outside 0..n_bus
    #[error("Branch {branch} references bus index {bus} but network has {n_bus} buses")]
    BusOutOfRange {
        branch: usize,
        bus: usize,
        n_bus: usize,
    },

    #[error(transparent)]
    Network(#[from] CoreError),
}

pub type HessianResult<T> = Result<T, HessianError>;

/// Fail with [`HessianError::ShapeMismatch`] unless `actual == expected`.
pub(crate) fn ensure_len(what: &'static str, expected: usize, actual: usize) -> HessianResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(HessianError::ShapeMismatch {
            what,
            expected,
            actual,
        })
    }
}
