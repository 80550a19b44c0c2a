//! From-end plus to-end contributions.

use super::kernels::{Kernel, KernelInput};
use super::HessianBlocks;
use crate::config::HessianConfig;
use crate::derivatives::FirstDerivativeProvider;
use crate::error::HessianResult;
use crate::sparse::ComplexMat;
use num_complex::Complex64;

/// Data for one branch end.
#[derive(Debug, Clone, Copy)]
pub struct BranchEnd<'a> {
    pub cbr: &'a ComplexMat,
    pub ybr: &'a ComplexMat,
    pub mu: &'a [f64],
}

/// Run `kernel` on a single end, fetching the first derivatives it needs.
pub fn end_contribution<P: FirstDerivativeProvider + ?Sized>(
    kernel: Kernel,
    end: BranchEnd<'_>,
    v: &[Complex64],
    config: HessianConfig,
    provider: &P,
) -> HessianResult<HessianBlocks> {
    let derivatives = if config.flow_limit.is_current() {
        provider.current(end.ybr, v, config.coordinates)?
    } else {
        provider.power(end.cbr, end.ybr, v, config.coordinates)?
    };
    Ok(kernel(&KernelInput {
        cbr: end.cbr,
        ybr: end.ybr,
        v,
        derivatives: &derivatives,
        mu: end.mu,
    }))
}

/// Sum of the from-end and to-end contributions.
///
/// With the `parallel` feature the two ends are evaluated on the rayon pool;
/// the summation order is the same either way.
pub fn aggregate<P: FirstDerivativeProvider + ?Sized>(
    kernel: Kernel,
    from: BranchEnd<'_>,
    to: BranchEnd<'_>,
    v: &[Complex64],
    config: HessianConfig,
    provider: &P,
) -> HessianResult<HessianBlocks> {
    #[cfg(feature = "parallel")]
    let (hf, ht) = rayon::join(
        || end_contribution(kernel, from, v, config, provider),
        || end_contribution(kernel, to, v, config, provider),
    );
    #[cfg(not(feature = "parallel"))]
    let (hf, ht) = (
        end_contribution(kernel, from, v, config, provider),
        end_contribution(kernel, to, v, config, provider),
    );

    Ok(hf?.sum(&ht?))
}
