//! # Second derivatives of branch flow-limit constraints
//!
//! Computes `∇²ₓ(μᵀ·h(x))` restricted to the voltage part of the state, where
//! `h` stacks one flow-limit constraint per constrained branch end and `μ`
//! holds the matching multipliers. The result is the real `2·nb × 2·nb`
//! matrix
//!
//! ```text
//!          │  x1      │  x2
//!   ───────┼──────────┼─────────
//!     x1   │  H11     │  H12
//!     x2   │  H21     │  H22
//! ```
//!
//! with `(x1, x2) = (Va, Vm)` in polar form and `(Vr, Vi)` in Cartesian form.
//! It is symmetric, so `H12 = H21ᵀ`.
//!
//! ## Layers
//!
//! - [`complex`]: second derivatives of complex branch power and current
//!   weighted by (possibly complex) `λ`
//! - [`kernels`]: one pure function per [`FlowLimit`](crate::FlowLimit)
//!   turning those into real metric Hessians for one branch end
//! - [`aggregate`]: runs a kernel on the from end and the to end and sums
//! - [`dispatch`]: rebuilds `V` from the state, splits `μ`, picks the kernel,
//!   assembles the final matrix

pub mod aggregate;
pub mod complex;
pub mod dispatch;
pub mod kernels;

use crate::sparse::{self, RealMat};

/// The four `nb × nb` blocks of a real flow-limit Hessian.
#[derive(Debug, Clone, PartialEq)]
pub struct HessianBlocks {
    pub h11: RealMat,
    pub h12: RealMat,
    pub h21: RealMat,
    pub h22: RealMat,
}

impl HessianBlocks {
    pub fn zeros(n_bus: usize) -> Self {
        Self {
            h11: sparse::real_zeros(n_bus, n_bus),
            h12: sparse::real_zeros(n_bus, n_bus),
            h21: sparse::real_zeros(n_bus, n_bus),
            h22: sparse::real_zeros(n_bus, n_bus),
        }
    }

    pub fn n_bus(&self) -> usize {
        self.h11.rows()
    }

    /// Element-wise sum of two block sets.
    pub fn sum(&self, other: &HessianBlocks) -> HessianBlocks {
        HessianBlocks {
            h11: &self.h11 + &other.h11,
            h12: &self.h12 + &other.h12,
            h21: &self.h21 + &other.h21,
            h22: &self.h22 + &other.h22,
        }
    }

    /// Assemble `[H11 H12; H21 H22]`.
    pub fn into_matrix(self) -> RealMat {
        let nb = self.n_bus();
        sparse::real_block(
            (2 * nb, 2 * nb),
            &[
                (0, 0, &self.h11),
                (0, nb, &self.h12),
                (nb, 0, &self.h21),
                (nb, nb, &self.h22),
            ],
        )
    }
}
