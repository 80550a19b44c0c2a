//! # branchlim-hessian: Second Derivatives of AC Branch Flow Limits
//!
//! Analytic Hessians of branch flow-limit constraints for Newton-type AC
//! optimal power flow solvers. Given bus voltages, Lagrange multipliers for
//! the from-end and to-end limits, and the branch admittances, this crate
//! produces the real `(2·nb) × (2·nb)` matrix `∇²ₓ(μᵀ·h(x))` that the solver
//! adds to the Hessian of its Lagrangian.
//!
//! ## Supported limits
//!
//! | [`FlowLimit`] | Constraint | Polar | Cartesian |
//! |---------------|------------|-------|-----------|
//! | [`FlowLimit::ApparentPowerSquared`] | `\|S\|² ≤ Smax²` | yes | yes |
//! | [`FlowLimit::RealPower`] | `P ≤ Pmax` | yes | skipped |
//! | [`FlowLimit::RealPowerSquared`] | `P² ≤ Pmax²` | yes | skipped |
//! | [`FlowLimit::CurrentSquared`] | `\|I\|² ≤ Imax²` | yes | skipped |
//!
//! Skipped combinations log a warning, add a warning to the supplied
//! [`Diagnostics`](branchlim_core::Diagnostics) and contribute a zero matrix;
//! use [`HessianConfig::is_supported`] to reject them up front.
//!
//! ## Architecture
//!
//! - **[`admittance`]**: pi-model `Yf`/`Yt` and incidence `Cf`/`Ct` for the
//!   constrained branches
//! - **[`derivatives`]**: first derivatives of branch current and power behind
//!   the [`FirstDerivativeProvider`] trait
//! - **[`constraint`]**: constraint values and Jacobian
//! - **[`hessian`]**: complex second-order blocks, per-metric kernels,
//!   from/to aggregation and the [`BranchFlowHessian`] entry point
//!
//! ## Example
//!
//! ```
//! use branchlim_hessian::{
//!     BranchData, BranchFlowHessian, BranchSet, FlowLimit, HessianConfig, VoltageState,
//! };
//!
//! let branches = BranchSet::new(
//!     3,
//!     vec![
//!         BranchData::line(0, 1, 0.01, 0.1),
//!         BranchData::line(1, 2, 0.02, 0.15),
//!     ],
//! )?;
//! let hessian = BranchFlowHessian::from_branches(&branches)?;
//!
//! let state = VoltageState::new(vec![0.0, -0.05, -0.12], vec![1.02, 0.99, 0.97]);
//! let mu = [1.0, 0.0, 0.5, 0.0]; // [mu_from | mu_to]
//! let h = hessian.evaluate(&state, &mu, HessianConfig::polar(FlowLimit::RealPower))?;
//! assert_eq!(h.shape(), (6, 6));
//! # Ok::<(), branchlim_hessian::HessianError>(())
//! ```

pub mod admittance;
pub mod config;
pub mod constraint;
pub mod derivatives;
pub mod error;
pub mod hessian;
pub mod sparse;
pub mod state;

pub use admittance::{BranchAdmittance, BranchData, BranchSet};
pub use config::{FlowLimit, HessianConfig, VoltageCoordinates};
pub use constraint::{evaluate_constraints, FlowConstraints};
pub use derivatives::{AnalyticDerivatives, FirstDerivativeProvider, FlowDerivatives};
pub use error::{HessianError, HessianResult};
pub use hessian::dispatch::{branch_flow_hessian, BranchFlowHessian};
pub use hessian::HessianBlocks;
pub use sparse::{ComplexMat, RealMat};
pub use state::{Multipliers, VoltageState};
