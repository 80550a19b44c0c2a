//! Entry point: state and multipliers in, `2·nb × 2·nb` Hessian out.

use super::aggregate::{aggregate, BranchEnd};
use super::kernels;
use super::HessianBlocks;
use crate::admittance::{BranchAdmittance, BranchSet};
use crate::config::HessianConfig;
use crate::constraint::{evaluate_constraints, FlowConstraints};
use crate::derivatives::{AnalyticDerivatives, FirstDerivativeProvider};
use crate::error::{ensure_len, HessianResult};
use crate::sparse::RealMat;
use crate::state::{Multipliers, VoltageState};
use branchlim_core::Diagnostics;
use tracing::{debug, warn};

/// Flow-limit Hessian evaluator bound to one set of constrained branches.
///
/// # Example
///
/// ```
/// use branchlim_hessian::{
///     BranchData, BranchFlowHessian, BranchSet, FlowLimit, HessianConfig, VoltageState,
/// };
///
/// let branches = BranchSet::new(2, vec![BranchData::line(0, 1, 0.01, 0.1)])?;
/// let hessian = BranchFlowHessian::from_branches(&branches)?;
///
/// let state = VoltageState::new(vec![0.0, -0.05], vec![1.0, 0.98]);
/// let h = hessian.evaluate(&state, &[1.0, 1.0], HessianConfig::polar(FlowLimit::ApparentPowerSquared))?;
/// assert_eq!(h.shape(), (4, 4));
/// # Ok::<(), branchlim_hessian::HessianError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BranchFlowHessian<P = AnalyticDerivatives> {
    admittance: BranchAdmittance,
    provider: P,
}

impl BranchFlowHessian<AnalyticDerivatives> {
    pub fn new(admittance: BranchAdmittance) -> Self {
        Self::with_provider(admittance, AnalyticDerivatives)
    }

    /// Build `Yf`/`Yt` from the branch parameters.
    pub fn from_branches(branches: &BranchSet) -> HessianResult<Self> {
        Ok(Self::new(branches.admittance()?))
    }
}

impl<P: FirstDerivativeProvider> BranchFlowHessian<P> {
    /// Use `provider` for the first derivatives instead of the closed forms.
    pub fn with_provider(admittance: BranchAdmittance, provider: P) -> Self {
        Self {
            admittance,
            provider,
        }
    }

    pub fn admittance(&self) -> &BranchAdmittance {
        &self.admittance
    }

    pub fn n_bus(&self) -> usize {
        self.admittance.n_bus()
    }

    pub fn n_branch(&self) -> usize {
        self.admittance.n_branch()
    }

    /// Hessian of `μᵀ·h(x)` for multipliers `[mu_from | mu_to]`.
    ///
    /// Unsupported metric/coordinate combinations are logged and yield a
    /// zero matrix of the right size.
    pub fn evaluate(
        &self,
        state: &VoltageState,
        mu: &[f64],
        config: HessianConfig,
    ) -> HessianResult<RealMat> {
        let mut diagnostics = Diagnostics::new();
        self.evaluate_with_diagnostics(state, mu, config, &mut diagnostics)
    }

    /// Same as [`evaluate`](Self::evaluate), recording skipped contributions
    /// in `diagnostics`.
    pub fn evaluate_with_diagnostics(
        &self,
        state: &VoltageState,
        mu: &[f64],
        config: HessianConfig,
        diagnostics: &mut Diagnostics,
    ) -> HessianResult<RealMat> {
        Ok(self
            .evaluate_blocks(state, mu, config, diagnostics)?
            .into_matrix())
    }

    /// The four blocks before assembly.
    pub fn evaluate_blocks(
        &self,
        state: &VoltageState,
        mu: &[f64],
        config: HessianConfig,
        diagnostics: &mut Diagnostics,
    ) -> HessianResult<HessianBlocks> {
        let nb = self.n_bus();
        let nl = self.n_branch();
        ensure_len("voltage state", nb, state.n_bus())?;
        let v = state.to_complex(config.coordinates)?;
        let mu = Multipliers::split(mu, nl)?;

        debug!(n_bus = nb, n_branch = nl, %config, "evaluating branch flow hessian");

        let Some(kernel) = kernels::select(config.flow_limit, config.coordinates) else {
            let message = format!(
                "no second derivatives for {} limits in {} coordinates, contribution skipped",
                config.flow_limit, config.coordinates
            );
            warn!(%config, "{}", message);
            diagnostics.add_warning("hessian", &message);
            return Ok(HessianBlocks::zeros(nb));
        };

        let (cf, ct) = self.admittance.connection_matrices();
        let from = BranchEnd {
            cbr: &cf,
            ybr: &self.admittance.yf,
            mu: &mu.from,
        };
        let to = BranchEnd {
            cbr: &ct,
            ybr: &self.admittance.yt,
            mu: &mu.to,
        };
        aggregate(kernel, from, to, &v, config, &self.provider)
    }

    /// Constraint values and Jacobian at `state` for per-unit `limits`.
    pub fn constraints(
        &self,
        state: &VoltageState,
        limits: &[f64],
        config: HessianConfig,
    ) -> HessianResult<FlowConstraints> {
        evaluate_constraints(&self.admittance, state, limits, config, &self.provider)
    }
}

/// One-shot evaluation with the closed-form first derivatives.
pub fn branch_flow_hessian(
    admittance: &BranchAdmittance,
    state: &VoltageState,
    mu: &[f64],
    config: HessianConfig,
) -> HessianResult<RealMat> {
    BranchFlowHessian::new(admittance.clone()).evaluate(state, mu, config)
}
