//! Branch flow-limit constraint values and Jacobian.
//!
//! One constraint per branch end, stacked as `h = [hf; ht]`:
//!
//! | metric                 | h             | dh/dx                      |
//! |------------------------|---------------|----------------------------|
//! | current squared        | `\|I\|² − Imax²`| `2·Re(diag(conj I)·dI/dx)` |
//! | real power squared     | `P² − Pmax²`  | `2·diag(P)·Re(dS/dx)`      |
//! | real power             | `P − Pmax`    | `Re(dS/dx)`                |
//! | apparent power squared | `\|S\|² − Smax²`| `2·Re(diag(conj S)·dS/dx)` |
//!
//! The Jacobian is `2·nl × 2·nb` with columns ordered `[x1 | x2]`. Unlike the
//! Hessian, it exists for every metric in both coordinate systems.

use crate::admittance::BranchAdmittance;
use crate::config::{FlowLimit, HessianConfig};
use crate::derivatives::{FirstDerivativeProvider, FlowDerivatives};
use crate::error::{ensure_len, HessianResult};
use crate::sparse::{self, ComplexMat, RealMat};
use crate::state::VoltageState;
use num_complex::Complex64;

/// Constraint values and their Jacobian at one operating point.
#[derive(Debug, Clone)]
pub struct FlowConstraints {
    /// `[hf; ht]`, length `2·nl`
    pub values: Vec<f64>,
    /// `2·nl × 2·nb`
    pub jacobian: RealMat,
}

/// Evaluate `h(x)` and `dh/dx` for the given limits (per-unit, one per
/// branch).
pub fn evaluate_constraints<P: FirstDerivativeProvider + ?Sized>(
    admittance: &BranchAdmittance,
    state: &VoltageState,
    limits: &[f64],
    config: HessianConfig,
    provider: &P,
) -> HessianResult<FlowConstraints> {
    let nb = admittance.n_bus();
    let nl = admittance.n_branch();
    ensure_len("voltage state", nb, state.n_bus())?;
    ensure_len("flow limits", nl, limits.len())?;

    let v = state.to_complex(config.coordinates)?;
    let (cf, ct) = admittance.connection_matrices();

    let from = end_constraints(&cf, &admittance.yf, &v, limits, config, provider)?;
    let to = end_constraints(&ct, &admittance.yt, &v, limits, config, provider)?;

    let mut values = from.0;
    values.extend(to.0);

    let jacobian = sparse::real_block(
        (2 * nl, 2 * nb),
        &[
            (0, 0, &from.1),
            (0, nb, &from.2),
            (nl, 0, &to.1),
            (nl, nb, &to.2),
        ],
    );
    Ok(FlowConstraints { values, jacobian })
}

/// Values plus the two Jacobian column blocks for one branch end.
fn end_constraints<P: FirstDerivativeProvider + ?Sized>(
    cbr: &ComplexMat,
    ybr: &ComplexMat,
    v: &[Complex64],
    limits: &[f64],
    config: HessianConfig,
    provider: &P,
) -> HessianResult<(Vec<f64>, RealMat, RealMat)> {
    let derivs = if config.flow_limit.is_current() {
        provider.current(ybr, v, config.coordinates)?
    } else {
        provider.power(cbr, ybr, v, config.coordinates)?
    };
    let FlowDerivatives { flow, d1, d2 } = derivs;

    let values = flow
        .iter()
        .zip(limits)
        .map(|(f, &lim)| match config.flow_limit {
            FlowLimit::CurrentSquared | FlowLimit::ApparentPowerSquared => {
                f.norm_sqr() - lim * lim
            }
            FlowLimit::RealPowerSquared => f.re * f.re - lim * lim,
            FlowLimit::RealPower => f.re - lim,
        })
        .collect();

    let weights: Vec<Complex64> = match config.flow_limit {
        FlowLimit::CurrentSquared | FlowLimit::ApparentPowerSquared => {
            flow.iter().map(|f| 2.0 * f.conj()).collect()
        }
        FlowLimit::RealPowerSquared => flow.iter().map(|f| Complex64::new(2.0 * f.re, 0.0)).collect(),
        FlowLimit::RealPower => vec![Complex64::new(1.0, 0.0); flow.len()],
    };
    // w is real for the real-power metrics: Re(diag(w)·dS) = diag(w)·Re(dS)
    let jac = |d: &ComplexMat| sparse::real_part(&sparse::scale_rows(&weights, d));

    Ok((values, jac(&d1), jac(&d2)))
}
