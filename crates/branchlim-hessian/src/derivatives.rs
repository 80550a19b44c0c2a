//! First derivatives of branch currents and powers.
//!
//! For one branch end with admittance `Ybr` and incidence `Cbr` (both
//! `nl × nb`) and bus voltages `V`:
//!
//! ```text
//! I = Ybr·V                         S = (Cbr·V) ⊙ conj(I)
//!
//! polar (x1 = Va, x2 = Vm, Vn = V/|V|):
//!   dI/dVa = Ybr·diag(j·V)          dI/dVm = Ybr·diag(Vn)
//!   dS/dVa = j·(diag(conj I)·Cbr·diag(V) − diag(Cbr·V)·conj(Ybr·diag(V)))
//!   dS/dVm = diag(Cbr·V)·conj(Ybr·diag(Vn)) + diag(conj I)·Cbr·diag(Vn)
//!
//! cartesian (x1 = Vr, x2 = Vi):
//!   dI/dVr = Ybr                    dI/dVi = j·Ybr
//!   dS/dVr = diag(conj I)·Cbr + diag(Cbr·V)·conj(Ybr)
//!   dS/dVi = j·(diag(conj I)·Cbr − diag(Cbr·V)·conj(Ybr))
//! ```

use crate::config::VoltageCoordinates;
use crate::error::{ensure_len, HessianResult};
use crate::sparse::{self, ComplexMat, J};
use num_complex::Complex64;

/// Flow at one branch end and its derivatives with respect to both state
/// blocks.
#[derive(Debug, Clone)]
pub struct FlowDerivatives {
    /// Complex current or power, one per branch
    pub flow: Vec<Complex64>,
    /// d(flow)/d(x1), `nl × nb`
    pub d1: ComplexMat,
    /// d(flow)/d(x2), `nl × nb`
    pub d2: ComplexMat,
}

/// Supplier of first-order flow derivatives.
///
/// The Hessian kernels consume whatever this returns, so an optimizer that
/// already holds these matrices can hand them over instead of having them
/// recomputed. [`AnalyticDerivatives`] is the closed-form default.
pub trait FirstDerivativeProvider: Sync {
    /// Branch currents `I = Ybr·V` and their derivatives.
    fn current(
        &self,
        ybr: &ComplexMat,
        v: &[Complex64],
        coordinates: VoltageCoordinates,
    ) -> HessianResult<FlowDerivatives>;

    /// Branch complex powers `S = (Cbr·V) ⊙ conj(Ybr·V)` and their derivatives.
    fn power(
        &self,
        cbr: &ComplexMat,
        ybr: &ComplexMat,
        v: &[Complex64],
        coordinates: VoltageCoordinates,
    ) -> HessianResult<FlowDerivatives>;
}

/// Closed-form first derivatives.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticDerivatives;

impl FirstDerivativeProvider for AnalyticDerivatives {
    fn current(
        &self,
        ybr: &ComplexMat,
        v: &[Complex64],
        coordinates: VoltageCoordinates,
    ) -> HessianResult<FlowDerivatives> {
        ensure_len("admittance columns", v.len(), ybr.cols())?;
        let flow = sparse::mul_vec(ybr, v);

        let (d1, d2) = match coordinates {
            VoltageCoordinates::Polar => {
                let jv: Vec<Complex64> = v.iter().map(|&vi| J * vi).collect();
                (
                    sparse::scale_cols(ybr, &jv),
                    sparse::scale_cols(ybr, &unit_voltages(v)),
                )
            }
            VoltageCoordinates::Cartesian => (ybr.clone(), sparse::scale(ybr, J)),
        };
        Ok(FlowDerivatives { flow, d1, d2 })
    }

    fn power(
        &self,
        cbr: &ComplexMat,
        ybr: &ComplexMat,
        v: &[Complex64],
        coordinates: VoltageCoordinates,
    ) -> HessianResult<FlowDerivatives> {
        ensure_len("admittance columns", v.len(), ybr.cols())?;
        ensure_len("incidence rows", ybr.rows(), cbr.rows())?;
        ensure_len("incidence columns", ybr.cols(), cbr.cols())?;

        let i_br = sparse::mul_vec(ybr, v);
        let v_br = sparse::mul_vec(cbr, v);
        let conj_i: Vec<Complex64> = i_br.iter().map(|i| i.conj()).collect();
        let flow: Vec<Complex64> = v_br.iter().zip(&conj_i).map(|(vb, ci)| vb * ci).collect();

        let (d1, d2) = match coordinates {
            VoltageCoordinates::Polar => {
                let vn = unit_voltages(v);
                // diag(conj I)·Cbr·diag(x) and diag(Cbr·V)·conj(Ybr·diag(x))
                let current_term = |x: &[Complex64]| {
                    sparse::scale_rows(&conj_i, &sparse::scale_cols(cbr, x))
                };
                let voltage_term = |x: &[Complex64]| {
                    sparse::scale_rows(&v_br, &sparse::conj(&sparse::scale_cols(ybr, x)))
                };

                let d_va = sparse::scale(&(&current_term(v) - &voltage_term(v)), J);
                let d_vm = &voltage_term(&vn) + &current_term(&vn);
                (d_va, d_vm)
            }
            VoltageCoordinates::Cartesian => {
                let current_term = sparse::scale_rows(&conj_i, cbr);
                let voltage_term = sparse::scale_rows(&v_br, &sparse::conj(ybr));
                (
                    &current_term + &voltage_term,
                    sparse::scale(&(&current_term - &voltage_term), J),
                )
            }
        };
        Ok(FlowDerivatives { flow, d1, d2 })
    }
}

/// `V / |V|`; zero stays zero.
pub(crate) fn unit_voltages(v: &[Complex64]) -> Vec<Complex64> {
    v.iter()
        .map(|&vi| {
            let m = vi.norm();
            if m > 0.0 {
                vi / m
            } else {
                Complex64::new(0.0, 0.0)
            }
        })
        .collect()
}
