//! Per-metric Hessian kernels for one branch end.
//!
//! Every kernel has the same signature and returns the real blocks of
//! `∂²(μᵀ·h)/∂x∂y` for one end. For the squared magnitudes `h = |F|²`:
//!
//! ```text
//! H_xy = 2·Re( F_xy(λ = conj(F) ⊙ μ) + dF_xᵀ·diag(μ)·conj(dF_y) )
//! ```
//!
//! where `F_xy(λ)` is the weighted complex second derivative from
//! [`complex`](super::complex). `P²` uses the same shape with `dF = Re(dS)`
//! and `λ = P ⊙ μ`; plain `P` is the real part of the power Hessian at
//! `λ = μ`, exact because `μ` is real.

use super::complex::{self, ComplexBlocks};
use super::HessianBlocks;
use crate::config::{FlowLimit, VoltageCoordinates};
use crate::derivatives::FlowDerivatives;
use crate::sparse::{self, ComplexMat};
use num_complex::Complex64;

/// Everything a kernel needs for one branch end.
#[derive(Debug, Clone, Copy)]
pub struct KernelInput<'a> {
    /// Incidence of this end (`nl × nb`)
    pub cbr: &'a ComplexMat,
    /// Admittance of this end (`nl × nb`)
    pub ybr: &'a ComplexMat,
    /// Bus voltages
    pub v: &'a [Complex64],
    /// Current derivatives for [`FlowLimit::CurrentSquared`], power otherwise
    pub derivatives: &'a FlowDerivatives,
    /// Multipliers for this end (`nl`)
    pub mu: &'a [f64],
}

pub type Kernel = fn(&KernelInput<'_>) -> HessianBlocks;

/// Kernel for a metric in a coordinate system; `None` when no closed form is
/// available.
pub fn select(flow_limit: FlowLimit, coordinates: VoltageCoordinates) -> Option<Kernel> {
    use FlowLimit::*;
    use VoltageCoordinates::*;

    match (flow_limit, coordinates) {
        (CurrentSquared, Polar) => Some(current_squared_polar as Kernel),
        (RealPowerSquared, Polar) => Some(real_power_squared_polar as Kernel),
        (RealPower, Polar) => Some(real_power_polar as Kernel),
        (ApparentPowerSquared, Polar) => Some(apparent_power_squared_polar as Kernel),
        (ApparentPowerSquared, Cartesian) => Some(apparent_power_squared_cartesian as Kernel),
        (CurrentSquared | RealPowerSquared | RealPower, Cartesian) => None,
    }
}

pub fn current_squared_polar(input: &KernelInput<'_>) -> HessianBlocks {
    let d = input.derivatives;
    let lam = conj_weighted(&d.flow, input.mu);
    let second = complex::current_polar(input.ybr, input.v, &lam);
    squared_magnitude(second, &d.d1, &d.d2, input.mu)
}

pub fn real_power_squared_polar(input: &KernelInput<'_>) -> HessianBlocks {
    let d = input.derivatives;
    let lam: Vec<Complex64> = d
        .flow
        .iter()
        .zip(input.mu)
        .map(|(s, &m)| Complex64::new(s.re * m, 0.0))
        .collect();
    let second = complex::power_polar(input.cbr, input.ybr, input.v, &lam);
    let re = |m: &ComplexMat| m.map(|z| Complex64::new(z.re, 0.0));
    squared_magnitude(second, &re(&d.d1), &re(&d.d2), input.mu)
}

pub fn real_power_polar(input: &KernelInput<'_>) -> HessianBlocks {
    let lam: Vec<Complex64> = input.mu.iter().map(|&m| Complex64::new(m, 0.0)).collect();
    let second = complex::power_polar(input.cbr, input.ybr, input.v, &lam);
    HessianBlocks {
        h11: sparse::real_part(&second.h11),
        h12: sparse::real_part(&second.h12),
        h21: sparse::real_part(&second.h21),
        h22: sparse::real_part(&second.h22),
    }
}

pub fn apparent_power_squared_polar(input: &KernelInput<'_>) -> HessianBlocks {
    let d = input.derivatives;
    let lam = conj_weighted(&d.flow, input.mu);
    let second = complex::power_polar(input.cbr, input.ybr, input.v, &lam);
    squared_magnitude(second, &d.d1, &d.d2, input.mu)
}

pub fn apparent_power_squared_cartesian(input: &KernelInput<'_>) -> HessianBlocks {
    let d = input.derivatives;
    let lam = conj_weighted(&d.flow, input.mu);
    let second = complex::power_cartesian(input.cbr, input.ybr, &lam);
    squared_magnitude(second, &d.d1, &d.d2, input.mu)
}

/// `conj(F) ⊙ μ`
fn conj_weighted(flow: &[Complex64], mu: &[f64]) -> Vec<Complex64> {
    flow.iter().zip(mu).map(|(f, &m)| f.conj() * m).collect()
}

/// `2·Re(second + dF_xᵀ·diag(μ)·conj(dF_y))` for each block.
fn squared_magnitude(
    second: ComplexBlocks,
    d1: &ComplexMat,
    d2: &ComplexMat,
    mu: &[f64],
) -> HessianBlocks {
    let mu: Vec<Complex64> = mu.iter().map(|&m| Complex64::new(m, 0.0)).collect();

    let block = |curvature: &ComplexMat, dx: &ComplexMat, dy: &ComplexMat| {
        let outer = &sparse::transpose(dx) * &sparse::scale_rows(&mu, &sparse::conj(dy));
        sparse::real_scale(&sparse::real_part(&(curvature + &outer)), 2.0)
    };

    HessianBlocks {
        h11: block(&second.h11, d1, d1),
        h12: block(&second.h12, d1, d2),
        h21: block(&second.h21, d2, d1),
        h22: block(&second.h22, d2, d2),
    }
}
