//! Weighted second derivatives of complex branch flows.
//!
//! Each function returns the four `nb × nb` blocks of `∂²(λᵀ·F)/∂x∂y` where
//! `F` is the complex branch power or current at one end and `λ` is an
//! arbitrary complex weight vector (`nl`).
//!
//! With `A = Ybrᴴ·diag(λ)·Cbr` the weighted power is `λᵀ·S = conj(V)ᵀ·A·V`,
//! which gives:
//!
//! ```text
//! polar:      B = diag(conj V)·A·diag(V)      D = diag((A·V) ⊙ conj V)
//!             E = diag((Aᵀ·conj V) ⊙ V)       F = B + Bᵀ      G = diag(1/|V|)
//!             Haa = F − D − E                 Hva = j·G·(B − Bᵀ − D + E)
//!             Hav = Hvaᵀ                      Hvv = G·F·G
//!
//! cartesian:  Hrr = Hii = A + Aᵀ              Hri = j·(A − Aᵀ)   Hir = Hriᵀ
//! ```
//!
//! For the current, `λᵀ·I = λᵀ·Ybr·V` is linear in `V`; only the polar
//! parameterisation contributes curvature. With `c = Ybrᵀ·λ`:
//!
//! ```text
//! Iaa = −diag(c ⊙ V)     Iva = Iav = j·diag(c ⊙ V)·G     Ivv = 0
//! ```

use crate::sparse::{self, ComplexMat, J};
use num_complex::Complex64;

/// Four complex `nb × nb` blocks, ordered as the real output.
#[derive(Debug, Clone)]
pub struct ComplexBlocks {
    pub h11: ComplexMat,
    pub h12: ComplexMat,
    pub h21: ComplexMat,
    pub h22: ComplexMat,
}

/// `Ybrᴴ·diag(λ)·Cbr`
fn weighted_coupling(cbr: &ComplexMat, ybr: &ComplexMat, lam: &[Complex64]) -> ComplexMat {
    &sparse::adjoint(ybr) * &sparse::scale_rows(lam, cbr)
}

fn inverse_magnitudes(v: &[Complex64]) -> Vec<Complex64> {
    v.iter()
        .map(|vi| {
            let m = vi.norm();
            Complex64::new(if m > 0.0 { 1.0 / m } else { 0.0 }, 0.0)
        })
        .collect()
}

/// Second derivatives of `λᵀ·S` with respect to `(Va, Vm)`.
pub fn power_polar(
    cbr: &ComplexMat,
    ybr: &ComplexMat,
    v: &[Complex64],
    lam: &[Complex64],
) -> ComplexBlocks {
    let a = weighted_coupling(cbr, ybr, lam);
    let conj_v: Vec<Complex64> = v.iter().map(|z| z.conj()).collect();

    let av = sparse::mul_vec(&a, v);
    let atv = sparse::mul_vec(&sparse::transpose(&a), &conj_v);
    let d = sparse::diag(&av.iter().zip(&conj_v).map(|(x, y)| x * y).collect::<Vec<_>>());
    let e = sparse::diag(&atv.iter().zip(v).map(|(x, y)| x * y).collect::<Vec<_>>());

    let b = sparse::scale_rows(&conj_v, &sparse::scale_cols(&a, v));
    let bt = sparse::transpose(&b);
    let f = &b + &bt;
    let g = inverse_magnitudes(v);

    let haa = &(&f - &d) - &e;
    let skew = &(&(&b - &bt) - &d) + &e;
    let jg: Vec<Complex64> = g.iter().map(|gi| J * gi).collect();
    let hva = sparse::scale_rows(&jg, &skew);
    let hav = sparse::transpose(&hva);
    let hvv = sparse::scale_rows(&g, &sparse::scale_cols(&f, &g));

    ComplexBlocks {
        h11: haa,
        h12: hav,
        h21: hva,
        h22: hvv,
    }
}

/// Second derivatives of `λᵀ·S` with respect to `(Vr, Vi)`.
pub fn power_cartesian(cbr: &ComplexMat, ybr: &ComplexMat, lam: &[Complex64]) -> ComplexBlocks {
    let a = weighted_coupling(cbr, ybr, lam);
    let at = sparse::transpose(&a);
    let hrr = &a + &at;
    let hri = sparse::scale(&(&a - &at), J);
    let hir = sparse::transpose(&hri);

    ComplexBlocks {
        h11: hrr.clone(),
        h12: hri,
        h21: hir,
        h22: hrr,
    }
}

/// Second derivatives of `λᵀ·I` with respect to `(Va, Vm)`.
pub fn current_polar(ybr: &ComplexMat, v: &[Complex64], lam: &[Complex64]) -> ComplexBlocks {
    let nb = v.len();
    let c = sparse::mul_vec(&sparse::transpose(ybr), lam);
    let cv: Vec<Complex64> = c.iter().zip(v).map(|(x, y)| x * y).collect();

    let haa = sparse::diag(&cv.iter().map(|z| -z).collect::<Vec<_>>());
    let mixed: Vec<Complex64> = cv
        .iter()
        .zip(inverse_magnitudes(v))
        .map(|(z, g)| J * z * g)
        .collect();
    let hva = sparse::diag(&mixed);

    ComplexBlocks {
        h11: haa,
        h12: hva.clone(),
        h21: hva,
        h22: sparse::zeros(nb, nb),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admittance::{BranchData, BranchSet};

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn dense(m: &ComplexMat) -> Vec<Vec<Complex64>> {
        let mut out = vec![vec![c(0.0, 0.0); m.cols()]; m.rows()];
        for (&z, (i, j)) in m.iter() {
            out[i][j] += z;
        }
        out
    }

    /// λᵀ·S evaluated directly from the state.
    fn weighted_power(cbr: &ComplexMat, ybr: &ComplexMat, v: &[Complex64], lam: &[Complex64]) -> Complex64 {
        let i = sparse::mul_vec(ybr, v);
        let vb = sparse::mul_vec(cbr, v);
        lam.iter()
            .zip(vb.iter().zip(&i))
            .map(|(l, (vk, ik))| l * vk * ik.conj())
            .sum()
    }

    fn setup() -> (ComplexMat, ComplexMat, Vec<Complex64>, Vec<Complex64>) {
        let adm = BranchSet::new(
            2,
            vec![BranchData {
                b_charging: 0.04,
                tap: 1.02,
                shift: -0.05,
                ..BranchData::line(0, 1, 0.015, 0.09)
            }],
        )
        .unwrap()
        .admittance()
        .unwrap();
        let (_, ct) = adm.connection_matrices();
        let v = vec![c(1.01, 0.03), c(0.96, -0.08)];
        (ct, adm.yt, v, vec![c(0.7, -0.3)])
    }

    /// Second-order centered differences of λᵀ·S in Cartesian coordinates.
    #[test]
    fn test_power_cartesian_vs_second_differences() {
        let (ct, yt, v, lam) = setup();
        let blocks = power_cartesian(&ct, &yt, &lam);
        let h = 1e-4;
        let shift = |k: usize| if k < 2 { c(1.0, 0.0) } else { c(0.0, 1.0) };

        for p in 0..4 {
            for q in 0..4 {
                let f = |sp: f64, sq: f64| {
                    let mut vv = v.clone();
                    vv[p % 2] += shift(p) * sp;
                    vv[q % 2] += shift(q) * sq;
                    weighted_power(&ct, &yt, &vv, &lam)
                };
                let fd = (f(h, h) - f(h, -h) - f(-h, h) + f(-h, -h)) / (4.0 * h * h);
                let block = match (p < 2, q < 2) {
                    (true, true) => &blocks.h11,
                    (true, false) => &blocks.h12,
                    (false, true) => &blocks.h21,
                    (false, false) => &blocks.h22,
                };
                let analytic = dense(block)[p % 2][q % 2];
                assert!(
                    (fd - analytic).norm() < 1e-5 * (1.0 + analytic.norm()),
                    "({}, {}): analytic {} vs fd {}",
                    p,
                    q,
                    analytic,
                    fd
                );
            }
        }
    }

    #[test]
    fn test_power_polar_vs_second_differences() {
        let (ct, yt, v, lam) = setup();
        let blocks = power_polar(&ct, &yt, &v, &lam);
        let h = 1e-4;
        let (va, vm): (Vec<f64>, Vec<f64>) = v.iter().map(|z| (z.arg(), z.norm())).unzip();

        for p in 0..4 {
            for q in 0..4 {
                let f = |sp: f64, sq: f64| {
                    let mut a = va.clone();
                    let mut m = vm.clone();
                    for (k, s) in [(p, sp), (q, sq)] {
                        if k < 2 {
                            a[k] += s;
                        } else {
                            m[k - 2] += s;
                        }
                    }
                    let vv: Vec<Complex64> =
                        m.iter().zip(&a).map(|(&r, &t)| Complex64::from_polar(r, t)).collect();
                    weighted_power(&ct, &yt, &vv, &lam)
                };
                let fd = (f(h, h) - f(h, -h) - f(-h, h) + f(-h, -h)) / (4.0 * h * h);
                let block = match (p < 2, q < 2) {
                    (true, true) => &blocks.h11,
                    (true, false) => &blocks.h12,
                    (false, true) => &blocks.h21,
                    (false, false) => &blocks.h22,
                };
                let analytic = dense(block)[p % 2][q % 2];
                assert!(
                    (fd - analytic).norm() < 1e-5 * (1.0 + analytic.norm()),
                    "({}, {}): analytic {} vs fd {}",
                    p,
                    q,
                    analytic,
                    fd
                );
            }
        }
    }

    #[test]
    fn test_current_polar_has_no_magnitude_curvature() {
        let (_, yt, v, lam) = setup();
        let blocks = current_polar(&yt, &v, &lam);
        assert_eq!(blocks.h22.nnz(), 0);
        assert_eq!(dense(&blocks.h12), dense(&blocks.h21));

        // λᵀ·Ybr·V with V_k = Vm_k·e^(jVa_k): ∂²/∂Va_k² = −c_k·V_k
        let c_vec = sparse::mul_vec(&sparse::transpose(&yt), &lam);
        let haa = dense(&blocks.h11);
        for k in 0..2 {
            assert!((haa[k][k] + c_vec[k] * v[k]).norm() < 1e-12);
        }
    }

    #[test]
    fn test_zero_weights_give_empty_blocks() {
        let (ct, yt, v, _) = setup();
        let lam = vec![c(0.0, 0.0)];
        let blocks = power_polar(&ct, &yt, &v, &lam);
        for m in [&blocks.h11, &blocks.h12, &blocks.h21, &blocks.h22] {
            assert_eq!(m.shape(), (2, 2));
            assert_eq!(m.nnz(), 0);
        }
    }
}
