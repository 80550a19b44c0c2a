//! Voltage state and multiplier layout.
//!
//! The optimizer hands over the voltage part of its state vector as two
//! equal-length blocks `[x1 | x2]`: `(Va, Vm)` in polar form or `(Vr, Vi)` in
//! Cartesian form. Multipliers for the flow constraints are laid out as
//! `[mu_from | mu_to]`, one entry per constrained branch and end.

use crate::config::VoltageCoordinates;
use crate::error::{ensure_len, HessianError, HessianResult};
use num_complex::Complex64;

/// Bus voltages as the two real coordinate blocks of the state vector.
#[derive(Debug, Clone, PartialEq)]
pub struct VoltageState {
    /// Va (rad) or Vr (pu)
    pub x1: Vec<f64>,
    /// Vm (pu) or Vi (pu)
    pub x2: Vec<f64>,
}

impl VoltageState {
    pub fn new(x1: Vec<f64>, x2: Vec<f64>) -> Self {
        Self { x1, x2 }
    }

    /// Flat start: every bus at 1.0 pu, 0 rad.
    pub fn flat(n_bus: usize, coordinates: VoltageCoordinates) -> Self {
        match coordinates {
            VoltageCoordinates::Polar => Self::new(vec![0.0; n_bus], vec![1.0; n_bus]),
            VoltageCoordinates::Cartesian => Self::new(vec![1.0; n_bus], vec![0.0; n_bus]),
        }
    }

    /// Split a concatenated `[x1 | x2]` slice.
    pub fn from_slice(x: &[f64]) -> HessianResult<Self> {
        if x.len() % 2 != 0 {
            return Err(HessianError::ShapeMismatch {
                what: "voltage state (must have even length)",
                expected: x.len() + 1,
                actual: x.len(),
            });
        }
        let (x1, x2) = x.split_at(x.len() / 2);
        Ok(Self::new(x1.to_vec(), x2.to_vec()))
    }

    pub fn from_complex(v: &[Complex64], coordinates: VoltageCoordinates) -> Self {
        match coordinates {
            VoltageCoordinates::Polar => Self::new(
                v.iter().map(|z| z.arg()).collect(),
                v.iter().map(|z| z.norm()).collect(),
            ),
            VoltageCoordinates::Cartesian => Self::new(
                v.iter().map(|z| z.re).collect(),
                v.iter().map(|z| z.im).collect(),
            ),
        }
    }

    pub fn n_bus(&self) -> usize {
        self.x1.len()
    }

    /// Concatenated `[x1 | x2]`.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut x = Vec::with_capacity(2 * self.n_bus());
        x.extend_from_slice(&self.x1);
        x.extend_from_slice(&self.x2);
        x
    }

    /// Reconstruct complex bus voltages.
    ///
    /// Polar: `V = Vm·e^(j·Va)`, magnitudes must be strictly positive.
    /// Cartesian: `V = Vr + j·Vi`.
    pub fn to_complex(&self, coordinates: VoltageCoordinates) -> HessianResult<Vec<Complex64>> {
        ensure_len("voltage state second block", self.x1.len(), self.x2.len())?;
        match coordinates {
            VoltageCoordinates::Polar => self
                .x1
                .iter()
                .zip(&self.x2)
                .enumerate()
                .map(|(bus, (&va, &vm))| {
                    if vm > 0.0 {
                        Ok(Complex64::from_polar(vm, va))
                    } else {
                        Err(HessianError::NonPositiveMagnitude { bus, vm })
                    }
                })
                .collect(),
            VoltageCoordinates::Cartesian => Ok(self
                .x1
                .iter()
                .zip(&self.x2)
                .map(|(&vr, &vi)| Complex64::new(vr, vi))
                .collect()),
        }
    }
}

/// Multipliers split per branch end.
#[derive(Debug, Clone, PartialEq)]
pub struct Multipliers {
    pub from: Vec<f64>,
    pub to: Vec<f64>,
}

impl Multipliers {
    /// Split `[mu_from | mu_to]` for `n_branch` constrained branches.
    ///
    /// An empty slice stands for "no multipliers" and yields zeros of the
    /// right length, so callers with no active flow constraints still get
    /// correctly shaped output.
    pub fn split(mu: &[f64], n_branch: usize) -> HessianResult<Self> {
        if mu.is_empty() {
            return Ok(Self::zeros(n_branch));
        }
        ensure_len("flow multipliers", 2 * n_branch, mu.len())?;
        let (from, to) = mu.split_at(n_branch);
        Ok(Self {
            from: from.to_vec(),
            to: to.to_vec(),
        })
    }

    pub fn zeros(n_branch: usize) -> Self {
        Self {
            from: vec![0.0; n_branch],
            to: vec![0.0; n_branch],
        }
    }
}
