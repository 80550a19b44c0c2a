//! Branch admittance and connection matrices for the flow-constrained lines.
//!
//! For `nl` constrained branches over `nb` buses this module provides:
//!
//! - `Yf`, `Yt` (`nl × nb`): branch currents at the from/to ends, `If = Yf·V`
//! - `Cf`, `Ct` (`nl × nb`): 0/1 incidence, one entry per row at the
//!   from-bus / to-bus column, so `Cf·V` picks the from-end voltages
//!
//! Row `k` of all four matrices refers to the same branch. When `Yf`/`Yt`
//! are supplied from outside, only their shape can be checked; the row order
//! must match the branch list.
//!
//! ## Pi-model with off-nominal tap
//!
//! ```text
//!  t   = τ·e^(jφ)             (τ = 0 means nominal)
//!  ys  = 1 / (r + jx)
//!  Ytt = ys + j·bc/2          Yff = Ytt / |t|²
//!  Yft = -ys / conj(t)        Ytf = -ys / t
//! ```

use crate::error::{ensure_len, HessianError, HessianResult};
use crate::sparse::{self, ComplexMat};
use branchlim_core::{CoreError, MegavoltAmperes, Network};
use num_complex::Complex64;
use tracing::debug;

/// A flow-constrained branch in internal bus indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchData {
    /// Branch name/identifier
    pub name: String,
    /// From bus index (internal 0-based)
    pub from_idx: usize,
    /// To bus index (internal 0-based)
    pub to_idx: usize,
    /// Series resistance (p.u.)
    pub r: f64,
    /// Series reactance (p.u.)
    pub x: f64,
    /// Line charging susceptance (p.u.)
    pub b_charging: f64,
    /// Tap ratio (0 or 1 for transmission lines)
    pub tap: f64,
    /// Phase shift (radians)
    pub shift: f64,
    /// Flow limit on the system base (p.u.)
    pub rate_pu: f64,
}

impl BranchData {
    /// Plain line with no charging, nominal tap and no limit.
    pub fn line(from_idx: usize, to_idx: usize, r: f64, x: f64) -> Self {
        Self {
            name: format!("{}-{}", from_idx, to_idx),
            from_idx,
            to_idx,
            r,
            x,
            b_charging: 0.0,
            tap: 1.0,
            shift: 0.0,
            rate_pu: 0.0,
        }
    }

    /// The four pi-model admittances `(Yff, Yft, Ytf, Ytt)`.
    pub fn pi_admittances(&self) -> HessianResult<(Complex64, Complex64, Complex64, Complex64)> {
        let z = Complex64::new(self.r, self.x);
        if z.norm() < 1e-12 {
            return Err(CoreError::ZeroImpedance(self.name.clone()).into());
        }
        let ys = z.inv();
        let tau = if self.tap > 0.0 { self.tap } else { 1.0 };
        let tap = Complex64::from_polar(tau, self.shift);

        let ytt = ys + Complex64::new(0.0, self.b_charging / 2.0);
        let yff = ytt / (tau * tau);
        let yft = -ys / tap.conj();
        let ytf = -ys / tap;
        Ok((yff, yft, ytf, ytt))
    }
}

/// Ordered set of flow-constrained branches.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSet {
    n_bus: usize,
    branches: Vec<BranchData>,
}

impl BranchSet {
    /// Wrap branches already expressed in internal indexing.
    pub fn new(n_bus: usize, branches: Vec<BranchData>) -> HessianResult<Self> {
        for (k, br) in branches.iter().enumerate() {
            for bus in [br.from_idx, br.to_idx] {
                if bus >= n_bus {
                    return Err(HessianError::BusOutOfRange {
                        branch: k,
                        bus,
                        n_bus,
                    });
                }
            }
        }
        Ok(Self { n_bus, branches })
    }

    /// Select every in-service branch with a positive thermal limit.
    ///
    /// Bus indices follow the network's node order; limits are converted to
    /// per-unit on `base_mva`.
    pub fn from_network(network: &Network, base_mva: MegavoltAmperes) -> HessianResult<Self> {
        let bus_map = network.bus_index_map()?;

        let mut branches = Vec::new();
        for branch in network.branches() {
            if !branch.is_flow_constrained() {
                continue;
            }
            let lookup = |bus: branchlim_core::BusId| {
                bus_map
                    .get(&bus)
                    .copied()
                    .ok_or_else(|| CoreError::UnknownBus {
                        branch: branch.name.clone(),
                        bus: bus.value(),
                    })
            };
            branches.push(BranchData {
                name: branch.name.clone(),
                from_idx: lookup(branch.from_bus)?,
                to_idx: lookup(branch.to_bus)?,
                r: branch.resistance,
                x: branch.reactance,
                b_charging: branch.charging_b.value(),
                tap: branch.effective_tap(),
                shift: branch.phase_shift.value(),
                rate_pu: branch
                    .s_max
                    .map(|s| s.to_per_unit(base_mva).value())
                    .unwrap_or(0.0),
            });
        }

        debug!(
            n_bus = bus_map.len(),
            n_constrained = branches.len(),
            "selected flow-constrained branches"
        );
        Self::new(bus_map.len(), branches)
    }

    pub fn n_bus(&self) -> usize {
        self.n_bus
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn branches(&self) -> &[BranchData] {
        &self.branches
    }

    pub fn from_indices(&self) -> Vec<usize> {
        self.branches.iter().map(|b| b.from_idx).collect()
    }

    pub fn to_indices(&self) -> Vec<usize> {
        self.branches.iter().map(|b| b.to_idx).collect()
    }

    /// Flow limits in per-unit, one per branch.
    pub fn flow_limits(&self) -> Vec<f64> {
        self.branches.iter().map(|b| b.rate_pu).collect()
    }

    /// Build `Yf` and `Yt` from the pi-model parameters.
    pub fn admittance(&self) -> HessianResult<BranchAdmittance> {
        let nl = self.branches.len();
        let mut yf = Vec::with_capacity(2 * nl);
        let mut yt = Vec::with_capacity(2 * nl);
        for (k, br) in self.branches.iter().enumerate() {
            let (yff, yft, ytf, ytt) = br.pi_admittances()?;
            yf.push((k, br.from_idx, yff));
            yf.push((k, br.to_idx, yft));
            yt.push((k, br.from_idx, ytf));
            yt.push((k, br.to_idx, ytt));
        }
        Ok(BranchAdmittance {
            n_bus: self.n_bus,
            from_idx: self.from_indices(),
            to_idx: self.to_indices(),
            yf: sparse::from_triplets((nl, self.n_bus), yf),
            yt: sparse::from_triplets((nl, self.n_bus), yt),
        })
    }
}

/// Branch admittance matrices plus the endpoint indices they are aligned with.
#[derive(Debug, Clone)]
pub struct BranchAdmittance {
    n_bus: usize,
    from_idx: Vec<usize>,
    to_idx: Vec<usize>,
    /// From-end branch admittance (`nl × nb`)
    pub yf: ComplexMat,
    /// To-end branch admittance (`nl × nb`)
    pub yt: ComplexMat,
}

impl BranchAdmittance {
    /// Pair externally built `Yf`/`Yt` with the branch endpoints.
    ///
    /// Only shapes are checked. Rows of `yf`/`yt` must follow the order of
    /// `branches`.
    pub fn from_parts(
        branches: &BranchSet,
        yf: ComplexMat,
        yt: ComplexMat,
    ) -> HessianResult<Self> {
        let nl = branches.len();
        let nb = branches.n_bus();
        ensure_len("Yf rows", nl, yf.rows())?;
        ensure_len("Yf columns", nb, yf.cols())?;
        ensure_len("Yt rows", nl, yt.rows())?;
        ensure_len("Yt columns", nb, yt.cols())?;
        Ok(Self {
            n_bus: nb,
            from_idx: branches.from_indices(),
            to_idx: branches.to_indices(),
            yf,
            yt,
        })
    }

    pub fn n_bus(&self) -> usize {
        self.n_bus
    }

    pub fn n_branch(&self) -> usize {
        self.from_idx.len()
    }

    /// Fresh incidence matrices `(Cf, Ct)`.
    pub fn connection_matrices(&self) -> (ComplexMat, ComplexMat) {
        (
            connection_matrix(&self.from_idx, self.n_bus),
            connection_matrix(&self.to_idx, self.n_bus),
        )
    }
}

/// 0/1 incidence matrix with a single `1` at `(k, buses[k])` in each row.
pub fn connection_matrix(buses: &[usize], n_bus: usize) -> ComplexMat {
    let one = Complex64::new(1.0, 0.0);
    sparse::from_triplets(
        (buses.len(), n_bus),
        buses.iter().enumerate().map(|(k, &bus)| (k, bus, one)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use branchlim_core::{Branch, BranchId, Bus, BusId, Degrees};

    fn transformer() -> BranchData {
        BranchData {
            name: "xfmr".into(),
            from_idx: 0,
            to_idx: 1,
            r: 0.005,
            x: 0.08,
            b_charging: 0.04,
            tap: 0.95,
            shift: 0.1,
            rate_pu: 1.2,
        }
    }

    #[test]
    fn test_line_admittances_without_tap() {
        let br = BranchData::line(0, 1, 0.01, 0.1);
        let (yff, yft, ytf, ytt) = br.pi_admittances().unwrap();
        let ys = Complex64::new(0.01, 0.1).inv();
        assert!((yff - ys).norm() < 1e-12);
        assert!((ytt - ys).norm() < 1e-12);
        assert!((yft + ys).norm() < 1e-12);
        assert!((ytf + ys).norm() < 1e-12);
    }

    #[test]
    fn test_tap_and_shift() {
        let br = transformer();
        let (yff, yft, ytf, ytt) = br.pi_admittances().unwrap();
        let ys = Complex64::new(0.005, 0.08).inv();
        let t = Complex64::from_polar(0.95, 0.1);
        assert!((ytt - (ys + Complex64::new(0.0, 0.02))).norm() < 1e-12);
        assert!((yff - ytt / (0.95 * 0.95)).norm() < 1e-12);
        assert!((yft - (-ys / t.conj())).norm() < 1e-12);
        assert!((ytf - (-ys / t)).norm() < 1e-12);
    }

    #[test]
    fn test_zero_tap_is_nominal() {
        let mut a = transformer();
        a.tap = 0.0;
        let mut b = transformer();
        b.tap = 1.0;
        assert_eq!(a.pi_admittances().unwrap(), b.pi_admittances().unwrap());
    }

    #[test]
    fn test_zero_impedance_rejected() {
        let br = BranchData::line(0, 1, 0.0, 0.0);
        assert_eq!(
            br.pi_admittances().unwrap_err(),
            HessianError::Network(CoreError::ZeroImpedance("0-1".into()))
        );
    }

    #[test]
    fn test_bus_out_of_range() {
        let err = BranchSet::new(2, vec![BranchData::line(0, 2, 0.01, 0.1)]).unwrap_err();
        assert_eq!(
            err,
            HessianError::BusOutOfRange {
                branch: 0,
                bus: 2,
                n_bus: 2
            }
        );
    }

    #[test]
    fn test_rows_align_with_connection_matrices() {
        let set = BranchSet::new(
            3,
            vec![BranchData::line(2, 0, 0.01, 0.1), BranchData::line(1, 2, 0.02, 0.2)],
        )
        .unwrap();
        let adm = set.admittance().unwrap();
        let (cf, ct) = adm.connection_matrices();

        assert_eq!(cf.shape(), (2, 3));
        assert_eq!(cf.nnz(), 2);
        assert_eq!(cf.get(0, 2), Some(&Complex64::new(1.0, 0.0)));
        assert_eq!(cf.get(1, 1), Some(&Complex64::new(1.0, 0.0)));
        assert_eq!(ct.get(0, 0), Some(&Complex64::new(1.0, 0.0)));
        assert_eq!(ct.get(1, 2), Some(&Complex64::new(1.0, 0.0)));

        // Yf row k is non-zero exactly at the from/to buses of branch k
        assert!(adm.yf.get(0, 2).is_some() && adm.yf.get(0, 0).is_some());
        assert!(adm.yf.get(0, 1).is_none());
        assert!(adm.yt.get(1, 1).is_some() && adm.yt.get(1, 2).is_some());
    }

    #[test]
    fn test_empty_set_has_zero_row_matrices() {
        let set = BranchSet::new(4, Vec::new()).unwrap();
        let adm = set.admittance().unwrap();
        let (cf, ct) = adm.connection_matrices();
        assert_eq!(adm.yf.shape(), (0, 4));
        assert_eq!(adm.yt.shape(), (0, 4));
        assert_eq!(cf.shape(), (0, 4));
        assert_eq!(ct.shape(), (0, 4));
    }

    #[test]
    fn test_from_parts_checks_shape() {
        let set = BranchSet::new(3, vec![BranchData::line(0, 1, 0.01, 0.1)]).unwrap();
        let err = BranchAdmittance::from_parts(&set, sparse::zeros(2, 3), sparse::zeros(1, 3))
            .unwrap_err();
        assert_eq!(
            err,
            HessianError::ShapeMismatch {
                what: "Yf rows",
                expected: 1,
                actual: 2
            }
        );
        assert!(BranchAdmittance::from_parts(&set, sparse::zeros(1, 3), sparse::zeros(1, 3)).is_ok());
    }

    #[test]
    fn test_from_network_selects_constrained_branches() {
        let mut network = Network::new();
        let b1 = network.add_bus(Bus::new(BusId::new(10), "A"));
        let b2 = network.add_bus(Bus::new(BusId::new(20), "B"));
        let b3 = network.add_bus(Bus::new(BusId::new(30), "C"));
        network.add_branch(
            b1,
            b2,
            Branch::new(BranchId::new(1), "A-B".into(), BusId::new(10), BusId::new(20), 0.01, 0.1)
                .with_s_max(Some(150.0)),
        );
        // no rating: not constrained
        network.add_branch(
            b2,
            b3,
            Branch::new(BranchId::new(2), "B-C".into(), BusId::new(20), BusId::new(30), 0.01, 0.1),
        );
        network.add_branch(
            b3,
            b1,
            Branch::new(BranchId::new(3), "C-A".into(), BusId::new(30), BusId::new(10), 0.02, 0.2)
                .with_s_max(Some(80.0))
                .with_tap(0.98, Degrees(2.0)),
        );

        let set = BranchSet::from_network(&network, MegavoltAmperes(100.0)).unwrap();
        assert_eq!(set.n_bus(), 3);
        assert_eq!(set.len(), 2);
        assert_eq!(set.from_indices(), vec![0, 2]);
        assert_eq!(set.to_indices(), vec![1, 0]);
        assert_eq!(set.flow_limits(), vec![1.5, 0.8]);
        assert_eq!(set.branches()[1].tap, 0.98);
        assert!((set.branches()[1].shift - 2f64.to_radians()).abs() < 1e-15);
    }

    #[test]
    fn test_from_network_unknown_bus() {
        let mut network = Network::new();
        let b1 = network.add_bus(Bus::new(BusId::new(1), "A"));
        let b2 = network.add_bus(Bus::new(BusId::new(2), "B"));
        network.add_branch(
            b1,
            b2,
            Branch::new(BranchId::new(1), "A-X".into(), BusId::new(1), BusId::new(99), 0.01, 0.1)
                .with_s_max(Some(100.0)),
        );
        let err = BranchSet::from_network(&network, MegavoltAmperes(100.0)).unwrap_err();
        assert_eq!(
            err,
            HessianError::Network(CoreError::UnknownBus {
                branch: "A-X".into(),
                bus: 99
            })
        );
    }
}
