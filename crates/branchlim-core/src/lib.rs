//! # branchlim-core: Network Model for Branch Flow Limits
//!
//! Data structures describing the part of a power network that branch
//! flow-limit derivatives need: buses, branches with their pi-model
//! parameters and thermal ratings, and the graph tying them together.
//!
//! Networks are **undirected multigraphs**: buses are nodes, branches are
//! edges, and parallel branches between the same pair of buses are allowed.
//! Orientation (from/to) lives on the [`Branch`] itself, not on the edge.
//!
//! ## Quick Start
//!
//! ```rust
//! use branchlim_core::*;
//!
//! let mut network = Network::new();
//! let b1 = network.add_bus(Bus::new(BusId::new(1), "Bus 1"));
//! let b2 = network.add_bus(Bus::new(BusId::new(2), "Bus 2"));
//!
//! network.add_branch(
//!     b1,
//!     b2,
//!     Branch::new(BranchId::new(1), "Line 1-2".into(), BusId::new(1), BusId::new(2), 0.01, 0.1)
//!         .with_s_max(Some(120.0)),
//! );
//!
//! let mut diagnostics = Diagnostics::new();
//! network.validate_into(&mut diagnostics);
//! assert_eq!(diagnostics.issues.len(), 0);
//! assert!(network.branches()[0].is_flow_constrained());
//! ```

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod diagnostics;
pub mod error;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{CoreError, CoreResult};
pub use petgraph::graph::NodeIndex;
pub use units::{Degrees, MegavoltAmperes, PerUnit, Radians};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(usize);

impl BusId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BusId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl BranchId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BranchId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

/// A network node. The voltage itself is optimizer state and is passed
/// separately to the derivative routines.
#[derive(Debug, Clone)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
}

impl Bus {
    pub fn new(id: BusId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    /// Series resistance (per-unit)
    pub resistance: f64,
    /// Series reactance (per-unit)
    pub reactance: f64,
    /// Off-nominal tap magnitude on the from side; zero means nominal
    pub tap_ratio: f64,
    /// Phase shift applied from from_bus to to_bus
    pub phase_shift: Radians,
    /// Total line charging susceptance (per-unit, split half/half)
    pub charging_b: PerUnit,
    /// Thermal limit; `None` or non-positive means unconstrained
    pub s_max: Option<MegavoltAmperes>,
    /// Operational status flag
    pub status: bool,
}

impl Default for Branch {
    fn default() -> Self {
        Self {
            id: BranchId(0),
            name: String::new(),
            from_bus: BusId(0),
            to_bus: BusId(0),
            resistance: 0.0,
            reactance: 0.0,
            tap_ratio: 1.0,
            phase_shift: Radians(0.0),
            charging_b: PerUnit(0.0),
            s_max: None,
            status: true,
        }
    }
}

impl Branch {
    pub fn new(
        id: BranchId,
        name: String,
        from_bus: BusId,
        to_bus: BusId,
        resistance: f64,
        reactance: f64,
    ) -> Self {
        Self {
            id,
            name,
            from_bus,
            to_bus,
            resistance,
            reactance,
            ..Self::default()
        }
    }

    /// Attach a symmetric thermal limit in MVA.
    pub fn with_s_max(mut self, s_max_mva: Option<f64>) -> Self {
        self.s_max = s_max_mva.map(MegavoltAmperes);
        self
    }

    pub fn with_charging(mut self, charging_b: f64) -> Self {
        self.charging_b = PerUnit(charging_b);
        self
    }

    /// Off-nominal transformer: tap magnitude and phase shift.
    pub fn with_tap(mut self, tap_ratio: f64, phase_shift: impl Into<Radians>) -> Self {
        self.tap_ratio = tap_ratio;
        self.phase_shift = phase_shift.into();
        self
    }

    /// Tap magnitude with the "zero means nominal" convention applied.
    pub fn effective_tap(&self) -> f64 {
        if self.tap_ratio > 0.0 {
            self.tap_ratio
        } else {
            1.0
        }
    }

    /// In service and carrying a positive thermal limit.
    pub fn is_flow_constrained(&self) -> bool {
        self.status && self.s_max.is_some_and(|s| s.value() > 0.0)
    }
}

/// The core power network graph
#[derive(Debug, Default)]
pub struct Network {
    pub graph: Graph<Bus, Branch, Undirected>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
        }
    }

    pub fn add_bus(&mut self, bus: Bus) -> NodeIndex {
        self.graph.add_node(bus)
    }

    pub fn add_branch(&mut self, from: NodeIndex, to: NodeIndex, branch: Branch) -> EdgeIndex {
        self.graph.add_edge(from, to, branch)
    }

    /// Branches in edge insertion order.
    pub fn branches(&self) -> Vec<&Branch> {
        self.graph.edge_weights().collect()
    }

    /// Map each bus id to its consecutive 0-based internal index (node
    /// order).
    pub fn bus_index_map(&self) -> CoreResult<HashMap<BusId, usize>> {
        if self.graph.node_count() == 0 {
            return Err(CoreError::NoBuses);
        }
        let mut map = HashMap::with_capacity(self.graph.node_count());
        for (idx, bus) in self.graph.node_weights().enumerate() {
            if map.insert(bus.id, idx).is_some() {
                return Err(CoreError::DuplicateBus(bus.id.value()));
            }
        }
        Ok(map)
    }

    /// Validate branch data that would break admittance construction.
    ///
    /// Populates the provided `Diagnostics` with any warnings/errors found.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let bus_map = match self.bus_index_map() {
            Ok(map) => map,
            Err(e) => {
                diag.add_error("structure", &e.to_string());
                return;
            }
        };

        for branch in self.graph.edge_weights() {
            let entity = format!("Branch {}", branch.name);
            for bus in [branch.from_bus, branch.to_bus] {
                if !bus_map.contains_key(&bus) {
                    diag.add_error_with_entity(
                        "reference",
                        &format!("references unknown bus {}", bus.value()),
                        &entity,
                    );
                }
            }
            if branch.status && branch.resistance.hypot(branch.reactance) < 1e-12 {
                diag.add_error_with_entity("physical", "zero series impedance", &entity);
            }
            if branch.tap_ratio < 0.0 {
                diag.add_warning_with_entity(
                    "physical",
                    "negative tap ratio treated as nominal",
                    &entity,
                );
            }
        }

        if !self.graph.edge_weights().any(Branch::is_flow_constrained) {
            diag.add_warning("structure", "Network has no flow-constrained branches");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bus() -> Network {
        let mut network = Network::new();
        let bus1 = network.add_bus(Bus::new(BusId(1), "Bus 1"));
        let bus2 = network.add_bus(Bus::new(BusId(2), "Bus 2"));
        network.add_branch(
            bus1,
            bus2,
            Branch::new(BranchId(0), "Branch 1-2".into(), BusId(1), BusId(2), 0.01, 0.1)
                .with_s_max(Some(100.0)),
        );
        network
    }

    #[test]
    fn test_network_creation() {
        let network = two_bus();
        assert_eq!(network.graph.node_count(), 2);
        assert_eq!(network.graph.edge_count(), 1);
        assert_eq!(network.graph[NodeIndex::new(0)].name, "Bus 1");
        assert_eq!(network.branches()[0].to_bus, BusId(2));
    }

    #[test]
    fn test_bus_index_map_order() {
        let network = two_bus();
        let map = network.bus_index_map().unwrap();
        assert_eq!(map[&BusId(1)], 0);
        assert_eq!(map[&BusId(2)], 1);
    }

    #[test]
    fn test_bus_index_map_rejects_empty_and_duplicates() {
        assert_eq!(Network::new().bus_index_map(), Err(CoreError::NoBuses));

        let mut network = two_bus();
        network.add_bus(Bus::new(BusId(2), "Bus 2 again"));
        assert_eq!(network.bus_index_map(), Err(CoreError::DuplicateBus(2)));
    }

    #[test]
    fn test_flow_constrained() {
        let branch = Branch::default();
        assert!(!branch.is_flow_constrained());
        assert!(branch.clone().with_s_max(Some(50.0)).is_flow_constrained());
        assert!(!branch.clone().with_s_max(Some(0.0)).is_flow_constrained());

        let mut out = branch.with_s_max(Some(50.0));
        out.status = false;
        assert!(!out.is_flow_constrained());
    }

    #[test]
    fn test_effective_tap() {
        let branch = Branch::default().with_tap(0.0, Degrees(5.0));
        assert_eq!(branch.effective_tap(), 1.0);
        assert!((branch.phase_shift.value() - 5f64.to_radians()).abs() < 1e-15);
        assert_eq!(Branch::default().with_tap(0.97, Radians::ZERO).effective_tap(), 0.97);
    }

    #[test]
    fn test_validation_flags_bad_branches() {
        let mut network = two_bus();
        let b1 = NodeIndex::new(0);
        let b2 = NodeIndex::new(1);
        network.add_branch(
            b1,
            b2,
            Branch::new(BranchId(1), "short".into(), BusId(1), BusId(9), 0.0, 0.0),
        );

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.error_count(), 2);
        assert!(diag.errors().any(|i| i.message.contains("unknown bus 9")));
        assert!(diag.errors().any(|i| i.message.contains("zero series impedance")));
    }

    #[test]
    fn test_validation_warns_without_limits() {
        let mut network = Network::new();
        network.add_bus(Bus::new(BusId(0), "lonely"));
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(!diag.has_errors());
        assert!(diag
            .warnings()
            .any(|i| i.message.contains("no flow-constrained")));
    }

    #[test]
    fn test_validation_ignores_out_of_service_limits() {
        let mut network = two_bus();
        let edge = network.graph.edge_indices().next().unwrap();
        network.graph[edge].status = false;

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.warning_count(), 1);
        assert!(!diag.has_errors());
    }
}
