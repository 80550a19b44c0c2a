//! Per-call configuration: which flow quantity is limited and how the voltage
//! state is parameterised.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantity bounded by the branch flow constraint.
///
/// The single-letter spellings accepted by [`FromStr`](std::str::FromStr) are
/// the conventional OPF option flags: `S`, `P`, `I` and `2` (squared real
/// power).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowLimit {
    /// |I|² at each branch end
    CurrentSquared,
    /// P² at each branch end
    RealPowerSquared,
    /// P at each branch end
    RealPower,
    /// |S|² at each branch end
    #[default]
    ApparentPowerSquared,
}

impl FlowLimit {
    pub const ALL: [FlowLimit; 4] = [
        FlowLimit::CurrentSquared,
        FlowLimit::RealPowerSquared,
        FlowLimit::RealPower,
        FlowLimit::ApparentPowerSquared,
    ];

    /// Whether second derivatives exist for this metric in `coordinates`.
    pub fn supports(self, coordinates: VoltageCoordinates) -> bool {
        match (self, coordinates) {
            (_, VoltageCoordinates::Polar) => true,
            (FlowLimit::ApparentPowerSquared, VoltageCoordinates::Cartesian) => true,
            (_, VoltageCoordinates::Cartesian) => false,
        }
    }

    /// Flow quantity is the branch current rather than power.
    pub fn is_current(self) -> bool {
        matches!(self, FlowLimit::CurrentSquared)
    }
}

impl fmt::Display for FlowLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowLimit::CurrentSquared => write!(f, "current-squared"),
            FlowLimit::RealPowerSquared => write!(f, "real-power-squared"),
            FlowLimit::RealPower => write!(f, "real-power"),
            FlowLimit::ApparentPowerSquared => write!(f, "apparent-power-squared"),
        }
    }
}

impl std::str::FromStr for FlowLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "i" | "current" | "current-squared" | "current_squared" => {
                Ok(FlowLimit::CurrentSquared)
            }
            "2" | "p2" | "real-power-squared" | "real_power_squared" => {
                Ok(FlowLimit::RealPowerSquared)
            }
            "p" | "real-power" | "real_power" => Ok(FlowLimit::RealPower),
            "s" | "apparent" | "apparent-power-squared" | "apparent_power_squared" => {
                Ok(FlowLimit::ApparentPowerSquared)
            }
            _ => Err(format!("Unknown flow limit: {}", s)),
        }
    }
}

/// Parameterisation of the complex bus voltage in the state vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoltageCoordinates {
    /// State is (Va, Vm): angle in radians, magnitude in per-unit
    #[default]
    Polar,
    /// State is (Vr, Vi)
    Cartesian,
}

impl fmt::Display for VoltageCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoltageCoordinates::Polar => write!(f, "polar"),
            VoltageCoordinates::Cartesian => write!(f, "cartesian"),
        }
    }
}

impl std::str::FromStr for VoltageCoordinates {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polar" | "0" => Ok(VoltageCoordinates::Polar),
            "cartesian" | "rectangular" | "1" => Ok(VoltageCoordinates::Cartesian),
            _ => Err(format!("Unknown voltage coordinates: {}", s)),
        }
    }
}

/// Immutable options for one Hessian evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HessianConfig {
    pub flow_limit: FlowLimit,
    pub coordinates: VoltageCoordinates,
}

impl HessianConfig {
    pub fn new(flow_limit: FlowLimit, coordinates: VoltageCoordinates) -> Self {
        Self {
            flow_limit,
            coordinates,
        }
    }

    pub fn polar(flow_limit: FlowLimit) -> Self {
        Self::new(flow_limit, VoltageCoordinates::Polar)
    }

    pub fn cartesian(flow_limit: FlowLimit) -> Self {
        Self::new(flow_limit, VoltageCoordinates::Cartesian)
    }

    /// False when the evaluation would be skipped with a warning.
    pub fn is_supported(&self) -> bool {
        self.flow_limit.supports(self.coordinates)
    }
}

impl fmt::Display for HessianConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.flow_limit, self.coordinates)
    }
}
