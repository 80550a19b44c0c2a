//! Unit newtypes for branch quantities.
//!
//! Ratings arrive in MVA while the derivative code works in per-unit on the
//! system base; phase shifts are stored in radians but often specified in
//! degrees. The wrappers keep those apart until `BranchSet::from_network`
//! unwraps them.
//!
//! ```
//! use branchlim_core::units::{Degrees, MegavoltAmperes, Radians};
//!
//! let rating = MegavoltAmperes(250.0);
//! assert_eq!(rating.to_per_unit(MegavoltAmperes(100.0)).value(), 2.5);
//!
//! let shift: Radians = Degrees(180.0).into();
//! assert!((shift.value() - std::f64::consts::PI).abs() < 1e-15);
//! ```

use serde::{Deserialize, Serialize};

/// Apparent power in megavolt-amperes (MVA)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MegavoltAmperes(pub f64);

impl MegavoltAmperes {
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Convert to per-unit on the given system base.
    ///
    /// A zero base yields zero rather than infinity.
    #[inline]
    pub fn to_per_unit(self, base: MegavoltAmperes) -> PerUnit {
        if base.0.abs() < 1e-12 {
            PerUnit::ZERO
        } else {
            PerUnit(self.0 / base.0)
        }
    }
}

/// Dimensionless per-unit quantity
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PerUnit(pub f64);

impl PerUnit {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Radians(pub f64);

impl Radians {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Angle in degrees, as found in case files
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(pub f64);

impl From<Degrees> for Radians {
    fn from(value: Degrees) -> Self {
        Radians(value.0.to_radians())
    }
}
