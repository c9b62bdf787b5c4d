//! Parameters structure for ActionCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use action_if::Role;
use serde::Deserialize;

use super::Bounds;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Action control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- CAPABILITIES ----

    /// Maximum absolute linear speed the operator may demand.
    ///
    /// Units: meters/second
    pub max_linear_speed_ms: f64,

    /// Maximum absolute angular speed the operator may demand.
    ///
    /// Units: degrees/second
    pub max_angular_speed_degs: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            max_linear_speed_ms: 2.0,
            max_angular_speed_degs: 120.0,
        }
    }
}

impl Params {
    /// The bounds an operator-supplied value of the given quantity must lie
    /// within.
    pub fn bounds(&self, role: Role) -> Bounds {
        match role {
            Role::V => Bounds::symmetric(self.max_linear_speed_ms),
            Role::W => Bounds::symmetric(self.max_angular_speed_degs),
            Role::R | Role::S | Role::A => Bounds::unbounded(),
            Role::T => Bounds::positive(),
        }
    }
}
