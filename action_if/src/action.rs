//! # Resolved actions
//!
//! A resolved action is the single command tuple produced when the operator confirms a complete
//! set of kinematic quantities.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A fully resolved motion action, ready to be passed to the chassis driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAction {
    /// Linear speed of the chassis.
    ///
    /// Units: meters/second
    pub v_ms: f64,

    /// Angular speed of the chassis, following the right hand rule about the chassis Z+ axis.
    ///
    /// Units: radians/second
    pub w_rads: f64,

    /// What bounds the action.
    pub mode: DriveMode,

    /// The bound of the action. For [`DriveMode::Time`] this is the duration in seconds, for
    /// [`DriveMode::Space`] it is the spatium calculated by the chassis driver.
    pub range: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The quantity which bounds an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveMode {
    /// Action ends after a duration.
    Time,

    /// Action ends after a geometric extent (the spatium) has been covered.
    Space,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ResolvedAction {
    /// Returns true if the action is bounded by time rather than by geometric extent.
    pub fn time_based(&self) -> bool {
        self.mode == DriveMode::Time
    }

    /// The action as the `(v, w, time_based, range)` tuple consumed by the chassis driver.
    pub fn as_tuple(&self) -> (f64, f64, bool, f64) {
        (self.v_ms, self.w_rads, self.time_based(), self.range)
    }
}

impl Display for ResolvedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = match self.mode {
            DriveMode::Time => format!("{:.2} s", self.range),
            DriveMode::Space => format!("spatium {:.3}", self.range),
        };

        write!(
            f,
            "v = {:.2} m/s | w = {:.1} deg/s | {}",
            self.v_ms,
            self.w_rads.to_degrees(),
            bound
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tuple() {
        let action = ResolvedAction {
            v_ms: 0.1,
            w_rads: 0.0,
            mode: DriveMode::Time,
            range: 5.0,
        };

        assert_eq!(action.as_tuple(), (0.1, 0.0, true, 5.0));
        assert_eq!(
            format!("{}", action),
            "v = 0.10 m/s | w = 0.0 deg/s | 5.00 s"
        );
    }
}
