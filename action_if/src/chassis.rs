//! # Chassis driver interface
//!
//! Motion execution, odometry integration and actuation are performed by an external chassis
//! driver library. This module describes the operations the tool consumes from that library. Every
//! operation either succeeds or reports an opaque error.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Conversion from decoupled linear distance and turn angle into the single extent ("spatium")
/// expected by the distance-bounded drive primitive.
///
/// The conversion is owned by the chassis driver. Implementations shall be pure, monotonic in both
/// arguments and return a non-negative value, or NaN for a `(0, 0)` input.
pub trait Spatium {
    /// Calculate the spatium of a motion.
    ///
    /// # Inputs
    /// - `distance_m`: absolute linear distance in meters.
    /// - `angle_rad`: absolute turn angle in radians.
    fn calculate_spatium(&self, distance_m: f64, angle_rad: f64) -> f64;
}

/// Operations provided by the chassis driver.
pub trait ChassisDriver: Spatium {
    /// Open the connection to the chassis, returning the name of the connected port.
    fn initialise(&mut self) -> Result<String, ChassisError>;

    /// Close the connection to the chassis.
    fn shutdown(&mut self) -> Result<(), ChassisError>;

    /// Current state of the chassis.
    fn state(&self) -> ChassisState;

    /// Lock the chassis, disabling the actuators.
    fn lock(&mut self) -> Result<(), ChassisError>;

    /// Unlock the chassis, enabling the actuators.
    fn unlock(&mut self) -> Result<(), ChassisError>;

    /// Drive at the given speeds until the spatium has been covered.
    fn drive_by_space(&mut self, v_ms: f64, w_rads: f64, spatium: f64)
        -> Result<(), ChassisError>;

    /// Drive at the given speeds for the given duration.
    fn drive_by_time(&mut self, v_ms: f64, w_rads: f64, time_s: f64)
        -> Result<(), ChassisError>;

    /// Adjust the zero position of the steering wheel.
    fn adjust_steering(&mut self, offset_rad: f64) -> Result<(), ChassisError>;

    /// Cancel the action currently being executed.
    fn cancel(&mut self) -> Result<(), ChassisError>;

    /// Pause the action currently being executed.
    fn pause(&mut self) -> Result<(), ChassisError>;

    /// Resume a paused action.
    fn resume(&mut self) -> Result<(), ChassisError>;

    /// Returns true if the chassis is paused.
    fn is_paused(&self) -> bool;

    /// Progress of the action being executed, between 0 and 1, or `None` if no action is being
    /// executed.
    fn progress(&self) -> Option<f64>;

    /// Read the odometry of the chassis.
    fn read_odometry(&self) -> Result<Odometry, ChassisError>;

    /// Reset the odometry of the chassis to zero.
    fn reset_odometry(&mut self) -> Result<(), ChassisError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Odometry reported by the chassis driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Odometry {
    /// Total distance travelled.
    ///
    /// Units: meters
    pub s_m: f64,

    /// Total absolute angle turned through.
    ///
    /// Units: radians
    pub sa_rad: f64,

    /// Position along the odometry frame's X axis.
    ///
    /// Units: meters
    pub x_m: f64,

    /// Position along the odometry frame's Y axis.
    ///
    /// Units: meters
    pub y_m: f64,

    /// Heading in the odometry frame.
    ///
    /// Units: radians
    pub theta_rad: f64,

    /// Current linear speed.
    ///
    /// Units: meters/second
    pub v_ms: f64,

    /// Current angular speed.
    ///
    /// Units: radians/second
    pub w_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible states of the chassis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChassisState {
    /// All nodes are offline.
    Offline,

    /// The chassis is unlocked and may move.
    Unlocked,

    /// The chassis has faulted, locking it may recover it.
    Error,

    /// The chassis is locked.
    Locked,
}

/// Errors reported by the chassis driver.
#[derive(Debug, Error)]
pub enum ChassisError {
    #[error("The chassis driver has not been initialised")]
    NotInitialised,

    #[error("The chassis is locked")]
    Locked,

    #[error("Chassis driver error: {0}")]
    Driver(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<F> Spatium for F
where
    F: Fn(f64, f64) -> f64,
{
    fn calculate_spatium(&self, distance_m: f64, angle_rad: f64) -> f64 {
        self(distance_m, angle_rad)
    }
}
