//! # Action interface crate.
//!
//! Provides the interfaces shared between the operator tool, its scripts and the chassis driver.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator edit commands and kinematic quantity roles
pub mod edit;

/// Resolved motion actions emitted by the action editor
pub mod action;

/// Interface to the external chassis driver library
pub mod chassis;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use action::{DriveMode, ResolvedAction};
pub use chassis::{ChassisDriver, ChassisError, ChassisState, Odometry, Spatium};
pub use edit::{EditCmd, EditParseError, Role, ToolCmd};
