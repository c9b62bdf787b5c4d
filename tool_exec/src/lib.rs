//! # Chassis tool library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the tool crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Action control module - resolves the kinematic quantities entered by the operator into a single
/// action
pub mod action_ctrl;

/// Action queue - dispatches confirmed actions to the chassis one at a time
pub mod action_queue;

/// Data store - holds the modules of the executable and the data passed between them
pub mod data_store;

/// Executable parameters
pub mod params;

/// Simulated chassis - an in-process chassis driver for running without hardware
pub mod sim_chassis;
