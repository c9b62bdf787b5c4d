//! Action control module
//!
//! Lets the operator specify a motion (a circular or straight path, bounded by
//! either elapsed time or by geometric extent) by entering any sufficient
//! subset of six kinematic quantities, and derives the rest:
//!
//! | role | quantity      | units | conjugate |
//! |------|---------------|-------|-----------|
//! | `v`  | linear speed  | m/s   | `s`       |
//! | `w`  | angular speed | deg/s | `a`       |
//! | `r`  | turn radius   | m     |           |
//! | `s`  | distance      | m     | `v`       |
//! | `a`  | turn angle    | deg   | `w`       |
//! | `t`  | duration      | s     |           |
//!
//! Every edit is validated (`validator`), then the remaining quantities are
//! re-derived to a fixpoint (`solver`). Once exactly three quantities are
//! fixed by the operator and none is in error the action can be confirmed,
//! which emits a [`ResolvedAction`](action_if::ResolvedAction) (`builder`) and
//! starts a fresh edit session.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod builder;
mod node;
mod params;
mod solver;
mod state;
mod validator;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use builder::*;
pub use node::*;
pub use params::*;
pub use solver::*;
pub use state::*;
pub use validator::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of kinematic quantities in an action.
pub const NUM_NODES: usize = 6;

/// The number of quantities the operator must fix to pin down an action: two
/// for the velocity pair and one for the bound.
pub const NUM_FIXED_FOR_READY: usize = 3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ActionCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ActionCtrlError {
    #[error("The action cannot be confirmed: {0}")]
    NotReady(ReadinessError),
}

/// Possible errors that can occur while initialising ActionCtrl.
#[derive(Debug, thiserror::Error)]
pub enum ActionCtrlInitError {
    #[error("Could not load the ActionCtrl parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Could not open the ActionCtrl archives: {0}")]
    ArchiveError(util::archive::ArchiveError),
}
