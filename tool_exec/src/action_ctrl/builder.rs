//! Action builder
//!
//! Decides whether the set of nodes pins down a single action, and builds the
//! [`ResolvedAction`] when it does.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use action_if::{DriveMode, ResolvedAction, Role, Spatium};
use log::debug;
use thiserror::Error;

// Internal
use super::{NodeSet, NUM_FIXED_FOR_READY};
use util::maths::deg_to_rad;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a set of nodes is not ready to be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ReadinessError {
    #[error("{0} is in error")]
    NodeInError(Role),

    #[error("{0} quantities are fixed, exactly 3 are required")]
    FixedCount(usize),

    #[error("{0} could not be resolved from the fixed quantities")]
    Unresolved(Role),

    #[error("The action would never complete, a speed is zero while its extent is not")]
    NeverComplete,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Check whether the set pins down a single action.
///
/// The set is ready when no node is in error, exactly three nodes are fixed,
/// both speeds are resolved and the action is bounded either by a fixed
/// duration or by a resolved distance and angle which the speeds can cover.
pub fn readiness(nodes: &NodeSet) -> Result<(), ReadinessError> {
    if let Some((role, _)) = nodes.first_error() {
        return Err(ReadinessError::NodeInError(role));
    }

    let num_fixed = nodes.count_fixed();
    if num_fixed != NUM_FIXED_FOR_READY {
        return Err(ReadinessError::FixedCount(num_fixed));
    }

    let v = resolved(nodes, Role::V)?;
    let w = resolved(nodes, Role::W)?;

    if nodes[Role::T].is_fixed() {
        return Ok(());
    }

    let s = resolved(nodes, Role::S)?;
    let a = resolved(nodes, Role::A)?;

    if (v == 0.0 && s != 0.0) || (w == 0.0 && a != 0.0) {
        return Err(ReadinessError::NeverComplete);
    }

    Ok(())
}

/// Build the action pinned down by the set.
///
/// For a distance bounded action the range is the spatium of the absolute
/// distance and turn angle, as calculated by the chassis driver.
pub fn build(nodes: &NodeSet, spatium: &dyn Spatium)
    -> Result<ResolvedAction, ReadinessError>
{
    readiness(nodes)?;

    let v_ms = nodes[Role::V].value();
    let w_rads = deg_to_rad(nodes[Role::W].value());

    let action = if nodes[Role::T].is_fixed() {
        ResolvedAction {
            v_ms,
            w_rads,
            mode: DriveMode::Time,
            range: nodes[Role::T].value(),
        }
    }
    else {
        let distance_m = nodes[Role::S].value().abs();
        let angle_rad = deg_to_rad(nodes[Role::A].value()).abs();

        ResolvedAction {
            v_ms,
            w_rads,
            mode: DriveMode::Space,
            range: spatium.calculate_spatium(distance_m, angle_rad),
        }
    };

    debug!("Built action {:?}", action);

    Ok(action)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn resolved(nodes: &NodeSet, role: Role) -> Result<f64, ReadinessError> {
    nodes
        .resolved_value(role)
        .ok_or(ReadinessError::Unresolved(role))
}
