//! Edit validation
//!
//! Checks an operator supplied value against the rest of the set before the
//! solver runs. Parse and range checks are performed by
//! [`ParamNode::set_raw`](super::ParamNode::set_raw), everything which
//! depends on another node is checked here.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use action_if::Role;
use log::debug;

// Internal
use super::{ErrorKind, NodeError, NodeSet, NodeSnapshot, NodeState};
use util::maths::signs_conflict;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The outcome of validating a newly fixed node.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub verdict: Verdict,

    /// Fixed nodes which the edited value contradicts, along with the error
    /// they shall be put into.
    pub knock_on: Vec<(Role, NodeError)>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Verdict on the edited node itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// The value is an independent choice, the node stays fixed.
    Accept,

    /// The value is exactly what the set already determines. The node
    /// becomes derived with the given value.
    Coincide(f64),

    /// The edit is rejected and the node shall be put into error.
    Reject(NodeError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// The nodes which, when fixed at zero, force the given node, along with the
/// value they force it to.
///
/// | node  | forced by       |
/// |-------|-----------------|
/// | `v`   | `s = 0`, `r = 0`|
/// | `w`   | `a = 0`         |
/// | `r`   | `v = 0` to `0`, `w = 0` to `∞` |
/// | `s`   | `v = 0`, `r = 0`|
/// | `a`   | `w = 0`         |
/// | `t`   | nothing         |
pub fn forced_by(role: Role) -> &'static [(Role, f64)] {
    match role {
        Role::V => &[(Role::S, 0.0), (Role::R, 0.0)],
        Role::W => &[(Role::A, 0.0)],
        Role::R => &[(Role::V, 0.0), (Role::W, std::f64::INFINITY)],
        Role::S => &[(Role::V, 0.0), (Role::R, 0.0)],
        Role::A => &[(Role::W, 0.0)],
        Role::T => &[],
    }
}

/// The nodes which the given node forces when it is fixed at zero, along with
/// the value they are forced to. Inverse of [`forced_by`].
///
/// | zero  | forces          |
/// |-------|-----------------|
/// | `v`   | `r = 0`, `s = 0`|
/// | `w`   | `r = ∞`, `a = 0`|
/// | `r`   | `v = 0`, `s = 0`|
/// | `s`   | `v = 0`         |
/// | `a`   | `w = 0`         |
pub fn forces(role: Role) -> Vec<(Role, f64)> {
    Role::ALL
        .iter()
        .flat_map(|&target| {
            forced_by(target)
                .iter()
                .filter(move |(forcer, _)| *forcer == role)
                .map(move |(_, value)| (target, *value))
        })
        .collect()
}

/// Check the value of `role` against the zero-forcing rules.
///
/// Returns `Ok(Some(value))` if a fixed node forces the role to exactly this
/// value, `Ok(None)` if no fixed node forces it, or the error if a fixed node
/// forces it to something else.
pub fn check_forcing(nodes: &NodeSet, role: Role, value: f64)
    -> Result<Option<f64>, NodeError>
{
    let mut coincide = None;

    for &(forcer, forced) in forced_by(role) {
        let node = &nodes[forcer];

        if !node.is_fixed() || node.value() != 0.0 {
            continue;
        }

        if value == forced {
            coincide = Some(forced);
        }
        else {
            return Err(NodeError::conflict(ErrorKind::SignConflict, forcer));
        }
    }

    Ok(coincide)
}

/// Check the sign of `value` against the role's conjugate, if the conjugate
/// is resolved.
pub fn check_sign(nodes: &NodeSet, role: Role, value: f64)
    -> Result<(), NodeError>
{
    if let Some(conj) = role.conjugate() {
        if let Some(conj_value) = nodes.resolved_value(conj) {
            if signs_conflict(value, conj_value) {
                return Err(NodeError::conflict(ErrorKind::SignConflict, conj));
            }
        }
    }

    Ok(())
}

/// Check that fixing `role` does not bound the action both by time and by
/// geometric extent.
pub fn check_exclusivity(nodes: &NodeSet, role: Role) -> Result<(), NodeError> {
    let rivals: &[Role] = match role {
        Role::T => &[Role::S, Role::A],
        Role::S | Role::A => &[Role::T],
        _ => &[],
    };

    match rivals.iter().find(|&&r| nodes[r].is_fixed()) {
        Some(&r) => Err(NodeError::conflict(ErrorKind::ExclusivityConflict, r)),
        None => Ok(())
    }
}

/// Validate a node which `set_raw` has just fixed.
///
/// # Inputs
/// - `nodes`: The set, with `role` already fixed at its new value and every
///   other node as it was before the edit.
/// - `role`: The edited node.
/// - `prior`: The snapshot of the edited node before the edit.
pub fn validate_fixed(nodes: &NodeSet, role: Role, prior: &NodeSnapshot)
    -> Validation
{
    let value = nodes[role].value();

    let verdict = match judge(nodes, role, value, prior) {
        Ok(v) => v,
        Err(e) => Verdict::Reject(e)
    };

    let knock_on = match verdict {
        Verdict::Accept => knock_on(nodes, role, value),
        _ => Vec::new()
    };

    debug!("Validated {} = {}: {:?}", role, value, verdict);

    Validation { verdict, knock_on }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn judge(nodes: &NodeSet, role: Role, value: f64, prior: &NodeSnapshot)
    -> Result<Verdict, NodeError>
{
    // A node excluded by the bound can't be entered, not even as the value
    // the set already forces it to
    check_exclusivity(nodes, role)?;

    if let Some(forced) = check_forcing(nodes, role, value)? {
        return Ok(Verdict::Coincide(forced));
    }

    check_sign(nodes, role, value)?;

    if prior.state == NodeState::Derived {
        return match prior.value {
            Some(v) if v == value => Ok(Verdict::Coincide(v)),
            _ => Err(NodeError::new(ErrorKind::Overdetermined))
        };
    }

    Ok(Verdict::Accept)
}

fn knock_on(nodes: &NodeSet, role: Role, value: f64) -> Vec<(Role, NodeError)> {
    if value != 0.0 {
        return Vec::new();
    }

    forces(role)
        .into_iter()
        .filter(|&(target, forced)| {
            let node = &nodes[target];
            node.is_fixed() && node.value() != forced
        })
        .map(|(target, _)| {
            (target, NodeError::conflict(ErrorKind::SignConflict, role))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::action_ctrl::Bounds;

    fn fix(nodes: &mut NodeSet, role: Role, text: &str) -> NodeSnapshot {
        let prior = nodes[role].snapshot();
        nodes[role].set_raw(text, &Bounds::unbounded());
        prior
    }

    #[test]
    fn test_forcing_tables() {
        assert_eq!(forces(Role::V), vec![(Role::R, 0.0), (Role::S, 0.0)]);
        assert_eq!(forces(Role::S), vec![(Role::V, 0.0)]);
        assert_eq!(forces(Role::W), vec![(Role::R, std::f64::INFINITY), (Role::A, 0.0)]);
        assert_eq!(forces(Role::A), vec![(Role::W, 0.0)]);
        assert!(forces(Role::T).is_empty());
    }

    #[test]
    fn test_zero_forced_value() {
        let mut nodes = NodeSet::new();
        fix(&mut nodes, Role::V, "0");

        let prior = fix(&mut nodes, Role::S, "1");
        assert_eq!(
            validate_fixed(&nodes, Role::S, &prior).verdict,
            Verdict::Reject(NodeError::conflict(ErrorKind::SignConflict, Role::V))
        );

        let prior = fix(&mut nodes, Role::S, "0");
        assert_eq!(
            validate_fixed(&nodes, Role::S, &prior).verdict,
            Verdict::Coincide(0.0)
        );
    }

    #[test]
    fn test_straight_line_radius() {
        let mut nodes = NodeSet::new();
        fix(&mut nodes, Role::W, "0");

        let prior = fix(&mut nodes, Role::R, "5");
        assert_eq!(
            validate_fixed(&nodes, Role::R, &prior).verdict,
            Verdict::Reject(NodeError::conflict(ErrorKind::SignConflict, Role::W))
        );
    }

    #[test]
    fn test_sign_and_exclusivity() {
        let mut nodes = NodeSet::new();
        fix(&mut nodes, Role::V, "0.2");

        let prior = fix(&mut nodes, Role::S, "-1");
        assert_eq!(
            validate_fixed(&nodes, Role::S, &prior).verdict,
            Verdict::Reject(NodeError::conflict(ErrorKind::SignConflict, Role::V))
        );

        let prior = fix(&mut nodes, Role::S, "1");
        assert_eq!(validate_fixed(&nodes, Role::S, &prior).verdict, Verdict::Accept);

        let prior = fix(&mut nodes, Role::T, "5");
        assert_eq!(
            validate_fixed(&nodes, Role::T, &prior).verdict,
            Verdict::Reject(NodeError::conflict(ErrorKind::ExclusivityConflict, Role::S))
        );
    }

    #[test]
    fn test_exclusivity_before_forcing() {
        let mut nodes = NodeSet::new();
        fix(&mut nodes, Role::V, "0");
        fix(&mut nodes, Role::W, "0");
        fix(&mut nodes, Role::T, "5");

        let prior = fix(&mut nodes, Role::S, "0");
        assert_eq!(
            validate_fixed(&nodes, Role::S, &prior).verdict,
            Verdict::Reject(NodeError::conflict(ErrorKind::ExclusivityConflict, Role::T))
        );

        let prior = fix(&mut nodes, Role::A, "0");
        assert_eq!(
            validate_fixed(&nodes, Role::A, &prior).verdict,
            Verdict::Reject(NodeError::conflict(ErrorKind::ExclusivityConflict, Role::T))
        );
    }

    #[test]
    fn test_overdetermined() {
        let mut nodes = NodeSet::new();
        nodes[Role::R].set_derived(2.0);

        let prior = fix(&mut nodes, Role::R, "3");
        assert_eq!(
            validate_fixed(&nodes, Role::R, &prior).verdict,
            Verdict::Reject(NodeError::new(ErrorKind::Overdetermined))
        );

        let mut nodes = NodeSet::new();
        nodes[Role::R].set_derived(2.0);
        let prior = fix(&mut nodes, Role::R, "2");
        assert_eq!(
            validate_fixed(&nodes, Role::R, &prior).verdict,
            Verdict::Coincide(2.0)
        );
    }

    #[test]
    fn test_knock_on() {
        let mut nodes = NodeSet::new();
        fix(&mut nodes, Role::S, "1");
        fix(&mut nodes, Role::V, "0.5");

        let prior = fix(&mut nodes, Role::R, "0");
        let validation = validate_fixed(&nodes, Role::R, &prior);

        assert_eq!(validation.verdict, Verdict::Accept);
        assert_eq!(
            validation.knock_on,
            vec![
                (Role::V, NodeError::conflict(ErrorKind::SignConflict, Role::R)),
                (Role::S, NodeError::conflict(ErrorKind::SignConflict, Role::R)),
            ]
        );
    }
}
