//! Constraint solver
//!
//! Derives every quantity the operator hasn't fixed from those they have. The
//! quantities depend on each other cyclically (`v`, `w` and `r` through the
//! linear/angular speed pair, `s`, `a` and `r` through the extent pair), so
//! rather than ordering the derivations the solver sweeps over the unresolved
//! nodes until a sweep makes no progress.
//!
//! Each node is derived by the first of its rules which applies:
//!
//! | node | rules, in order                                               |
//! |------|---------------------------------------------------------------|
//! | `v`  | `s = 0` or `r = 0` gives 0, then `w * r`                      |
//! | `w`  | `a = 0` gives 0, then `v / r`                                 |
//! | `r`  | `v = 0` gives 0, `w = 0` gives ∞, then `v / w`, then `s / a`  |
//! | `s`  | invalid if `t` fixed, `v = 0` or `r = 0` gives 0, then `a * r`|
//! | `a`  | invalid if `t` fixed, `w = 0` gives 0, then `s / r`           |
//! | `t`  | invalid if `s` or `a` fixed, never derived                    |
//!
//! Angles and angular speeds are converted to radians for the ratios.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use action_if::Role;
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::{ErrorKind, ErrorOrigin, NodeError, NodeSet, NodeState, Params, NUM_NODES};
use util::maths::{deg_to_rad, rad_to_deg, signs_conflict};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of a run of the solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SolveReport {
    /// Number of sweeps over the unresolved nodes, including the final sweep
    /// which made no progress.
    pub passes: usize,

    pub derived: Vec<Role>,
    pub invalidated: Vec<Role>,
    pub voided: Vec<Role>,

    /// Nodes whose derived value conflicts in sign with their conjugate.
    pub conflicted: Vec<Role>,

    /// Derived nodes whose value lies outside the bounds an operator supplied
    /// value would be held to.
    pub out_of_range: Vec<Role>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The result of trying to derive a node.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome {
    Value(f64),
    Invalid,
    Pending,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Derive every node which isn't fixed from those which are.
///
/// Fixed nodes are never modified. Derived, invalid and void nodes, and nodes
/// in error raised by a previous solve, are recomputed from scratch. A node
/// in error raised by an edit is only reconsidered once the node it conflicts
/// with is no longer fixed, and leaves the error state only if it can be
/// derived.
pub fn solve(nodes: &mut NodeSet, params: &Params) -> SolveReport {
    let mut report = SolveReport::default();

    // Nodes still to resolve, and whether each one is recovering from an
    // edit error
    let mut waiting: Vec<(Role, bool)> = Vec::with_capacity(NUM_NODES);

    for &role in Role::ALL.iter() {
        match *nodes[role].state() {
            NodeState::Fixed => (),
            NodeState::Error(e) if e.origin == ErrorOrigin::Edit => {
                if recoverable(nodes, &e) {
                    waiting.push((role, true));
                }
            },
            _ => {
                nodes[role].reset();
                waiting.push((role, false));
            }
        }
    }

    while !waiting.is_empty() && report.passes < NUM_NODES {
        report.passes += 1;
        let mut progress = false;

        let mut i = 0;
        while i < waiting.len() {
            let (role, recovering) = waiting[i];

            match derive(nodes, role) {
                Outcome::Pending => {
                    i += 1;
                    continue;
                },
                Outcome::Invalid => {
                    if !recovering {
                        nodes[role].invalidate();
                        report.invalidated.push(role);
                    }
                },
                Outcome::Value(value) => {
                    match sign_conflict(nodes, role, value) {
                        Some(conj) => {
                            if !recovering {
                                nodes[role].fail(NodeError::closure(
                                    ErrorKind::SignConflict, 
                                    conj
                                ));
                                report.conflicted.push(role);
                            }
                            trace!(
                                "{} = {} conflicts in sign with {}", 
                                role, value, conj
                            );
                        },
                        None => {
                            nodes[role].set_derived(value);
                            report.derived.push(role);
                            trace!("Derived {} = {}", role, value);

                            if !params.bounds(role).contains(value) {
                                warn!(
                                    "Derived {} ({}) = {} {} is outside the \
                                    bounds of an operator supplied value",
                                    role.name(), role, value, role.units()
                                );
                                report.out_of_range.push(role);
                            }
                        }
                    }
                }
            }

            waiting.remove(i);
            progress = true;
        }

        if !progress {
            break;
        }
    }

    for (role, recovering) in waiting {
        if !recovering {
            nodes[role].reset();
            report.voided.push(role);
        }
    }

    debug!(
        "Solved in {} passes: derived {:?}, invalidated {:?}, voided {:?}, \
        conflicted {:?}",
        report.passes, 
        report.derived, 
        report.invalidated, 
        report.voided, 
        report.conflicted
    );

    report
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// An edit error can recover once the node it conflicted with is no longer
/// fixed.
fn recoverable(nodes: &NodeSet, error: &NodeError) -> bool {
    match error.conflict {
        Some(c) => !nodes[c].is_fixed(),
        None => false
    }
}

/// Returns the conjugate of the role if it is resolved and conflicts in sign
/// with the value.
fn sign_conflict(nodes: &NodeSet, role: Role, value: f64) -> Option<Role> {
    let conj = role.conjugate()?;
    let conj_value = nodes.resolved_value(conj)?;

    if signs_conflict(value, conj_value) {
        Some(conj)
    }
    else {
        None
    }
}

/// Apply the rules of a node in order of precedence.
fn derive(nodes: &NodeSet, role: Role) -> Outcome {
    let get = |r: Role| nodes.resolved_value(r);
    let is_zero = |r: Role| get(r) == Some(0.0);
    let t_fixed = nodes[Role::T].is_fixed();

    let outcome = match role {
        Role::V => {
            if is_zero(Role::S) || is_zero(Role::R) {
                Outcome::Value(0.0)
            }
            else {
                match (get(Role::W), get(Role::R)) {
                    (Some(w), Some(r)) if w != 0.0 => {
                        Outcome::Value(deg_to_rad(w) * r)
                    },
                    _ => Outcome::Pending
                }
            }
        },
        Role::W => {
            if is_zero(Role::A) {
                Outcome::Value(0.0)
            }
            else {
                match (get(Role::V), get(Role::R)) {
                    (Some(v), Some(r)) => Outcome::Value(rad_to_deg(v / r)),
                    _ => Outcome::Pending
                }
            }
        },
        Role::R => {
            if is_zero(Role::V) {
                Outcome::Value(0.0)
            }
            else if is_zero(Role::W) {
                Outcome::Value(std::f64::INFINITY)
            }
            else if let (Some(v), Some(w)) = (get(Role::V), get(Role::W)) {
                Outcome::Value(v / deg_to_rad(w))
            }
            else {
                match (get(Role::S), get(Role::A)) {
                    (Some(s), Some(a)) if a != 0.0 => {
                        Outcome::Value(s / deg_to_rad(a))
                    },
                    _ => Outcome::Pending
                }
            }
        },
        Role::S => {
            if t_fixed {
                Outcome::Invalid
            }
            else if is_zero(Role::V) || is_zero(Role::R) {
                Outcome::Value(0.0)
            }
            else {
                match (get(Role::A), get(Role::R)) {
                    (Some(a), Some(r)) if a != 0.0 => {
                        Outcome::Value(deg_to_rad(a) * r)
                    },
                    _ => Outcome::Pending
                }
            }
        },
        Role::A => {
            if t_fixed {
                Outcome::Invalid
            }
            else if is_zero(Role::W) {
                Outcome::Value(0.0)
            }
            else {
                match (get(Role::S), get(Role::R)) {
                    (Some(s), Some(r)) if s != 0.0 => {
                        Outcome::Value(rad_to_deg(s / r))
                    },
                    _ => Outcome::Pending
                }
            }
        },
        Role::T => {
            if nodes[Role::S].is_fixed() || nodes[Role::A].is_fixed() {
                Outcome::Invalid
            }
            else {
                Outcome::Pending
            }
        }
    };

    // Only the radius may be infinite, for straight line motion
    match outcome {
        Outcome::Value(v) if v.is_nan() => Outcome::Pending,
        Outcome::Value(v) if v.is_infinite() && role != Role::R => {
            Outcome::Pending
        },
        o => o
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::action_ctrl::Bounds;

    fn fixed(edits: &[(Role, &str)]) -> NodeSet {
        let mut nodes = NodeSet::new();
        for (role, text) in edits {
            nodes[*role].set_raw(text, &Bounds::unbounded());
        }
        nodes
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_speed_pair() {
        let mut nodes = fixed(&[(Role::V, "0.5"), (Role::W, "90"), (Role::T, "2")]);
        let report = solve(&mut nodes, &Params::default());

        assert!(approx(nodes[Role::R].value(), 0.5 / std::f64::consts::FRAC_PI_2));
        assert_eq!(nodes[Role::S].state(), &NodeState::Invalid);
        assert_eq!(nodes[Role::A].state(), &NodeState::Invalid);
        assert_eq!(report.derived, vec![Role::R]);
        assert_eq!(report.invalidated, vec![Role::S, Role::A]);
        assert!(report.voided.is_empty());
        assert!(report.passes <= NUM_NODES);
    }

    #[test]
    fn test_extent_pair() {
        let mut nodes = fixed(&[(Role::S, "3.14159"), (Role::A, "180"), (Role::V, "0.5")]);
        solve(&mut nodes, &Params::default());

        // r = s / a, then w = v / r
        assert!(approx(nodes[Role::R].value(), 3.14159 / std::f64::consts::PI));
        assert!(nodes[Role::W].is_derived());
        assert!(approx(
            nodes[Role::W].value(), 
            rad_to_deg(0.5 / nodes[Role::R].value())
        ));
        assert_eq!(nodes[Role::T].state(), &NodeState::Invalid);
    }

    #[test]
    fn test_straight_line() {
        let mut nodes = fixed(&[(Role::V, "0.1"), (Role::W, "0")]);
        let report = solve(&mut nodes, &Params::default());

        assert_eq!(nodes[Role::A].value(), 0.0);
        assert!(nodes[Role::A].is_derived());
        assert_eq!(nodes[Role::R].value(), std::f64::INFINITY);
        assert!(nodes[Role::R].is_derived());

        // Nothing bounds the action yet
        assert_eq!(nodes[Role::S].state(), &NodeState::Void);
        assert_eq!(nodes[Role::T].state(), &NodeState::Void);
        assert_eq!(report.voided, vec![Role::S, Role::T]);
    }

    #[test]
    fn test_spin_in_place() {
        let mut nodes = fixed(&[(Role::R, "0"), (Role::W, "45")]);
        solve(&mut nodes, &Params::default());

        assert_eq!(nodes[Role::V].value(), 0.0);
        assert_eq!(nodes[Role::S].value(), 0.0);
        assert!(nodes[Role::S].is_derived());
        assert_eq!(nodes[Role::A].state(), &NodeState::Void);
    }

    #[test]
    fn test_derived_sign_conflict() {
        let mut nodes = fixed(&[(Role::V, "0.2"), (Role::R, "-1"), (Role::A, "10")]);
        let report = solve(&mut nodes, &Params::default());

        assert_eq!(
            nodes[Role::W].state(), 
            &NodeState::Error(NodeError::closure(ErrorKind::SignConflict, Role::A))
        );
        assert_eq!(report.conflicted, vec![Role::W, Role::S]);

        // Closure errors are recomputed once the conflict is removed
        nodes[Role::A].reset();
        solve(&mut nodes, &Params::default());
        assert!(nodes[Role::W].is_derived());
        assert!(nodes[Role::W].value() < 0.0);
    }

    #[test]
    fn test_edit_error_recovery() {
        let mut nodes = fixed(&[(Role::V, "0")]);
        nodes[Role::S].fail(NodeError::conflict(ErrorKind::SignConflict, Role::V));
        nodes[Role::T].fail(NodeError::new(ErrorKind::Parse));
        solve(&mut nodes, &Params::default());

        // Still conflicting
        assert!(nodes[Role::S].error().is_some());
        assert!(nodes[Role::T].error().is_some());

        // Once v is cleared s can't be derived, so stays in error
        nodes[Role::V].reset();
        solve(&mut nodes, &Params::default());
        assert!(nodes[Role::S].error().is_some());

        // Once s is derivable it recovers, the parse error never does
        nodes[Role::R].set_raw("0", &Bounds::unbounded());
        solve(&mut nodes, &Params::default());
        assert!(nodes[Role::S].is_derived());
        assert_eq!(nodes[Role::S].value(), 0.0);
        assert_eq!(
            nodes[Role::T].error(), 
            Some(NodeError::new(ErrorKind::Parse))
        );
    }

    #[test]
    fn test_out_of_range_derivation() {
        let mut nodes = fixed(&[(Role::W, "90"), (Role::R, "10")]);
        let report = solve(&mut nodes, &Params::default());

        assert!(nodes[Role::V].is_derived());
        assert_eq!(report.out_of_range, vec![Role::V]);
    }

    #[test]
    fn test_determinism() {
        let edits = [(Role::A, "-30"), (Role::R, "2"), (Role::V, "-0.3")];

        let mut first = fixed(&edits);
        let mut second = fixed(&edits);
        solve(&mut first, &Params::default());
        solve(&mut second, &Params::default());
        assert_eq!(first.snapshot(), second.snapshot());

        // Solving again changes nothing
        let before = first.snapshot();
        solve(&mut first, &Params::default());
        assert_eq!(before, first.snapshot());
    }
}
