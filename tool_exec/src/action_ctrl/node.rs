//! Kinematic parameter nodes
//!
//! Each kinematic quantity of an action is held in a [`ParamNode`], which owns
//! the raw text entered by the operator, the current value and the node's
//! classification. The six nodes of an edit session are held in a
//! [`NodeSet`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use action_if::Role;
use serde::Serialize;
use std::fmt::{self, Display};
use std::ops::{Index, IndexMut};
use thiserror::Error;

// Internal
use super::NUM_NODES;
use util::maths::format_trimmed;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of decimal places shown when displaying a value.
const DISPLAY_DECIMALS: usize = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single kinematic quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamNode {
    role: Role,

    /// Text as last entered by the operator. Empty for derived, invalid and
    /// void nodes.
    raw: String,

    /// The value of the node, NaN if the node has no value.
    value: f64,

    state: NodeState,
}

/// The reason a node is in error, and which node it conflicts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeError {
    pub kind: ErrorKind,

    /// The node whose value this node conflicts with, if any.
    pub conflict: Option<Role>,

    pub origin: ErrorOrigin,
}

/// The interval a value must lie within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,

    /// If false the lower bound is exclusive.
    pub min_inclusive: bool,
}

/// The six nodes of an edit session.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSet {
    nodes: [ParamNode; NUM_NODES],
}

/// A comparable record of a node's state and value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub role: Role,
    pub state: NodeState,

    /// `None` if the node has no value.
    pub value: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NodeState {
    /// No value, awaiting input.
    Void,

    /// Value supplied directly by the operator.
    Fixed,

    /// Value computed from the fixed and derived nodes, not independently
    /// editable.
    Derived,

    /// Excluded by a mutually exclusive choice elsewhere in the set.
    Invalid,

    /// An operator supplied value which failed validation, or a derivation
    /// which conflicts with a paired quantity.
    Error(NodeError),
}

/// Kinds of node error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
pub enum ErrorKind {
    #[error("unparsable")]
    Parse,

    #[error("out of range")]
    Range,

    #[error("sign conflict with paired quantity")]
    SignConflict,

    #[error("time and distance bounds are mutually exclusive")]
    ExclusivityConflict,

    #[error("already determined by other quantities")]
    Overdetermined,
}

/// Where a node error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorOrigin {
    /// Raised when validating an operator edit. Persists until the node is
    /// edited, or its conflict is no longer fixed and the node can be
    /// derived.
    Edit,

    /// Raised by the solver while deriving the node. Re-evaluated on every
    /// solve.
    Closure,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ParamNode {
    /// Create a new void node.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            raw: String::new(),
            value: std::f64::NAN,
            state: NodeState::Void,
        }
    }

    /// Set the raw text of the node as entered by the operator.
    ///
    /// Empty text voids the node, text which can't be parsed or lies outside
    /// the bounds puts the node in error, any other text fixes the node.
    /// Relations with the other nodes are checked by the validator
    /// afterwards.
    pub fn set_raw(&mut self, text: &str, bounds: &Bounds) -> &NodeState {
        let text = text.trim();

        if text.is_empty() {
            self.reset();
            return &self.state;
        }

        self.raw = text.to_string();

        match parse_value(text) {
            None => self.fail(NodeError::new(ErrorKind::Parse)),
            Some(v) if !bounds.contains(v) => {
                self.fail(NodeError::new(ErrorKind::Range))
            },
            Some(v) => {
                self.value = v;
                self.state = NodeState::Fixed;
            }
        }

        &self.state
    }

    /// Set a value computed from the other nodes.
    pub fn set_derived(&mut self, value: f64) {
        self.raw.clear();
        self.value = value;
        self.state = NodeState::Derived;
    }

    /// Exclude the node due to a mutually exclusive choice.
    pub fn invalidate(&mut self) {
        self.raw.clear();
        self.value = std::f64::NAN;
        self.state = NodeState::Invalid;
    }

    /// Put the node into error. The raw text is kept so the operator can see
    /// what was rejected.
    pub fn fail(&mut self, error: NodeError) {
        self.value = std::f64::NAN;
        self.state = NodeState::Error(error);
    }

    /// Return the node to void.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.value = std::f64::NAN;
        self.state = NodeState::Void;
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The value of the node, NaN if it has none.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn is_fixed(&self) -> bool {
        self.state == NodeState::Fixed
    }

    pub fn is_derived(&self) -> bool {
        self.state == NodeState::Derived
    }

    /// Returns true if the node has a usable value (fixed or derived).
    pub fn is_resolved(&self) -> bool {
        self.is_fixed() || self.is_derived()
    }

    pub fn error(&self) -> Option<NodeError> {
        match self.state {
            NodeState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// The text to display for this node.
    ///
    /// Operator text is shown as entered, derived values are formatted with
    /// up to three decimals and infinite radii with the infinity marker.
    pub fn display_text(&self) -> String {
        match self.state {
            NodeState::Fixed | NodeState::Error(_) => self.raw.clone(),
            NodeState::Derived => format_trimmed(self.value, DISPLAY_DECIMALS),
            NodeState::Void | NodeState::Invalid => String::new(),
        }
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            role: self.role,
            state: self.state,
            value: if self.value.is_nan() { None } else { Some(self.value) },
        }
    }
}

impl NodeError {
    /// An error raised while validating an edit, with no conflicting node.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            conflict: None,
            origin: ErrorOrigin::Edit,
        }
    }

    /// An error raised while validating an edit, caused by the value of
    /// another node.
    pub fn conflict(kind: ErrorKind, with: Role) -> Self {
        Self {
            kind,
            conflict: Some(with),
            origin: ErrorOrigin::Edit,
        }
    }

    /// An error raised by the solver while deriving a node.
    pub fn closure(kind: ErrorKind, with: Role) -> Self {
        Self {
            kind,
            conflict: Some(with),
            origin: ErrorOrigin::Closure,
        }
    }
}

impl Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.conflict {
            Some(r) => write!(f, "{} ({})", self.kind, r),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Void => write!(f, "void"),
            NodeState::Fixed => write!(f, "fixed"),
            NodeState::Derived => write!(f, "derived"),
            NodeState::Invalid => write!(f, "invalid"),
            NodeState::Error(e) => write!(f, "error: {}", e),
        }
    }
}

impl Bounds {
    /// Any finite value.
    pub fn unbounded() -> Self {
        Self {
            min: std::f64::NEG_INFINITY,
            max: std::f64::INFINITY,
            min_inclusive: true,
        }
    }

    /// Values in `[-limit, limit]`.
    pub fn symmetric(limit: f64) -> Self {
        Self {
            min: -limit.abs(),
            max: limit.abs(),
            min_inclusive: true,
        }
    }

    /// Values in `(0, inf)`.
    pub fn positive() -> Self {
        Self {
            min: 0.0,
            max: std::f64::INFINITY,
            min_inclusive: false,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_min = if self.min_inclusive {
            value >= self.min
        } else {
            value > self.min
        };

        above_min && value <= self.max
    }
}

impl NodeSet {
    /// Create a new set with every node void.
    pub fn new() -> Self {
        Self {
            nodes: [
                ParamNode::new(Role::V),
                ParamNode::new(Role::W),
                ParamNode::new(Role::R),
                ParamNode::new(Role::S),
                ParamNode::new(Role::A),
                ParamNode::new(Role::T),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamNode> {
        self.nodes.iter()
    }

    /// Return every node to void.
    pub fn reset(&mut self) {
        for node in self.nodes.iter_mut() {
            node.reset();
        }
    }

    /// Number of nodes fixed by the operator.
    pub fn count_fixed(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_fixed()).count()
    }

    /// The first node in error, if any.
    pub fn first_error(&self) -> Option<(Role, NodeError)> {
        self.nodes
            .iter()
            .find_map(|n| n.error().map(|e| (n.role(), e)))
    }

    /// The value of the node if it is fixed or derived.
    pub fn resolved_value(&self, role: Role) -> Option<f64> {
        let node = &self[role];

        if node.is_resolved() {
            Some(node.value())
        } else {
            None
        }
    }

    /// Comparable state vector of the whole set.
    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.nodes.iter().map(|n| n.snapshot()).collect()
    }
}

impl Default for NodeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<Role> for NodeSet {
    type Output = ParamNode;

    fn index(&self, role: Role) -> &Self::Output {
        &self.nodes[role.index()]
    }
}

impl IndexMut<Role> for NodeSet {
    fn index_mut(&mut self, role: Role) -> &mut Self::Output {
        &mut self.nodes[role.index()]
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse operator text into a finite value.
///
/// The infinity marker is only ever displayed, so `inf`, `∞` and `nan` are
/// rejected along with anything else that isn't a finite decimal.
fn parse_value(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_raw_transitions() {
        let bounds = Bounds::symmetric(2.0);
        let mut node = ParamNode::new(Role::V);

        assert_eq!(node.set_raw("0.5", &bounds), &NodeState::Fixed);
        assert_eq!(node.value(), 0.5);
        assert_eq!(node.display_text(), "0.5");

        assert_eq!(
            node.set_raw("fast", &bounds), 
            &NodeState::Error(NodeError::new(ErrorKind::Parse))
        );
        assert!(node.value().is_nan());
        assert_eq!(node.display_text(), "fast");

        assert_eq!(
            node.set_raw("2.5", &bounds), 
            &NodeState::Error(NodeError::new(ErrorKind::Range))
        );

        assert_eq!(node.set_raw("  ", &bounds), &NodeState::Void);
        assert!(node.value().is_nan());
        assert_eq!(node.display_text(), "");
    }

    #[test]
    fn test_infinity_is_not_an_input() {
        let bounds = Bounds::unbounded();
        let mut node = ParamNode::new(Role::R);

        for text in ["inf", "∞", "-inf", "NaN", "infinity"].iter() {
            assert_eq!(
                node.set_raw(text, &bounds), 
                &NodeState::Error(NodeError::new(ErrorKind::Parse)),
                "{} should not parse",
                text
            );
        }

        node.set_derived(std::f64::INFINITY);
        assert_eq!(node.display_text(), "∞");
        assert_eq!(node.state(), &NodeState::Derived);
    }

    #[test]
    fn test_duration_bounds() {
        let bounds = Bounds::positive();
        let mut node = ParamNode::new(Role::T);

        assert!(matches!(node.set_raw("0", &bounds), NodeState::Error(_)));
        assert!(matches!(node.set_raw("-1", &bounds), NodeState::Error(_)));
        assert_eq!(node.set_raw("5", &bounds), &NodeState::Fixed);
    }

    #[test]
    fn test_node_set() {
        let mut set = NodeSet::new();
        set[Role::S].set_raw("1", &Bounds::unbounded());
        set[Role::R].set_derived(2.0);

        assert_eq!(set.count_fixed(), 1);
        assert_eq!(set.resolved_value(Role::R), Some(2.0));
        assert_eq!(set.resolved_value(Role::V), None);
        assert_eq!(set.first_error(), None);

        set[Role::T].set_raw("x", &Bounds::positive());
        assert_eq!(
            set.first_error(), 
            Some((Role::T, NodeError::new(ErrorKind::Parse)))
        );

        set.reset();
        assert!(set.iter().all(|n| n.state() == &NodeState::Void));
    }
}
