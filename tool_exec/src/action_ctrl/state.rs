//! Implementations for the ActionCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use action_if::{EditCmd, ResolvedAction, Role, Spatium};
use log::{debug, info, warn};
use serde::Serialize;

// Internal
use super::{
    build, readiness, solve, validate_fixed,
    ActionCtrlError, ActionCtrlInitError, 
    NodeSet, NodeState, Params, ReadinessError, SolveReport, Verdict};
use util::{
    params, 
    module::State,
    archive::{self, Archived, ArchiveError, Archiver},
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A listener notified of every action the operator confirms.
pub type CompletedListener = Box<dyn FnMut(&ResolvedAction) + Send>;

/// Action control module state.
///
/// Holds one edit session: the six nodes the operator is editing, and the
/// spatium conversion of the chassis driver which will execute the confirmed
/// action.
pub struct ActionCtrl {
    pub(crate) params: Params,

    nodes: NodeSet,

    spatium: Box<dyn Spatium + Send>,

    listeners: Vec<CompletedListener>,

    last_solve: SolveReport,

    last_action: Option<ResolvedAction>,

    num_emitted: u64,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    /// Actions emitted since the archives were last written.
    pending_records: Vec<ActionRecord>,
    arch_actions: Archiver,
}

/// Status report for ActionCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    pub time_s: f64,

    pub num_fixed: usize,
    pub ready: bool,

    /// The edited node was put into error.
    pub edit_rejected: bool,

    /// Number of other fixed nodes put into error by the edit.
    pub num_knocked_on: usize,

    pub solve_passes: usize,
    pub num_derived: usize,
    pub num_invalidated: usize,
    pub num_voided: usize,
    pub num_conflicted: usize,

    /// A derived value lies outside the bounds of an operator value.
    pub derived_out_of_range: bool,

    pub action_emitted: bool,
    pub confirm_rejected: bool,
}

/// Archive record of an emitted action.
#[derive(Clone, Copy, Serialize, Debug)]
struct ActionRecord {
    time_s: f64,
    seq: u64,
    v_ms: f64,
    w_rads: f64,
    time_based: bool,
    range: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActionCtrl {
    /// Create a new edit session with default parameters.
    ///
    /// The spatium conversion is supplied by the chassis driver and used when
    /// building distance bounded actions.
    pub fn new(spatium: Box<dyn Spatium + Send>) -> Self {
        Self::with_params(Params::default(), spatium)
    }

    /// Create a new edit session with the given parameters.
    pub fn with_params(params: Params, spatium: Box<dyn Spatium + Send>) -> Self {
        Self {
            params,
            nodes: NodeSet::new(),
            spatium,
            listeners: Vec::new(),
            last_solve: SolveReport::default(),
            last_action: None,
            num_emitted: 0,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            pending_records: Vec::new(),
            arch_actions: Archiver::default(),
        }
    }

    /// Register a listener to be notified of every confirmed action.
    pub fn on_completed<F>(&mut self, listener: F)
    where
        F: FnMut(&ResolvedAction) + Send + 'static
    {
        self.listeners.push(Box::new(listener));
    }

    /// Set the raw text of a node and re-resolve the set.
    ///
    /// Returns the state of the edited node once the set has been resolved.
    pub fn edit(&mut self, role: Role, text: &str) -> &NodeState {
        let prior = self.nodes[role].snapshot();
        let bounds = self.params.bounds(role);

        self.nodes[role].set_raw(text, &bounds);

        if self.nodes[role].is_fixed() {
            let validation = validate_fixed(&self.nodes, role, &prior);

            match validation.verdict {
                Verdict::Accept => (),
                Verdict::Coincide(value) => {
                    debug!(
                        "{} = {} is already determined, keeping it derived", 
                        role, value
                    );
                    self.nodes[role].set_derived(value)
                },
                Verdict::Reject(e) => self.nodes[role].fail(e)
            }

            for (target, e) in validation.knock_on.iter() {
                warn!("{} = 0 puts {} into error: {}", role, target, e);
                self.nodes[*target].fail(*e);
            }

            self.report.num_knocked_on = validation.knock_on.len();
        }

        if let Some(e) = self.nodes[role].error() {
            warn!("{} = \"{}\" rejected: {}", role, self.nodes[role].raw(), e);
            self.report.edit_rejected = true;
        }
        else {
            debug!("{} = \"{}\": {}", role, text.trim(), self.nodes[role].state());
        }

        self.resolve();

        self.nodes[role].state()
    }

    /// Clear a node back to void and re-resolve the set.
    pub fn clear(&mut self, role: Role) {
        debug!("Clearing {}", role);

        self.nodes[role].reset();
        self.resolve();
    }

    /// Clear every node, starting a fresh edit session.
    pub fn reset(&mut self) {
        self.nodes.reset();
        self.last_solve = SolveReport::default();
    }

    /// Confirm the action pinned down by the set.
    ///
    /// On success the action is passed to every listener and the set is
    /// reset. If the set is not ready nothing changes.
    pub fn confirm(&mut self) -> Result<ResolvedAction, ActionCtrlError> {
        let action = build(&self.nodes, &*self.spatium)
            .map_err(ActionCtrlError::NotReady)?;

        info!("Action confirmed: {}", action);

        for listener in self.listeners.iter_mut() {
            listener(&action);
        }

        self.num_emitted += 1;
        self.pending_records.push(ActionRecord {
            time_s: archive::record_time_s(),
            seq: self.num_emitted,
            v_ms: action.v_ms,
            w_rads: action.w_rads,
            time_based: action.time_based(),
            range: action.range,
        });
        self.last_action = Some(action);

        self.reset();

        Ok(action)
    }

    pub fn readiness(&self) -> Result<(), ReadinessError> {
        readiness(&self.nodes)
    }

    /// Returns true if the set can be confirmed.
    pub fn is_ready(&self) -> bool {
        self.readiness().is_ok()
    }

    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The report of the most recent solve.
    pub fn last_solve(&self) -> &SolveReport {
        &self.last_solve
    }

    /// The most recently confirmed action.
    pub fn last_action(&self) -> Option<&ResolvedAction> {
        self.last_action.as_ref()
    }

    /// Number of actions confirmed since the module was created.
    pub fn num_emitted(&self) -> u64 {
        self.num_emitted
    }

    fn resolve(&mut self) {
        self.last_solve = solve(&mut self.nodes, &self.params);
    }

    fn update_report(&mut self) {
        self.report.num_fixed = self.nodes.count_fixed();
        self.report.ready = self.is_ready();
        self.report.solve_passes = self.last_solve.passes;
        self.report.num_derived = self.last_solve.derived.len();
        self.report.num_invalidated = self.last_solve.invalidated.len();
        self.report.num_voided = self.last_solve.voided.len();
        self.report.num_conflicted = self.last_solve.conflicted.len();
        self.report.derived_out_of_range = 
            !self.last_solve.out_of_range.is_empty();
    }
}

impl State for ActionCtrl {
    type InitData = &'static str;
    type InitError = ActionCtrlInitError;

    type InputData = EditCmd;
    type OutputData = Option<ResolvedAction>;
    type StatusReport = StatusReport;
    type ProcError = ActionCtrlError;

    /// Initialise the ActionCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        self.params = params::load(init_data)
            .map_err(ActionCtrlInitError::ParamLoadError)?;

        self.arch_report = Archiver::from_path(
            session, "action_ctrl/status_report.csv"
        ).map_err(ActionCtrlInitError::ArchiveError)?;
        self.arch_actions = Archiver::from_path(
            session, "action_ctrl/actions.csv"
        ).map_err(ActionCtrlInitError::ArchiveError)?;

        Ok(())
    }

    /// Process a single edit command.
    ///
    /// Confirming a set which isn't ready returns an error and leaves the set
    /// unchanged.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();
        self.report.time_s = archive::record_time_s();

        let mut output = None;

        match input_data {
            EditCmd::Set { role, text } => {
                self.edit(*role, text);
            },
            EditCmd::Clear(role) => self.clear(*role),
            EditCmd::Reset => self.reset(),
            EditCmd::Confirm => match self.confirm() {
                Ok(action) => {
                    self.report.action_emitted = true;
                    output = Some(action);
                },
                Err(e) => {
                    self.report.confirm_rejected = true;
                    self.update_report();
                    return Err(e);
                }
            }
        }

        self.update_report();

        Ok((output, self.report))
    }
}

impl Archived for ActionCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)?;

        for record in self.pending_records.drain(..) {
            self.arch_actions.serialise(record)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::action_ctrl::{ErrorKind, NodeError};
    use std::sync::{Arc, Mutex};

    fn new_ctrl() -> ActionCtrl {
        ActionCtrl::new(Box::new(|s: f64, a: f64| s * 100.0 + a))
    }

    #[test]
    fn test_fixpoint_determinism() {
        let edits = [
            (Role::V, "0.4"), (Role::A, "45"), (Role::R, "2"), 
            (Role::R, ""), (Role::W, "20"), (Role::T, "3"), (Role::A, ""),
            (Role::T, "3")
        ];

        let mut first = new_ctrl();
        let mut second = new_ctrl();

        for (role, text) in edits.iter() {
            first.edit(*role, text);
            second.edit(*role, text);
        }

        assert_eq!(first.nodes().snapshot(), second.nodes().snapshot());
        assert!(first.is_ready());
    }

    #[test]
    fn test_zero_propagation() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::V, "0");
        assert_eq!(ctrl.nodes()[Role::S].state(), &NodeState::Derived);
        assert_eq!(ctrl.nodes()[Role::S].value(), 0.0);
        assert_eq!(ctrl.nodes()[Role::S].display_text(), "0");

        assert_eq!(
            ctrl.edit(Role::S, "1"), 
            &NodeState::Error(NodeError::conflict(ErrorKind::SignConflict, Role::V))
        );

        // Entering the zero which is already determined keeps it derived
        ctrl.edit(Role::S, "0");
        assert_eq!(ctrl.nodes()[Role::S].state(), &NodeState::Derived);
        assert_eq!(ctrl.nodes().count_fixed(), 1);
    }

    #[test]
    fn test_sign_consistency() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::V, "0.2");
        assert_eq!(
            ctrl.edit(Role::S, "-1"),
            &NodeState::Error(NodeError::conflict(ErrorKind::SignConflict, Role::V))
        );

        assert_eq!(ctrl.edit(Role::S, "1"), &NodeState::Fixed);
        assert_eq!(ctrl.nodes()[Role::V].state(), &NodeState::Fixed);
        assert_eq!(ctrl.nodes()[Role::V].value(), 0.2);
    }

    #[test]
    fn test_mutual_exclusivity() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::S, "1");
        assert_eq!(ctrl.nodes()[Role::T].state(), &NodeState::Invalid);
        assert_eq!(
            ctrl.edit(Role::T, "5"),
            &NodeState::Error(
                NodeError::conflict(ErrorKind::ExclusivityConflict, Role::S)
            )
        );
        assert_eq!(ctrl.nodes()[Role::S].state(), &NodeState::Fixed);

        ctrl.clear(Role::S);
        assert_eq!(ctrl.edit(Role::T, "5"), &NodeState::Fixed);
        assert_eq!(ctrl.nodes()[Role::S].state(), &NodeState::Invalid);
        assert_eq!(ctrl.nodes()[Role::A].state(), &NodeState::Invalid);
    }

    #[test]
    fn test_extent_edited_against_fixed_duration() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::T, "5");
        assert_eq!(
            ctrl.edit(Role::S, "1"),
            &NodeState::Error(
                NodeError::conflict(ErrorKind::ExclusivityConflict, Role::T)
            )
        );
        assert_eq!(
            ctrl.edit(Role::A, "30"),
            &NodeState::Error(
                NodeError::conflict(ErrorKind::ExclusivityConflict, Role::T)
            )
        );
        assert_eq!(ctrl.nodes()[Role::T].state(), &NodeState::Fixed);
    }

    #[test]
    fn test_forced_zero_extent_against_fixed_duration() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::V, "0");
        ctrl.edit(Role::T, "5");
        assert_eq!(ctrl.nodes()[Role::S].state(), &NodeState::Invalid);

        // The zero is what V forces, but S is excluded by T all the same
        assert_eq!(
            ctrl.edit(Role::S, "0"),
            &NodeState::Error(
                NodeError::conflict(ErrorKind::ExclusivityConflict, Role::T)
            )
        );

        ctrl.edit(Role::W, "0");
        assert_eq!(
            ctrl.edit(Role::A, "0"),
            &NodeState::Error(
                NodeError::conflict(ErrorKind::ExclusivityConflict, Role::T)
            )
        );
        assert!(!ctrl.is_ready());

        // Once T goes both zeros are derived from the speeds
        ctrl.clear(Role::T);
        assert_eq!(ctrl.nodes()[Role::S].state(), &NodeState::Derived);
        assert_eq!(ctrl.nodes()[Role::S].value(), 0.0);
        assert_eq!(ctrl.nodes()[Role::A].state(), &NodeState::Derived);
        assert_eq!(ctrl.nodes()[Role::A].value(), 0.0);
        assert_eq!(ctrl.nodes().count_fixed(), 2);
    }

    #[test]
    fn test_zero_extents_force_speeds() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::A, "0");
        assert_eq!(ctrl.nodes()[Role::W].state(), &NodeState::Derived);
        assert_eq!(ctrl.nodes()[Role::W].value(), 0.0);
        assert_eq!(ctrl.nodes()[Role::R].value(), std::f64::INFINITY);

        let mut ctrl = new_ctrl();

        ctrl.edit(Role::S, "0");
        assert_eq!(ctrl.nodes()[Role::V].state(), &NodeState::Derived);
        assert_eq!(ctrl.nodes()[Role::V].value(), 0.0);
        assert_eq!(
            ctrl.edit(Role::V, "0.3"),
            &NodeState::Error(NodeError::conflict(ErrorKind::SignConflict, Role::S))
        );
    }

    #[test]
    fn test_zero_angle_knocks_on_fixed_speed() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::W, "10");
        assert_eq!(ctrl.edit(Role::A, "0"), &NodeState::Fixed);
        assert_eq!(
            ctrl.nodes()[Role::W].state(),
            &NodeState::Error(NodeError::conflict(ErrorKind::SignConflict, Role::A))
        );
        assert_eq!(ctrl.nodes().count_fixed(), 1);

        // Nothing derives W once A goes, so it keeps its error until edited
        ctrl.clear(Role::A);
        assert!(ctrl.nodes()[Role::W].error().is_some());
        assert_eq!(ctrl.edit(Role::W, "10"), &NodeState::Fixed);
    }

    #[test]
    fn test_readiness_and_emission() {
        let emitted = Arc::new(Mutex::new(Vec::new()));
        let sink = emitted.clone();

        let mut ctrl = new_ctrl();
        ctrl.on_completed(move |a| sink.lock().unwrap().push(a.as_tuple()));

        ctrl.edit(Role::V, "0.1");
        ctrl.edit(Role::W, "0");
        assert_eq!(ctrl.nodes()[Role::A].state(), &NodeState::Derived);
        assert_eq!(ctrl.nodes()[Role::R].value(), std::f64::INFINITY);
        assert_eq!(ctrl.nodes()[Role::R].display_text(), "∞");
        assert!(!ctrl.is_ready());

        ctrl.edit(Role::S, "2");
        assert!(ctrl.is_ready());

        let action = ctrl.confirm().unwrap();
        assert_eq!(action.as_tuple(), (0.1, 0.0, false, 200.0));
        assert_eq!(*emitted.lock().unwrap(), vec![(0.1, 0.0, false, 200.0)]);
        assert_eq!(ctrl.num_emitted(), 1);
        assert_eq!(ctrl.last_action(), Some(&action));
    }

    #[test]
    fn test_reset_idempotence() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::V, "0.3");
        ctrl.edit(Role::W, "10");
        ctrl.edit(Role::T, "2");
        ctrl.confirm().unwrap();

        assert!(ctrl.nodes().iter().all(|n| n.state() == &NodeState::Void));

        match ctrl.confirm() {
            Err(ActionCtrlError::NotReady(ReadinessError::FixedCount(0))) => (),
            r => panic!("Expected the confirm to be rejected, got {:?}", r)
        }
        assert_eq!(ctrl.num_emitted(), 1);
    }

    #[test]
    fn test_rejected_confirm_changes_nothing() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::V, "0.3");
        ctrl.edit(Role::W, "10");
        let before = ctrl.nodes().snapshot();

        assert!(ctrl.confirm().is_err());
        assert_eq!(ctrl.nodes().snapshot(), before);
        assert!(ctrl.last_action().is_none());
    }

    #[test]
    fn test_knock_on_and_overdetermined() {
        let mut ctrl = new_ctrl();

        ctrl.edit(Role::V, "0.5");
        ctrl.edit(Role::W, "30");
        assert_eq!(ctrl.nodes()[Role::R].state(), &NodeState::Derived);
        assert_eq!(
            ctrl.edit(Role::R, "2"),
            &NodeState::Error(NodeError::new(ErrorKind::Overdetermined))
        );

        let mut ctrl = new_ctrl();
        ctrl.edit(Role::S, "1");
        ctrl.edit(Role::R, "0");
        assert_eq!(
            ctrl.nodes()[Role::S].error(),
            Some(NodeError::conflict(ErrorKind::SignConflict, Role::R))
        );
        assert_eq!(ctrl.readiness(), Err(ReadinessError::NodeInError(Role::S)));
    }

    #[test]
    fn test_proc() {
        let mut ctrl = new_ctrl();

        let cmds = [
            EditCmd::Set { role: Role::V, text: "-0.2".into() },
            EditCmd::Set { role: Role::R, text: "-1".into() },
            EditCmd::Set { role: Role::T, text: "4".into() },
        ];

        for cmd in cmds.iter() {
            let (output, _) = ctrl.proc(cmd).unwrap();
            assert!(output.is_none());
        }

        let (output, report) = ctrl.proc(&EditCmd::Confirm).unwrap();
        let action = output.unwrap();
        assert!(report.action_emitted);
        assert!(action.time_based());
        assert!((action.w_rads - 0.2).abs() < 1e-12);

        assert!(ctrl.proc(&EditCmd::Confirm).is_err());
        assert!(ctrl.report.confirm_rejected);

        let (_, report) = ctrl.proc(
            &EditCmd::Set { role: Role::V, text: "9".into() }
        ).unwrap();
        assert!(report.edit_rejected);
        assert_eq!(
            ctrl.nodes()[Role::V].error(), 
            Some(NodeError::new(ErrorKind::Range))
        );

        ctrl.proc(&EditCmd::Reset).unwrap();
        assert_eq!(ctrl.nodes().count_fixed(), 0);
        assert!(ctrl.nodes().first_error().is_none());
    }
}
