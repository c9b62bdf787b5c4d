//! # Data Store
//!
//! The data store holds the modules of the executable and the data passed between them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::mpsc::{channel, Receiver};

use action_if::{ChassisError, ResolvedAction};
use log::debug;

use crate::{
    action_ctrl::ActionCtrl,
    action_queue::ActionQueue,
    sim_chassis::SimChassis
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct DataStore {
    /// The action editor
    pub action_ctrl: ActionCtrl,

    /// The chassis executing confirmed actions
    pub chassis: SimChassis,

    /// Actions waiting to be executed
    pub queue: ActionQueue,

    /// Every action confirmed during this session, in order
    pub history: Vec<ResolvedAction>,

    /// Set when the operator asks to quit
    pub quit: bool,

    /// Actions confirmed by the editor which haven't yet been queued
    completed: Receiver<ResolvedAction>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DataStore {
    /// Build the data store, connecting the editor's confirmed actions to the queue.
    ///
    /// The editor uses the chassis' spatium conversion.
    pub fn new(chassis: SimChassis) -> Self {
        let mut action_ctrl = ActionCtrl::new(Box::new(chassis.spatium()));

        let (tx, rx) = channel();
        action_ctrl.on_completed(move |action| {
            tx.send(*action).ok();
        });

        Self {
            action_ctrl,
            chassis,
            queue: ActionQueue::new(),
            history: Vec::new(),
            quit: false,
            completed: rx,
        }
    }

    /// Move newly confirmed actions onto the queue.
    ///
    /// Returns the number of actions queued.
    pub fn collect_confirmed(&mut self) -> usize {
        let mut num_queued = 0;

        while let Ok(action) = self.completed.try_recv() {
            self.history.push(action);
            self.queue.push(action);
            num_queued += 1;
        }

        num_queued
    }

    /// Advance the chassis, queue any confirmed actions and dispatch the next action if the
    /// chassis is idle.
    pub fn cycle(&mut self) -> Result<Option<ResolvedAction>, ChassisError> {
        self.chassis.update();

        let num_queued = self.collect_confirmed();
        if num_queued > 0 {
            debug!("{} action(s) queued, {} waiting", num_queued, self.queue.len());
        }

        self.queue.run(&mut self.chassis)
    }
}
