//! # Action queue
//!
//! Confirmed actions are queued and dispatched to the chassis driver one at a
//! time, in the order they were confirmed. The queue starts paused so the
//! operator can review the queued actions before the chassis moves.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;

use action_if::{ChassisDriver, ChassisError, DriveMode, ResolvedAction};
use log::{info, warn};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Queue of actions waiting to be executed by the chassis.
#[derive(Debug, Clone)]
pub struct ActionQueue {
    queue: VecDeque<ResolvedAction>,

    /// The action the chassis is currently executing.
    current: Option<ResolvedAction>,

    paused: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActionQueue {
    /// Create a new, paused, empty queue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            current: None,
            paused: true,
        }
    }

    /// Add an action to the back of the queue.
    pub fn push(&mut self, action: ResolvedAction) {
        info!("Queued action: {}", action);
        self.queue.push_back(action);
    }

    /// Number of actions waiting, not including the current action.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current(&self) -> Option<&ResolvedAction> {
        self.current.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedAction> {
        self.queue.iter()
    }

    /// Dispatch the next action if the chassis is idle and the queue is not
    /// paused.
    ///
    /// Returns the action which was dispatched, if any. An action the driver
    /// refuses is dropped from the queue.
    pub fn run(&mut self, driver: &mut dyn ChassisDriver) 
        -> Result<Option<ResolvedAction>, ChassisError> 
    {
        if self.current.is_some() {
            if driver.progress().is_some() {
                return Ok(None);
            }
            self.current = None;
        }

        if self.paused {
            return Ok(None);
        }

        let action = match self.queue.pop_front() {
            Some(a) => a,
            None => return Ok(None)
        };

        let result = match action.mode {
            DriveMode::Time => {
                driver.drive_by_time(action.v_ms, action.w_rads, action.range)
            },
            DriveMode::Space => {
                driver.drive_by_space(action.v_ms, action.w_rads, action.range)
            }
        };

        match result {
            Ok(()) => {
                info!("Executing action: {}", action);
                self.current = Some(action);
                Ok(Some(action))
            },
            Err(e) => {
                warn!("Chassis refused action {}: {}", action, e);
                Err(e)
            }
        }
    }

    /// Pause the queue and the current action.
    pub fn pause(&mut self, driver: &mut dyn ChassisDriver) 
        -> Result<(), ChassisError> 
    {
        self.paused = true;

        if self.current.is_some() && driver.progress().is_some() {
            driver.pause()?;
        }

        Ok(())
    }

    /// Resume the current action and the queue, dispatching the next action
    /// if the chassis is idle.
    pub fn resume(&mut self, driver: &mut dyn ChassisDriver) 
        -> Result<Option<ResolvedAction>, ChassisError> 
    {
        self.paused = false;

        if driver.is_paused() {
            driver.resume()?;
        }

        self.run(driver)
    }

    /// Cancel the current action and drop every queued action.
    ///
    /// Returns the number of actions dropped, including the current one. The
    /// queue is left paused.
    pub fn cancel(&mut self, driver: &mut dyn ChassisDriver) 
        -> Result<usize, ChassisError> 
    {
        let mut num_dropped = self.queue.len();
        self.queue.clear();
        self.paused = true;

        if self.current.take().is_some() {
            driver.cancel()?;
            num_dropped += 1;
        }

        Ok(num_dropped)
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}
