//! # Edit script interpreter module
//!
//! This module provides an interpreter for edit scripts, allowing operator
//! commands to be replayed from a file. A script is a list of entries of the
//! form
//!
//! ```text
//! 0.0: v 0.1;
//! 0.5: w = 0;
//! 1.0: s 2;
//! 1.5: confirm;
//! ```
//!
//! where the number is the session time (in seconds) at which the command
//! shall be executed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use action_if::{EditParseError, ToolCmd};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Pattern matching a single script entry.
const ENTRY_PATTERN: &str = r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// The time the command is supposed to execute at
    pub exec_time_s: f64,

    /// The command to run
    pub cmd: ToolCmd
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.pending_at`
/// with the time since the script started to acquire the commands that need
/// executing.
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    cmds: VecDeque<Command>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("The script entry pattern is invalid: {0}")]
    InvalidPattern(regex::Error),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCmd(f64, EditParseError)
}

#[derive(Debug, PartialEq)]
pub enum PendingCmds {
    None,
    Some(Vec<ToolCmd>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.display().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e))
        };

        let cmds = Self::parse(&script)?;

        Ok(ScriptInterpreter {
            _script_path: path,
            cmds
        })
    }

    /// Create a new interpreter from the text of a script.
    pub fn from_str(script: &str) -> Result<Self, ScriptError> {
        Ok(ScriptInterpreter {
            _script_path: PathBuf::new(),
            cmds: Self::parse(script)?
        })
    }

    /// Return the commands due at the given script time.
    pub fn pending_at(&mut self, current_time_s: f64) -> PendingCmds {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingCmds::EndOfScript
        }

        let mut cmd_vec: Vec<ToolCmd> = vec![];

        // Peek items from the queue, if the head's exec time is lower than
        // the current time add it to the vector, and keep adding commands
        // until the exec times are larger than the current time.
        while let Some(front) = self.cmds.front() {
            if front.exec_time_s > current_time_s {
                break;
            }
            if let Some(c) = self.cmds.pop_front() {
                cmd_vec.push(c.cmd);
            }
        }

        // If the vector is longer than 0 return Some, otherwise None
        if !cmd_vec.is_empty() {
            PendingCmds::Some(cmd_vec)
        }
        else {
            PendingCmds::None
        }
    }

    /// Consume the interpreter, returning every command in execution order.
    pub fn into_cmds(self) -> Vec<ToolCmd> {
        self.cmds.into_iter().map(|c| c.cmd).collect()
    }

    /// Get the number of commands in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    /// Parse the text of a script into a time ordered queue of commands.
    fn parse(script: &str) -> Result<VecDeque<Command>, ScriptError> {
        // Empty queue of commands
        let mut cmd_queue: Vec<Command> = vec![];

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::new(ENTRY_PATTERN)
            .multi_line(true)
            .build()
            .map_err(ScriptError::InvalidPattern)?;

        for cap in re.captures_iter(script) {
            // Parse the exec time
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let exec_time_s: f64 = match time_str.parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e)))
            };

            // Parse the command from the payload
            let cmd_str = cap.get(3).map(|m| m.as_str()).unwrap_or("");
            let cmd = match cmd_str.parse::<ToolCmd>() {
                Ok(c) => c,
                Err(e) => return Err(ScriptError::InvalidCmd(
                    exec_time_s, e
                ))
            };

            // Build command from the match
            cmd_queue.push(Command {
                exec_time_s,
                cmd
            });
        }

        if cmd_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        // Commands execute in time order, a stable sort keeps the written
        // order of commands with the same timestamp.
        cmd_queue.sort_by(|a, b| a.exec_time_s
            .partial_cmp(&b.exec_time_s)
            .unwrap_or(std::cmp::Ordering::Equal));

        Ok(cmd_queue.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use action_if::{EditCmd, Role};

    const SCRIPT: &str = "\
        0.0: v 0.1;\n\
        0.5: w = 0;\n\
        # Straight line of two meters\n\
        0.5: s 2;\n\
        2.0: confirm;\n";

    #[test]
    fn test_parse_script() {
        let script = ScriptInterpreter::from_str(SCRIPT).unwrap();

        assert_eq!(script.get_num_cmds(), 4);
        assert_eq!(script.get_duration(), 2.0);
        assert_eq!(
            script.into_cmds(),
            vec![
                ToolCmd::Edit(EditCmd::Set { role: Role::V, text: "0.1".into() }),
                ToolCmd::Edit(EditCmd::Set { role: Role::W, text: "0".into() }),
                ToolCmd::Edit(EditCmd::Set { role: Role::S, text: "2".into() }),
                ToolCmd::Edit(EditCmd::Confirm),
            ]
        );
    }

    #[test]
    fn test_pending_cmds() {
        let mut script = ScriptInterpreter::from_str(SCRIPT).unwrap();

        assert_eq!(
            script.pending_at(0.1), 
            PendingCmds::Some(vec![
                ToolCmd::Edit(EditCmd::Set { role: Role::V, text: "0.1".into() })
            ])
        );
        assert_eq!(script.pending_at(0.2), PendingCmds::None);
        
        match script.pending_at(1.0) {
            PendingCmds::Some(cmds) => assert_eq!(cmds.len(), 2),
            p => panic!("Expected two pending commands, got {:?}", p)
        }

        assert_eq!(
            script.pending_at(5.0), 
            PendingCmds::Some(vec![ToolCmd::Edit(EditCmd::Confirm)])
        );
        assert_eq!(script.pending_at(5.0), PendingCmds::EndOfScript);
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::from_str("no entries here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_str("1.0: jump 3;"),
            Err(ScriptError::InvalidCmd(t, _)) if t == 1.0
        ));
        assert!(matches!(
            ScriptInterpreter::new("/definitely/not/a/script.txt"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
