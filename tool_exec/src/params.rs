//! # Tool Executable Parameters
//!
//! This module provide parameters for the tool executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolExecParams {

    /// Prompt shown by the interactive editor
    pub prompt: String,

    /// Path of the command history file, relative to the software root
    pub history_path: String,

    /// Resume the action queue as soon as the first action is confirmed, rather than waiting for
    /// the operator to resume it
    pub auto_resume: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ToolExecParams {
    fn default() -> Self {
        Self {
            prompt: String::from("chassis $ "),
            history_path: String::from("data/history.txt"),
            auto_resume: false,
        }
    }
}
