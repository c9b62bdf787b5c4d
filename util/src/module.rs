//! Module interfaces
//!
//! Each processing module of `tool_exec` (for example the action editor)
//! shall implement the [`State`] trait so that the executable can drive it the
//! same way whether commands come from the operator or from a script.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// Data required during initialisation
    type InitData;
    /// An error which can occur during initialisation.
    type InitError;

    /// A command processed by the module.
    type InputData;
    /// Data produced by processing a command.
    type OutputData;
    /// A report on the status of the module after processing.
    type StatusReport;
    /// An error which can occur during processing.
    type ProcError;

    /// Initialise the module.
    ///
    /// # Inputs
    /// - `init_data`: The data required to initialise the module.
    /// - `session`: The current session, used to locate archives.
    ///
    /// # Outputs
    /// - On success `Ok(())`.
    /// - On error an `InitError` instance.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Main module processing function.
    ///
    /// Each call processes one command to completion, there is no suspension
    /// inside a module.
    ///
    /// # Inputs
    /// - `input_data`: The command to process.
    ///
    /// # Outputs
    /// - On success a tuple of the output data and status report.
    /// - On error a `ProcError` instance.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
