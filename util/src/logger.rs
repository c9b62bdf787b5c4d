//! Generic logger utility functions
//!
//! Records are written to the session log file and, optionally, echoed to
//! stdout with coloured level tags. Every record is stamped with the time
//! elapsed since the start of the session.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, info};
use fern::{Dispatch, FormatCallback};
use colored::{ColoredString, Colorize};
use std::fmt::Arguments;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

/// Where log records are written in addition to the session log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    /// Records are also printed to stdout.
    Stdout,

    /// Records are only written to the log file, used by the interactive tool
    /// so that log lines don't interleave with the prompt.
    FileOnly
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
/// 
/// # Notes
/// 
/// - `min_level` must be `INFO` or more verbose.
/// 
/// # Safety
/// 
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter, 
    echo: Echo,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = Dispatch::new()
        .level(min_level)
        .level_for("rustyline", LevelFilter::Warn)
        .chain(Dispatch::new()
            .format(|out, message, record| {
                format_record(out, message, record, level_tag(record.level()))
            })
            .chain(log_file)
        );

    if echo == Echo::Stdout {
        dispatch = dispatch.chain(Dispatch::new()
            .format(|out, message, record| {
                format_record(out, message, record, level_colour(record.level()))
            })
            .chain(std::io::stdout())
        );
    }

    dispatch.apply().map_err(LoggerInitError::FernInitError)?;
    
    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Format a record as `[time level] message`, including the target for debug
/// and trace records.
fn format_record<L: std::fmt::Display>(
    out: FormatCallback,
    message: &Arguments,
    record: &log::Record,
    level: L
) {
    let time_s = session::get_elapsed_seconds();

    if record.level() > log::Level::Info {
        out.finish(format_args!(
            "[{:10.6} {}] {}: {}", time_s, level, record.target(), message
        ))
    }
    else {
        out.finish(format_args!("[{:10.6} {}] {}", time_s, level, message))
    }
}

/// Get the plain tag of a log level
fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info  => "INF",
        log::Level::Warn  => "WRN",
        log::Level::Error => "ERR"
    }
}

/// Get the coloured tag of a log level
fn level_colour(level: log::Level) -> ColoredString {
    let tag = level_tag(level);

    match level {
        log::Level::Trace => tag.dimmed().italic(),
        log::Level::Debug => tag.dimmed(),
        log::Level::Info  => tag.normal(),
        log::Level::Warn  => tag.yellow(),
        log::Level::Error => tag.red().bold()
    }
}
