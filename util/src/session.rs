//! Session management
//!
//! A session is one execution of the tool. It owns a timestamped directory
//! under the software root holding the log file, the CSV archives and any
//! JSON data saved during the execution, and defines the epoch used to
//! timestamp log records and archives.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use erased_serde::Serialize;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// A chrono format string used to name session directories. See
/// https://docs.rs/chrono/0.4.11/chrono/format/strftime/index.html for more
/// information.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the archive directory within the session directory.
const ARCH_DIR_NAME: &str = "arch";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Data waiting to be written by the save thread.
type SaveJob = (PathBuf, Box<dyn Serialize + Send>);

/// The current session.
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The root directory for this session's archives
    pub arch_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,

    save_sender: Sender<SaveJob>,

    save_thread: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (CHASSIS_TOOL_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error(
        "Cannot initialise the session epoch, has a session already been \
        started? (conquer_once error: {0})"
    )]
    CannotInitEpoch(conquer_once::TryInitError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session within the given directory of the software root.
    ///
    /// The session directory is named `{exec_name}_{timestamp}`. Only one
    /// session can be started per execution.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_sw_root()
            .map_err(|_| SessionError::SwRootNotSet)?;

        let epoch = Utc::now();
        SESSION_EPOCH.try_init_once(|| epoch)
            .map_err(SessionError::CannotInitEpoch)?;

        let session_root = root
            .join(sessions_dir)
            .join(format!("{}_{}", exec_name, epoch.format(TIMESTAMP_FORMAT)));
        let arch_root = session_root.join(ARCH_DIR_NAME);

        // Creating the archive dir creates the session dir too
        fs::create_dir_all(&arch_root).map_err(SessionError::CannotCreateDir)?;

        let (save_sender, receiver) = channel();
        let thread_root = session_root.clone();
        let save_thread = thread::spawn(move || run_save_thread(thread_root, receiver));

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
            arch_root,
            save_sender,
            save_thread,
        })
    }

    /// End the session, waiting for the save thread to write any data still
    /// pending.
    pub fn exit(self) {
        info!("Waiting for pending data to be saved");

        // Dropping the sender ends the save thread once its queue is empty
        drop(self.save_sender);

        if self.save_thread.join().is_err() {
            warn!("The save thread panicked, some data may not have been saved");
        }

        info!("Session ended after {:.3} s", get_elapsed_seconds());
    }

    /// Save the data as JSON to the given session-relative path.
    ///
    /// The data is written in a background thread. The path shall have the
    /// `.json` extension.
    pub fn save<P: AsRef<Path>, T: Serialize + Send + 'static>(&self, path: P, data: T) {
        let path = path.as_ref().to_path_buf();

        if let Err(e) = self.save_sender.send((path.clone(), Box::new(data))) {
            warn!("Could not queue {:?} to be saved: {}", path, e)
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// # Panics
/// - This function will panic if no session has been started.
pub fn get_elapsed_seconds() -> f64 {
    match try_get_elapsed_seconds() {
        Some(t) => t,
        None => panic!("Cannot get the session epoch!"),
    }
}

/// Get the number of seconds elapsed since the start of the session, or
/// `None` if no session has been started yet.
pub fn try_get_elapsed_seconds() -> Option<f64> {
    SESSION_EPOCH
        .get()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
}

/// Return a reference to the session's epoch.
///
/// # Panics
/// - This function will panic if no session has been started.
pub fn get_epoch() -> &'static DateTime<Utc> {
    match SESSION_EPOCH.get() {
        Some(e) => e,
        None => panic!("Cannot get the session epoch!"),
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn run_save_thread(session_root: PathBuf, receiver: Receiver<SaveJob>) {
    for (path, data) in receiver.iter() {
        let full_path = session_root.join(&path);

        match write_json(&full_path, &data) {
            Ok(()) => debug!("Saved {:?}", full_path),
            Err(e) => warn!("Could not save {:?}: {}", full_path, e)
        }
    }
}

/// Write the data as pretty JSON, creating parent directories as needed.
fn write_json(full_path: &Path, data: &Box<dyn Serialize + Send>) -> Result<(), String> {
    match full_path.extension().and_then(|s| s.to_str()) {
        Some("json") => (),
        ext => return Err(format!("unsupported extension {:?}", ext))
    }

    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let file = File::create(full_path).map_err(|e| e.to_string())?;

    serde_json::to_writer_pretty(&file, data).map_err(|e| e.to_string())
}
