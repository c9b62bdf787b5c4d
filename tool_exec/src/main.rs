//! Main operator tool executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise the chassis and the action editor
//!     - Replay an edit script, if one was given
//!     - Interactive loop:
//!         - Read an operator command
//!         - Advance the chassis to the current time
//!         - Process the command
//!         - Queue confirmed actions and dispatch the next one
//!
//! # Modules
//!
//! All modules (e.g. `action_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::WrapErr};
use log::{debug, info, warn};
use rustyline::{DefaultEditor, error::ReadlineError};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use structopt::StructOpt;

// Internal
use action_if::{ChassisDriver, ToolCmd};
use tool_lib::{
    data_store::DataStore,
    params::ToolExecParams,
    sim_chassis::{SimChassis, SimChassisParams}
};
use util::{
    host,
    module::State,
    logger::{logger_init, Echo, LevelFilter},
    session::{self, Session},
    script_interpreter::{ScriptInterpreter, PendingCmds}
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period at which a script is polled for due commands.
const SCRIPT_POLL_PERIOD: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic action editor for the chassis.
#[derive(Debug, StructOpt)]
#[structopt(name = "tool_exec")]
struct Opts {
    /// Edit script to replay before starting the prompt
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Minimum level of the records written to the session log
    #[structopt(long, default_value = "debug")]
    log_level: LevelFilter,

    /// Print log records to stdout as well as the session log
    #[structopt(long)]
    echo_log: bool,

    /// Exit once the script and its actions have completed, without starting the prompt
    #[structopt(long)]
    batch: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "tool_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    let echo = if opts.echo_log { Echo::Stdout } else { Echo::FileOnly };
    logger_init(opts.log_level, echo, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Chassis Tool Executable\n");
    info!(
        "Running on: {:#?}", 
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let exec_params: ToolExecParams = util::params::load_or_default(
        "tool_exec.toml"
    );

    let chassis_params: SimChassisParams = util::params::load(
        "sim_chassis.toml"
    ).wrap_err("Could not load chassis params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let mut chassis = SimChassis::new(chassis_params);
    let port = chassis.initialise()
        .wrap_err("Failed to initialise the chassis")?;
    chassis.unlock()
        .wrap_err("Failed to unlock the chassis")?;
    info!("Chassis connected on {}", port);

    let mut ds = DataStore::new(chassis);

    ds.action_ctrl.init("action_ctrl.toml", &session)
        .wrap_err("Failed to initialise ActionCtrl")?;
    info!("ActionCtrl init complete");

    if exec_params.auto_resume {
        ds.queue.resume(&mut ds.chassis)
            .wrap_err("Failed to resume the action queue")?;
    }

    info!("Module initialisation complete\n");

    // ---- COMMAND SOURCES ----

    if let Some(ref path) = opts.script {
        run_script(&mut ds, path)?;

        if opts.batch {
            drain_queue(&mut ds);
        }
    }

    if !opts.batch && !ds.quit {
        run_interactive(&mut ds, &exec_params)?;
    }

    // ---- SHUTDOWN ----

    info!("Shutting down");

    ds.chassis.shutdown()
        .wrap_err("Failed to shut down the chassis")?;

    session.save("actions.json", ds.history.clone());
    session.exit();

    Ok(())
}

/// Replay an edit script, executing each command at its scripted time.
fn run_script(ds: &mut DataStore, path: &Path) -> Result<(), Report> {
    info!("Loading script from {:?}", path);

    let mut si = ScriptInterpreter::new(path)
        .wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} commands\n",
        si.get_duration(),
        si.get_num_cmds()
    );

    let start_s = session::get_elapsed_seconds();

    loop {
        match si.pending_at(session::get_elapsed_seconds() - start_s) {
            PendingCmds::None => (),
            PendingCmds::Some(cmds) => {
                for cmd in cmds.iter() {
                    println!("> {:?}", cmd);
                    cmd_processor::exec(ds, cmd);

                    if ds.quit {
                        return Ok(());
                    }
                }
            },
            PendingCmds::EndOfScript => {
                info!("End of script reached");
                break;
            }
        }

        cycle(ds);
        thread::sleep(SCRIPT_POLL_PERIOD);
    }

    Ok(())
}

/// Keep the chassis running until the queue is paused or empty.
fn drain_queue(ds: &mut DataStore) {
    cycle(ds);

    while !ds.queue.is_paused() 
        && (ds.queue.current().is_some() || !ds.queue.is_empty()) 
    {
        thread::sleep(SCRIPT_POLL_PERIOD);
        cycle(ds);
    }
}

/// Run the interactive prompt until the operator quits.
fn run_interactive(ds: &mut DataStore, params: &ToolExecParams) 
    -> Result<(), Report> 
{
    let mut rl = DefaultEditor::new()
        .wrap_err("Failed to start the line editor")?;

    let mut history_path = host::get_sw_root()
        .wrap_err("Failed to get the software root")?;
    history_path.push(&params.history_path);

    if rl.load_history(&history_path).is_err() {
        info!("No history found at {:?}", history_path);
    }

    cmd_processor::print_help();
    cmd_processor::print_nodes(&ds.action_ctrl);

    while !ds.quit {
        let line = match rl.readline(&params.prompt) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).wrap_err("Failed to read the command")
        };

        // Bring the chassis up to date before acting on the command
        cycle(ds);

        if line.trim().is_empty() {
            continue;
        }
        rl.add_history_entry(line.as_str()).ok();

        match line.parse::<ToolCmd>() {
            Ok(cmd) => {
                debug!("Operator command: {:?}", cmd);
                cmd_processor::exec(ds, &cmd);
            },
            Err(e) => cmd_processor::report_error(e)
        }

        cycle(ds);
    }

    if let Some(dir) = history_path.parent() {
        std::fs::create_dir_all(dir).ok();
    }
    if let Err(e) = rl.save_history(&history_path) {
        warn!("Could not save the command history: {}", e);
    }

    Ok(())
}

/// Advance the chassis and dispatch queued actions.
fn cycle(ds: &mut DataStore) {
    match ds.cycle() {
        Ok(Some(action)) => println!("Executing: {}", action),
        Ok(None) => (),
        Err(e) => cmd_processor::report_error(e)
    }
}
