//! # Command processor module
//!
//! The command processor handles operator commands coming from either the interactive prompt or
//! an edit script, and prints the state of the editor back to the operator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use owo_colors::OwoColorize;
use std::fmt::Display;

// Internal
use action_if::{ChassisDriver, ToolCmd};
use tool_lib::{
    action_ctrl::{ActionCtrl, NodeState},
    data_store::DataStore
};
use util::{archive::Archived, module::State};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const HELP: &str = "\
Edit the action with any three of the quantities below, then confirm it.

  v <m/s>     linear speed        w <deg/s>   angular speed
  r <m>       turn radius         s <m>       distance
  a <deg>     turn angle          t <s>       duration

  <tag>, clear <tag>   clear a quantity
  confirm              queue the action (only when ready)
  reset                clear every quantity
  show                 show the quantities and the queue
  pause, resume        pause or resume the queue (starts paused)
  cancel               cancel the current action and empty the queue
  lock, unlock         lock or unlock the chassis
  odom                 show the chassis odometry and steering offset
  zero                 reset the chassis odometry
  steer <deg>          adjust the zero position of the steering
  help                 show this message
  quit                 exit";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute an operator command.
pub(crate) fn exec(ds: &mut DataStore, cmd: &ToolCmd) {

    match cmd {
        ToolCmd::Edit(edit) => {
            match ds.action_ctrl.proc(edit) {
                Ok((Some(action), _)) => {
                    println!("{} {}", "Confirmed:".green().bold(), action);
                },
                Ok((None, report)) => {
                    if report.derived_out_of_range {
                        println!(
                            "{}", 
                            "A derived quantity is beyond the limits of the chassis".yellow()
                        );
                    }
                },
                Err(e) => report_error(e)
            }

            if let Err(e) = ds.action_ctrl.write() {
                warn!("Could not write the ActionCtrl archives: {}", e);
            }

            print_nodes(&ds.action_ctrl);
        },
        ToolCmd::Show => {
            print_nodes(&ds.action_ctrl);
            print_queue(ds);
        },
        ToolCmd::Pause => match ds.queue.pause(&mut ds.chassis) {
            Ok(()) => println!("Queue paused"),
            Err(e) => report_error(e)
        },
        ToolCmd::Resume => match ds.queue.resume(&mut ds.chassis) {
            Ok(Some(action)) => println!("{} {}", "Executing:".cyan(), action),
            Ok(None) => println!("Queue resumed"),
            Err(e) => report_error(e)
        },
        ToolCmd::Cancel => match ds.queue.cancel(&mut ds.chassis) {
            Ok(n) => println!("Cancelled {} action(s), queue paused", n),
            Err(e) => report_error(e)
        },
        ToolCmd::Lock => match ds.chassis.lock() {
            Ok(()) => {
                info!("Chassis locked");
                println!("Chassis locked")
            },
            Err(e) => report_error(e)
        },
        ToolCmd::Unlock => match ds.chassis.unlock() {
            Ok(()) => {
                info!("Chassis unlocked");
                println!("Chassis unlocked")
            },
            Err(e) => report_error(e)
        },
        ToolCmd::Odom => match ds.chassis.read_odometry() {
            Ok(odom) => {
                println!(
                    "  x = {:.3} m, y = {:.3} m, heading = {:.1} deg",
                    odom.x_m, odom.y_m, odom.theta_rad.to_degrees()
                );
                println!(
                    "  travelled {:.3} m, turned {:.1} deg, v = {:.3} m/s, w = {:.1} deg/s",
                    odom.s_m, 
                    odom.sa_rad.to_degrees(), 
                    odom.v_ms, 
                    odom.w_rads.to_degrees()
                );
                println!(
                    "  steering offset {:.1} deg",
                    ds.chassis.steering_offset_rad().to_degrees()
                );
            },
            Err(e) => report_error(e)
        },
        ToolCmd::ZeroOdom => match ds.chassis.reset_odometry() {
            Ok(()) => {
                info!("Odometry reset");
                println!("Odometry reset")
            },
            Err(e) => report_error(e)
        },
        ToolCmd::Steer(deg) => match ds.chassis.adjust_steering(deg.to_radians()) {
            Ok(()) => {
                info!("Steering offset set to {} deg", deg);
                println!("Steering offset set to {} deg", deg)
            },
            Err(e) => report_error(e)
        },
        ToolCmd::Help => println!("{}", HELP),
        ToolCmd::Quit => {
            debug!("Quit requested");
            ds.quit = true;
        }
    }
}

/// Print the table of quantities and whether the action can be confirmed.
pub(crate) fn print_nodes(ctrl: &ActionCtrl) {
    for node in ctrl.nodes().iter() {
        let role = node.role();
        let value = format!("{:>10}", node.display_text());
        let state = node.state().to_string();

        let (value, state) = match node.state() {
            NodeState::Fixed => (
                value.green().bold().to_string(), 
                state.green().to_string()
            ),
            NodeState::Derived => (
                value.cyan().to_string(), 
                state.cyan().to_string()
            ),
            NodeState::Invalid => (
                value.dimmed().to_string(), 
                state.dimmed().to_string()
            ),
            NodeState::Error(_) => (
                value.red().to_string(), 
                state.red().to_string()
            ),
            NodeState::Void => (value, state.dimmed().to_string())
        };

        println!(
            "  {} {:<14} {} {:<6} {}", 
            role.tag().bold(), role.name(), value, role.units(), state
        );
    }

    match ctrl.readiness() {
        Ok(()) => println!("  {}", "ready to confirm".green().bold()),
        Err(e) => println!("  {} {}", "not ready:".yellow(), e)
    }
}

/// Print an error to the operator and the log.
pub(crate) fn report_error<E: Display>(e: E) {
    warn!("{}", e);
    println!("{}", e.to_string().red());
}

/// Print the command summary.
pub(crate) fn print_help() {
    println!("{}", HELP);
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn print_queue(ds: &DataStore) {
    match (ds.queue.current(), ds.chassis.progress()) {
        (Some(action), Some(progress)) => println!(
            "  executing {} ({:.0} %){}", 
            action, 
            progress * 100.0,
            if ds.chassis.is_paused() { ", paused" } else { "" }
        ),
        _ => println!("  chassis idle ({:?})", ds.chassis.state())
    }

    for (i, action) in ds.queue.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, action);
    }

    println!(
        "  queue {}, {} action(s) confirmed this session", 
        if ds.queue.is_paused() { "paused" } else { "running" },
        ds.history.len()
    );
}
