//! # Simulated chassis
//!
//! An in-process chassis driver, allowing the tool to be run and tested
//! without the chassis hardware. Motions are integrated as perfect unicycle
//! motion in the odometry frame.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use action_if::{ChassisDriver, ChassisError, ChassisState, Odometry, Spatium};
use log::{debug, info, warn};
use serde::Deserialize;

// Internal
use util::session;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum absolute steering offset accepted by the chassis.
///
/// Units: radians
const MAX_STEERING_OFFSET_RAD: f64 = std::f64::consts::FRAC_PI_2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated chassis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimChassisParams {
    /// Distance between the left and right wheels.
    ///
    /// Units: meters
    pub width_m: f64,

    /// Name reported as the connected port.
    pub port_name: String,
}

/// Spatium of a differential drive chassis: the distance covered by the
/// outer wheel over a motion.
#[derive(Debug, Clone, Copy)]
pub struct SimSpatium {
    pub width_m: f64,
}

/// The simulated chassis.
pub struct SimChassis {
    params: SimChassisParams,

    spatium: SimSpatium,

    state: ChassisState,

    initialised: bool,

    paused: bool,

    motion: Option<Motion>,

    odom: Odometry,

    steering_offset_rad: f64,

    /// Session time of the last call to `update`.
    last_update_s: Option<f64>,
}

/// A motion being executed.
#[derive(Debug, Clone, Copy)]
struct Motion {
    v_ms: f64,
    w_rads: f64,
    duration_s: f64,
    elapsed_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimChassisParams {
    fn default() -> Self {
        Self {
            width_m: 0.41,
            port_name: String::from("sim"),
        }
    }
}

impl Spatium for SimSpatium {
    fn calculate_spatium(&self, distance_m: f64, angle_rad: f64) -> f64 {
        if distance_m == 0.0 && angle_rad == 0.0 {
            return std::f64::NAN;
        }

        distance_m.abs() + angle_rad.abs() * self.width_m * 0.5
    }
}

impl SimSpatium {
    /// The rate at which the spatium is covered at the given speeds.
    pub fn rate(&self, v_ms: f64, w_rads: f64) -> f64 {
        v_ms.abs() + w_rads.abs() * self.width_m * 0.5
    }
}

impl SimChassis {
    pub fn new(params: SimChassisParams) -> Self {
        Self {
            spatium: SimSpatium { width_m: params.width_m },
            params,
            state: ChassisState::Offline,
            initialised: false,
            paused: false,
            motion: None,
            odom: Odometry::default(),
            steering_offset_rad: 0.0,
            last_update_s: None,
        }
    }

    /// A copy of the chassis' spatium conversion, for the action editor.
    pub fn spatium(&self) -> SimSpatium {
        self.spatium
    }

    /// The current steering offset.
    ///
    /// Units: radians
    pub fn steering_offset_rad(&self) -> f64 {
        self.steering_offset_rad
    }

    /// Advance the simulation to the current session time.
    pub fn update(&mut self) {
        let now_s = match session::try_get_elapsed_seconds() {
            Some(t) => t,
            None => return
        };

        if let Some(last_s) = self.last_update_s {
            if now_s > last_s {
                self.step(now_s - last_s);
            }
        }

        self.last_update_s = Some(now_s);
    }

    /// Advance the simulation by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f64) {
        if self.paused {
            return;
        }

        let mut motion = match self.motion {
            Some(m) => m,
            None => return
        };

        let dt_s = dt_s.min(motion.duration_s - motion.elapsed_s).max(0.0);

        // Integrate about the midpoint heading
        let theta_mid = self.odom.theta_rad + 0.5 * motion.w_rads * dt_s;
        self.odom.x_m += motion.v_ms * theta_mid.cos() * dt_s;
        self.odom.y_m += motion.v_ms * theta_mid.sin() * dt_s;
        self.odom.theta_rad += motion.w_rads * dt_s;
        self.odom.s_m += motion.v_ms.abs() * dt_s;
        self.odom.sa_rad += motion.w_rads.abs() * dt_s;
        self.odom.v_ms = motion.v_ms;
        self.odom.w_rads = motion.w_rads;

        motion.elapsed_s += dt_s;

        if motion.elapsed_s >= motion.duration_s {
            info!("Action complete after {:.2} s", motion.duration_s);
            self.stop();
        }
        else {
            self.motion = Some(motion);
        }
    }

    fn stop(&mut self) {
        self.motion = None;
        self.paused = false;
        self.odom.v_ms = 0.0;
        self.odom.w_rads = 0.0;
    }

    fn check_initialised(&self) -> Result<(), ChassisError> {
        if self.initialised {
            Ok(())
        }
        else {
            Err(ChassisError::NotInitialised)
        }
    }

    fn start(&mut self, v_ms: f64, w_rads: f64, duration_s: f64) 
        -> Result<(), ChassisError> 
    {
        self.check_initialised()?;

        match self.state {
            ChassisState::Unlocked => (),
            ChassisState::Error => {
                return Err(ChassisError::Driver("The chassis has faulted".into()))
            },
            _ => return Err(ChassisError::Locked)
        }

        if self.motion.is_some() {
            return Err(ChassisError::Driver(
                "An action is already being executed".into()
            ));
        }

        if !v_ms.is_finite() || !w_rads.is_finite() {
            return Err(ChassisError::Driver(
                format!("Invalid speeds ({}, {})", v_ms, w_rads)
            ));
        }

        debug!(
            "Starting motion at ({} m/s, {} rad/s) for {:.3} s", 
            v_ms, w_rads, duration_s
        );

        self.motion = Some(Motion {
            v_ms,
            w_rads,
            duration_s,
            elapsed_s: 0.0,
        });

        Ok(())
    }
}

impl Spatium for SimChassis {
    fn calculate_spatium(&self, distance_m: f64, angle_rad: f64) -> f64 {
        self.spatium.calculate_spatium(distance_m, angle_rad)
    }
}

impl ChassisDriver for SimChassis {
    fn initialise(&mut self) -> Result<String, ChassisError> {
        self.initialised = true;
        self.state = ChassisState::Locked;

        info!(
            "Simulated chassis initialised on port {} (width {} m)", 
            self.params.port_name, self.params.width_m
        );

        Ok(self.params.port_name.clone())
    }

    fn shutdown(&mut self) -> Result<(), ChassisError> {
        self.check_initialised()?;

        self.stop();
        self.initialised = false;
        self.state = ChassisState::Offline;

        Ok(())
    }

    fn state(&self) -> ChassisState {
        self.state
    }

    fn lock(&mut self) -> Result<(), ChassisError> {
        self.check_initialised()?;

        if self.motion.is_some() {
            warn!("Locking the chassis cancels the current action");
        }

        self.stop();
        self.state = ChassisState::Locked;

        Ok(())
    }

    fn unlock(&mut self) -> Result<(), ChassisError> {
        self.check_initialised()?;

        self.state = ChassisState::Unlocked;

        Ok(())
    }

    fn drive_by_space(&mut self, v_ms: f64, w_rads: f64, spatium: f64) 
        -> Result<(), ChassisError> 
    {
        if !spatium.is_finite() || spatium <= 0.0 {
            return Err(ChassisError::Driver(
                format!("Invalid spatium {}", spatium)
            ));
        }

        let rate = self.spatium.rate(v_ms, w_rads);
        if rate == 0.0 {
            return Err(ChassisError::Driver("Action never complete".into()));
        }

        self.start(v_ms, w_rads, spatium / rate)
    }

    fn drive_by_time(&mut self, v_ms: f64, w_rads: f64, time_s: f64) 
        -> Result<(), ChassisError> 
    {
        if !time_s.is_finite() || time_s <= 0.0 {
            return Err(ChassisError::Driver(
                format!("Invalid duration {} s", time_s)
            ));
        }

        self.start(v_ms, w_rads, time_s)
    }

    fn adjust_steering(&mut self, offset_rad: f64) -> Result<(), ChassisError> {
        self.check_initialised()?;

        if offset_rad.abs() >= MAX_STEERING_OFFSET_RAD {
            return Err(ChassisError::Driver(
                "More than +-90 degree is not supported yet".into()
            ));
        }

        self.steering_offset_rad = offset_rad;

        Ok(())
    }

    fn cancel(&mut self) -> Result<(), ChassisError> {
        self.check_initialised()?;

        if self.motion.is_some() {
            info!("Action cancelled");
        }
        self.stop();

        Ok(())
    }

    fn pause(&mut self) -> Result<(), ChassisError> {
        self.check_initialised()?;

        if self.motion.is_none() {
            return Err(ChassisError::Driver("No action is being executed".into()));
        }

        self.paused = true;
        self.odom.v_ms = 0.0;
        self.odom.w_rads = 0.0;

        Ok(())
    }

    fn resume(&mut self) -> Result<(), ChassisError> {
        self.check_initialised()?;

        self.paused = false;

        Ok(())
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn progress(&self) -> Option<f64> {
        self.motion.map(|m| (m.elapsed_s / m.duration_s).min(1.0))
    }

    fn read_odometry(&self) -> Result<Odometry, ChassisError> {
        self.check_initialised()?;

        Ok(self.odom)
    }

    fn reset_odometry(&mut self) -> Result<(), ChassisError> {
        self.check_initialised()?;

        self.odom = Odometry {
            v_ms: self.odom.v_ms,
            w_rads: self.odom.w_rads,
            ..Odometry::default()
        };

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ready_chassis() -> SimChassis {
        let mut chassis = SimChassis::new(SimChassisParams::default());
        assert_eq!(chassis.initialise().unwrap(), "sim");
        chassis.unlock().unwrap();
        chassis
    }

    #[test]
    fn test_spatium() {
        let spatium = SimSpatium { width_m: 0.5 };

        assert!(spatium.calculate_spatium(0.0, 0.0).is_nan());
        assert_eq!(spatium.calculate_spatium(2.0, 0.0), 2.0);
        assert_eq!(spatium.calculate_spatium(1.0, 2.0), 1.5);
        assert!(spatium.calculate_spatium(1.0, 2.0) < spatium.calculate_spatium(1.0, 3.0));
    }

    #[test]
    fn test_not_ready() {
        let mut chassis = SimChassis::new(SimChassisParams::default());
        assert!(matches!(
            chassis.drive_by_time(0.1, 0.0, 1.0), 
            Err(ChassisError::NotInitialised)
        ));

        chassis.initialise().unwrap();
        assert_eq!(chassis.state(), ChassisState::Locked);
        assert!(matches!(
            chassis.drive_by_time(0.1, 0.0, 1.0), 
            Err(ChassisError::Locked)
        ));
    }

    #[test]
    fn test_drive_by_time() {
        let mut chassis = ready_chassis();

        chassis.drive_by_time(0.5, 0.0, 2.0).unwrap();
        assert_eq!(chassis.progress(), Some(0.0));
        assert!(chassis.drive_by_time(0.5, 0.0, 2.0).is_err());

        chassis.step(1.0);
        assert_eq!(chassis.progress(), Some(0.5));

        // Paused chassis doesn't move
        chassis.pause().unwrap();
        chassis.step(1.0);
        assert_eq!(chassis.progress(), Some(0.5));
        chassis.resume().unwrap();

        chassis.step(5.0);
        assert_eq!(chassis.progress(), None);

        let odom = chassis.read_odometry().unwrap();
        assert!((odom.x_m - 1.0).abs() < 1e-9);
        assert!(odom.y_m.abs() < 1e-9);
        assert!((odom.s_m - 1.0).abs() < 1e-9);
        assert_eq!(odom.v_ms, 0.0);
    }

    #[test]
    fn test_drive_by_space() {
        let mut chassis = ready_chassis();
        let spatium = chassis.calculate_spatium(0.0, std::f64::consts::PI);

        chassis.drive_by_space(0.0, 1.0, spatium).unwrap();
        chassis.step(4.0);
        assert_eq!(chassis.progress(), None);

        let odom = chassis.read_odometry().unwrap();
        assert!((odom.theta_rad - std::f64::consts::PI).abs() < 1e-9);
        assert!(odom.x_m.abs() < 1e-9);

        assert!(chassis.drive_by_space(0.0, 0.0, 1.0).is_err());
        assert!(chassis.drive_by_space(0.1, 0.0, std::f64::NAN).is_err());
    }

    #[test]
    fn test_cancel_and_lock() {
        let mut chassis = ready_chassis();

        chassis.drive_by_time(0.5, 0.1, 2.0).unwrap();
        chassis.cancel().unwrap();
        assert_eq!(chassis.progress(), None);
        assert!(chassis.pause().is_err());

        chassis.drive_by_time(0.5, 0.1, 2.0).unwrap();
        chassis.lock().unwrap();
        assert_eq!(chassis.progress(), None);
        assert_eq!(chassis.state(), ChassisState::Locked);
    }

    #[test]
    fn test_adjust_steering() {
        let mut chassis = ready_chassis();

        chassis.adjust_steering(0.2).unwrap();
        assert_eq!(chassis.steering_offset_rad(), 0.2);
        assert!(chassis.adjust_steering(-std::f64::consts::FRAC_PI_2).is_err());
        assert_eq!(chassis.steering_offset_rad(), 0.2);
    }

    #[test]
    fn test_reset_odometry() {
        let mut chassis = ready_chassis();

        chassis.drive_by_time(0.5, 0.0, 2.0).unwrap();
        chassis.step(1.0);
        chassis.reset_odometry().unwrap();

        let odom = chassis.read_odometry().unwrap();
        assert_eq!(odom.x_m, 0.0);
        assert_eq!(odom.s_m, 0.0);
        assert_eq!(odom.v_ms, 0.5);

        chassis.step(1.0);
        assert!((chassis.read_odometry().unwrap().x_m - 0.5).abs() < 1e-9);
    }
}
