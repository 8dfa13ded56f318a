//! Simulated stage
//!
//! Stands in for the controller board when no motion hardware is attached,
//! and is what the CLI binds by default.
//!
//! - Three axes, each limited to `±travel_mm` around the power-on position
//! - `SET_HOME` moves the origin; reported positions are relative to it
//! - Speed must stay within `[min_speed, max_speed]`
//! - Rejected requests latch a fault that `CHECK_ERRORS` reports once
//!
//! Moves complete instantly. Nothing here sleeps, so the serve loop never
//! stalls on the simulator.

use crate::config::SimulatorConfig;
use crate::stage::MotionStage;
use anyhow::{bail, Result};
use coxiris_core::Position;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct StageState {
    /// Machine coordinates, origin at power-on
    machine: Position,
    /// Machine coordinates of the home position
    home: Position,
    speed: f64,
    fault: Option<String>,
}

/// Simulated three-axis stage with travel and speed limits.
///
/// # Example
///
/// ```
/// use coxiris_link::simulator::SimulatedStage;
/// use coxiris_link::stage::MotionStage;
/// use coxiris_core::Position;
///
/// let stage = SimulatedStage::default();
/// stage.move_abs(Position::new(10.0, 0.0, -5.0))?;
/// stage.set_home()?;
/// assert_eq!(stage.position()?, Position::default());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct SimulatedStage {
    state: Mutex<StageState>,
    min_speed: f64,
    max_speed: f64,
    travel_mm: f64,
}

impl SimulatedStage {
    /// Create a stage from the `[simulator]` configuration section.
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            state: Mutex::new(StageState {
                machine: Position::default(),
                home: Position::default(),
                speed: config.speed,
                fault: None,
            }),
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            travel_mm: config.travel_mm,
        }
    }

    /// Latch a fault as if the hardware had reported one.
    pub fn inject_fault(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(%reason, "fault injected");
        self.state.lock().fault = Some(reason);
    }

    /// Whether a fault is latched.
    pub fn has_fault(&self) -> bool {
        self.state.lock().fault.is_some()
    }

    /// Position in machine coordinates.
    pub fn machine_position(&self) -> Position {
        self.state.lock().machine
    }

    fn within_travel(&self, value: f64) -> bool {
        value.abs() <= self.travel_mm
    }

    fn reject(state: &mut StageState, reason: String) -> anyhow::Error {
        warn!(%reason, "request rejected");
        state.fault = Some(reason.clone());
        anyhow::anyhow!(reason)
    }
}

impl Default for SimulatedStage {
    fn default() -> Self {
        Self::from_config(&SimulatorConfig::default())
    }
}

impl MotionStage for SimulatedStage {
    fn set_home(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.home = state.machine;
        info!(home = ?state.home, "home set");
        Ok(())
    }

    fn move_abs(&self, target: Position) -> Result<()> {
        let mut state = self.state.lock();
        let machine = Position::new(
            state.home.x + target.x,
            state.home.y + target.y,
            state.home.z + target.z,
        );

        for (axis, value) in [("x", machine.x), ("y", machine.y), ("z", machine.z)] {
            if !self.within_travel(value) {
                return Err(Self::reject(
                    &mut state,
                    format!("{axis} out of travel ({value:.2} mm, limit {:.2})", self.travel_mm),
                ));
            }
        }

        debug!(from = ?state.machine, to = ?machine, speed = state.speed, "moving");
        state.machine = machine;
        Ok(())
    }

    fn position(&self) -> Result<Position> {
        let state = self.state.lock();
        Ok(Position::new(
            state.machine.x - state.home.x,
            state.machine.y - state.home.y,
            state.machine.z - state.home.z,
        ))
    }

    fn set_speed(&self, speed: f64) -> Result<()> {
        let mut state = self.state.lock();
        if !(self.min_speed..=self.max_speed).contains(&speed) {
            return Err(Self::reject(
                &mut state,
                format!(
                    "speed {speed} outside {}..{} mm/s",
                    self.min_speed, self.max_speed
                ),
            ));
        }
        state.speed = speed;
        debug!(speed, "speed set");
        Ok(())
    }

    fn speed(&self) -> Result<f64> {
        Ok(self.state.lock().speed)
    }

    fn min_speed(&self) -> Result<f64> {
        Ok(self.min_speed)
    }

    fn max_speed(&self) -> Result<f64> {
        Ok(self.max_speed)
    }

    fn check_errors(&self) -> Result<()> {
        match self.state.lock().fault.take() {
            Some(reason) => bail!(reason),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_offsets_reported_position() {
        let stage = SimulatedStage::default();
        stage.move_abs(Position::new(20.0, -10.0, 5.0)).unwrap();
        stage.set_home().unwrap();
        assert_eq!(stage.position().unwrap(), Position::default());

        stage.move_rel(Position::new(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(stage.position().unwrap(), Position::new(1.0, 1.0, 1.0));
        assert_eq!(stage.machine_position(), Position::new(21.0, -9.0, 6.0));

        stage.go_home().unwrap();
        assert_eq!(stage.machine_position(), Position::new(20.0, -10.0, 5.0));
    }

    #[test]
    fn travel_is_checked_in_machine_coordinates() {
        let stage = SimulatedStage::default();
        stage.move_abs(Position::new(90.0, 0.0, 0.0)).unwrap();
        stage.set_home().unwrap();

        // 90 + 20 exceeds the 100 mm travel even though the request is small
        let err = stage.move_abs(Position::new(20.0, 0.0, 0.0)).unwrap_err();
        assert!(err.to_string().starts_with("x out of travel"));
        assert_eq!(stage.machine_position(), Position::new(90.0, 0.0, 0.0));
    }

    #[test]
    fn rejected_requests_latch_one_fault() {
        let stage = SimulatedStage::default();
        assert!(stage.set_speed(0.1).is_err());
        assert!(stage.has_fault());
        assert_eq!(stage.speed().unwrap(), 10.0);

        let err = stage.check_errors().unwrap_err();
        assert!(err.to_string().contains("outside 0.5..50"));
        assert!(stage.check_errors().is_ok());
    }

    #[test]
    fn speed_limits_are_inclusive() {
        let stage = SimulatedStage::default();
        stage.set_speed(0.5).unwrap();
        stage.set_speed(50.0).unwrap();
        assert_eq!(stage.speed().unwrap(), 50.0);
        assert_eq!(stage.min_speed().unwrap(), 0.5);
        assert_eq!(stage.max_speed().unwrap(), 50.0);
    }

    #[test]
    fn injected_fault_is_reported() {
        let stage = SimulatedStage::default();
        stage.inject_fault("z limit switch");
        assert_eq!(stage.check_errors().unwrap_err().to_string(), "z limit switch");
    }
}
