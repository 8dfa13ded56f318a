//! Capability: three-axis motion
//!
//! [`MotionStage`] is the seam between the command protocol and whatever
//! moves the optics. [`bind_stage`] wires every protocol operation to one
//! stage instance.

use anyhow::Result;
use coxiris_core::{DeviceOperations, Position};
use std::sync::Arc;

/// Devices that can position a three-axis stage.
///
/// # Contract
/// - Positions are in mm, relative to the home position
/// - `move_abs` and `move_rel` reject targets outside the travel range
///   without moving any axis
/// - Speeds are in mm/s and must lie within [`min_speed`, `max_speed`]
///
/// # Thread Safety
/// - All methods take `&self`; implementations use interior mutability
///
/// [`min_speed`]: MotionStage::min_speed
/// [`max_speed`]: MotionStage::max_speed
pub trait MotionStage: Send + Sync {
    /// Make the current position the new home (origin).
    fn set_home(&self) -> Result<()>;

    /// Move back to the home position.
    fn go_home(&self) -> Result<()> {
        self.move_abs(Position::default())
    }

    /// Move to an absolute position.
    fn move_abs(&self, target: Position) -> Result<()>;

    /// Move by an offset from the current position.
    fn move_rel(&self, delta: Position) -> Result<()> {
        let current = self.position()?;
        self.move_abs(Position::new(
            current.x + delta.x,
            current.y + delta.y,
            current.z + delta.z,
        ))
    }

    /// Current position.
    fn position(&self) -> Result<Position>;

    /// Set the motion speed.
    fn set_speed(&self, speed: f64) -> Result<()>;

    /// Current motion speed.
    fn speed(&self) -> Result<f64>;

    /// Lowest speed the stage accepts.
    fn min_speed(&self) -> Result<f64>;

    /// Highest speed the stage accepts.
    fn max_speed(&self) -> Result<f64>;

    /// Report (and clear) any latched fault.
    ///
    /// # Default Implementation
    /// Reports no fault.
    fn check_errors(&self) -> Result<()> {
        Ok(())
    }
}

/// Bind every protocol operation to `stage`.
pub fn bind_stage<S: MotionStage + 'static>(stage: Arc<S>) -> DeviceOperations {
    let set_home = stage.clone();
    let go_home = stage.clone();
    let move_abs = stage.clone();
    let move_rel = stage.clone();
    let position = stage.clone();
    let set_speed = stage.clone();
    let speed = stage.clone();
    let min_speed = stage.clone();
    let max_speed = stage.clone();
    let check_errors = stage;

    DeviceOperations::new()
        .on_set_home(move || set_home.set_home())
        .on_go_home(move || go_home.go_home())
        .on_absolute_move(move |x, y, z| move_abs.move_abs(Position::new(x, y, z)))
        .on_delta_move(move |dx, dy, dz| move_rel.move_rel(Position::new(dx, dy, dz)))
        .on_get_position(move || position.position())
        .on_set_speed(move |v| set_speed.set_speed(v))
        .on_get_speed(move || speed.speed())
        .on_get_min_speed(move || min_speed.min_speed())
        .on_get_max_speed(move || max_speed.max_speed())
        .on_check_errors(move || check_errors.check_errors())
}
