//! Device operations bound at configuration time.
//!
//! The dispatcher never owns device state. The host hands it a
//! [`DeviceOperations`] set of shared closures, one per command that needs
//! the device. Any operation may be left unbound; the dispatcher then
//! answers with a "function not configured" error instead of failing.
//!
//! # Example
//!
//! ```
//! use coxiris_core::{DeviceOperations, Position};
//!
//! let ops = DeviceOperations::new()
//!     .on_absolute_move(|x, y, z| {
//!         println!("move to {x} {y} {z}");
//!         Ok(())
//!     })
//!     .on_get_position(|| Ok(Position::new(1.0, 2.0, 3.0)));
//! assert_eq!(ops.bound_count(), 2);
//! ```

use crate::command::{CommandKind, OperationShape};
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A three-axis position in device units (mm).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Position {
    /// Create a position from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Shared no-argument action.
pub type ActionFn = Arc<dyn Fn() -> Result<()> + Send + Sync>;
/// Shared three-float action.
pub type MoveFn = Arc<dyn Fn(f64, f64, f64) -> Result<()> + Send + Sync>;
/// Shared single-float setter.
pub type SetterFn = Arc<dyn Fn(f64) -> Result<()> + Send + Sync>;
/// Shared single-float getter.
pub type GetterFn = Arc<dyn Fn() -> Result<f64> + Send + Sync>;
/// Shared position getter.
pub type PositionFn = Arc<dyn Fn() -> Result<Position> + Send + Sync>;

/// A device operation, tagged by its shape.
#[derive(Clone)]
pub enum BoundOperation {
    /// No arguments, no result.
    Action(ActionFn),
    /// Three floats in (x, y, z order).
    Move(MoveFn),
    /// One float in.
    Setter(SetterFn),
    /// One float out.
    Getter(GetterFn),
    /// Three floats out.
    PositionGetter(PositionFn),
}

/// What a bound operation produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperationOutput {
    /// Nothing to report.
    Unit,
    /// A single value.
    Scalar(f64),
    /// A three-axis position.
    Position(Position),
}

impl BoundOperation {
    /// The shape of this operation.
    pub fn shape(&self) -> OperationShape {
        match self {
            BoundOperation::Action(_) => OperationShape::Action,
            BoundOperation::Move(_) => OperationShape::Move,
            BoundOperation::Setter(_) => OperationShape::Setter,
            BoundOperation::Getter(_) => OperationShape::Getter,
            BoundOperation::PositionGetter(_) => OperationShape::PositionGetter,
        }
    }

    /// Invoke the operation with already validated arguments.
    ///
    /// Fails if the argument count does not match the shape.
    pub fn invoke(&self, args: &[f64]) -> Result<OperationOutput> {
        match (self, args) {
            (BoundOperation::Action(f), []) => f().map(|()| OperationOutput::Unit),
            (BoundOperation::Move(f), &[x, y, z]) => f(x, y, z).map(|()| OperationOutput::Unit),
            (BoundOperation::Setter(f), &[value]) => f(value).map(|()| OperationOutput::Unit),
            (BoundOperation::Getter(f), []) => f().map(OperationOutput::Scalar),
            (BoundOperation::PositionGetter(f), []) => f().map(OperationOutput::Position),
            (op, args) => bail!(
                "{:?} operation called with {} argument(s)",
                op.shape(),
                args.len()
            ),
        }
    }
}

impl fmt::Debug for BoundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundOperation::{:?}", self.shape())
    }
}

/// The set of device operations supplied by the host.
///
/// Built once with the `on_*` methods; each method only accepts a closure of
/// the shape its command needs, so a command can never be bound to the wrong
/// kind of operation.
#[derive(Clone, Default)]
pub struct DeviceOperations {
    bound: HashMap<CommandKind, BoundOperation>,
}

impl DeviceOperations {
    /// An empty set; every command that needs the device is unbound.
    pub fn new() -> Self {
        Self::default()
    }

    /// The operation bound to `kind`, if any.
    pub fn get(&self, kind: CommandKind) -> Option<&BoundOperation> {
        self.bound.get(&kind)
    }

    /// Whether `kind` has an operation.
    pub fn is_bound(&self, kind: CommandKind) -> bool {
        self.bound.contains_key(&kind)
    }

    /// Number of bound operations.
    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }

    fn bind(mut self, kind: CommandKind, operation: BoundOperation) -> Self {
        debug_assert_eq!(kind.descriptor().shape, operation.shape());
        self.bound.insert(kind, operation);
        self
    }

    /// Bind `SET_HOME`.
    pub fn on_set_home(self, f: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.bind(CommandKind::SetHome, BoundOperation::Action(Arc::new(f)))
    }

    /// Bind `GO_HOME`.
    pub fn on_go_home(self, f: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.bind(CommandKind::GoHome, BoundOperation::Action(Arc::new(f)))
    }

    /// Bind `ABSOLUTE_MOVE`.
    pub fn on_absolute_move(
        self,
        f: impl Fn(f64, f64, f64) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.bind(CommandKind::AbsoluteMove, BoundOperation::Move(Arc::new(f)))
    }

    /// Bind `DELTA_MOVE`.
    pub fn on_delta_move(
        self,
        f: impl Fn(f64, f64, f64) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.bind(CommandKind::DeltaMove, BoundOperation::Move(Arc::new(f)))
    }

    /// Bind `GET_POSITION`.
    pub fn on_get_position(self, f: impl Fn() -> Result<Position> + Send + Sync + 'static) -> Self {
        self.bind(
            CommandKind::GetPosition,
            BoundOperation::PositionGetter(Arc::new(f)),
        )
    }

    /// Bind `SET_SPEED`. Only called with strictly positive values.
    pub fn on_set_speed(self, f: impl Fn(f64) -> Result<()> + Send + Sync + 'static) -> Self {
        self.bind(CommandKind::SetSpeed, BoundOperation::Setter(Arc::new(f)))
    }

    /// Bind `GET_SPEED`.
    pub fn on_get_speed(self, f: impl Fn() -> Result<f64> + Send + Sync + 'static) -> Self {
        self.bind(CommandKind::GetSpeed, BoundOperation::Getter(Arc::new(f)))
    }

    /// Bind `GET_MIN_SPEED`.
    pub fn on_get_min_speed(self, f: impl Fn() -> Result<f64> + Send + Sync + 'static) -> Self {
        self.bind(CommandKind::GetMinSpeed, BoundOperation::Getter(Arc::new(f)))
    }

    /// Bind `GET_MAX_SPEED`.
    pub fn on_get_max_speed(self, f: impl Fn() -> Result<f64> + Send + Sync + 'static) -> Self {
        self.bind(CommandKind::GetMaxSpeed, BoundOperation::Getter(Arc::new(f)))
    }

    /// Bind `CHECK_ERRORS`.
    pub fn on_check_errors(self, f: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.bind(CommandKind::CheckErrors, BoundOperation::Action(Arc::new(f)))
    }
}

impl fmt::Debug for DeviceOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<&str> = self.bound.keys().map(|k| k.name()).collect();
        bound.sort_unstable();
        f.debug_struct("DeviceOperations")
            .field("bound", &bound)
            .finish()
    }
}
