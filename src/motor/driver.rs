// High-level tacho-motor API
//
// Every operation resolves the port afresh, then performs its attribute
// writes in the order the driver requires. Writes are not read back and a
// failed multi-write sequence is not rolled back.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::attribute::{AttributeIo, SysfsAttributes};
use super::error::Result;
use super::port::{OutPort, PortResolver};
use super::protocol::{Attribute, Command, StopAction, StopCommand};
use crate::config::MOTOR_ROOT;

/// Motor API over the tacho-motor class directory
#[derive(Debug, Clone)]
pub struct TachoMotor<A = SysfsAttributes> {
    resolver: PortResolver,
    io: A,
}

impl TachoMotor<SysfsAttributes> {
    /// Use the standard class root
    pub fn new() -> Self {
        Self::with_root(MOTOR_ROOT)
    }

    /// Use a custom class root (e.g. a fake tree)
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self::with_io(root, SysfsAttributes)
    }
}

impl Default for TachoMotor<SysfsAttributes> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AttributeIo> TachoMotor<A> {
    pub fn with_io(root: impl AsRef<Path>, io: A) -> Self {
        Self {
            resolver: PortResolver::new(root.as_ref()),
            io,
        }
    }

    pub fn resolver(&self) -> &PortResolver {
        &self.resolver
    }

    /// Device directory currently attached to `port`
    pub fn device(&self, port: OutPort) -> Result<PathBuf> {
        self.resolver.resolve(&self.io, port)
    }

    /// Run the motor until told otherwise.
    ///
    /// With regulation off (the default) `speed` is a power percentage in
    /// -100..=100. With regulation on it is a target speed, roughly
    /// -1000..=1000 depending on the motor type. Negative values reverse.
    pub fn run(&self, port: OutPort, speed: i16) -> Result<()> {
        let dir = self.device(port)?;
        debug!("Run {} at {}", port, speed);
        // Setpoint first, or the motor starts at the stale one
        self.io.write_int(&dir, Attribute::SpeedSp, speed)?;
        self.io.write_token(&dir, Command::RunForever)
    }

    /// Run to an absolute position and hold there.
    ///
    /// Overrides any configured stop action with `hold`.
    pub fn run_to_abs_position(&self, port: OutPort, speed: i16, position: i16) -> Result<()> {
        let dir = self.device(port)?;
        debug!("Run {} to position {} at {}", port, position, speed);
        self.io.write_int(&dir, Attribute::PositionSp, position)?;
        self.io.write_int(&dir, Attribute::SpeedSp, speed)?;
        // Must be set before the command to take effect on arrival
        self.io.write_token(&dir, StopAction::Hold)?;
        self.io.write_token(&dir, Command::RunToAbsPos)
    }

    /// Reset the driver state of the motor
    pub fn reset(&self, port: OutPort) -> Result<()> {
        let dir = self.device(port)?;
        self.io.write_token(&dir, Command::Reset)
    }

    /// Stop using the currently configured stop action
    pub fn stop(&self, port: OutPort) -> Result<()> {
        let dir = self.device(port)?;
        self.io.write_token(&dir, Command::Stop)
    }

    /// Operating speed
    pub fn current_speed(&self, port: OutPort) -> Result<i16> {
        let dir = self.device(port)?;
        self.io.read_i16(&dir, Attribute::Speed)
    }

    /// Operating power (duty cycle)
    pub fn current_power(&self, port: OutPort) -> Result<i16> {
        let dir = self.device(port)?;
        self.io.read_i16(&dir, Attribute::DutyCycle)
    }

    /// Brake to a stop on the next `stop`
    pub fn enable_brake_mode(&self, port: OutPort) -> Result<()> {
        let dir = self.device(port)?;
        self.io.write_token(&dir, StopCommand::Brake)
    }

    /// Coast to a stop on the next `stop`. Brake mode is off by default.
    pub fn disable_brake_mode(&self, port: OutPort) -> Result<()> {
        let dir = self.device(port)?;
        self.io.write_token(&dir, StopCommand::Coast)
    }

    pub fn current_position(&self, port: OutPort) -> Result<i32> {
        let dir = self.device(port)?;
        self.io.read_i32(&dir, Attribute::Position)
    }

    /// Overwrite the position counter, moving its zero reference
    pub fn initialize_position(&self, port: OutPort, value: i32) -> Result<()> {
        let dir = self.device(port)?;
        self.io.write_int(&dir, Attribute::Position, value)
    }

    pub fn hold_stop_action(&self, port: OutPort) -> Result<()> {
        self.set_stop_action(port, StopAction::Hold)
    }

    pub fn coast_stop_action(&self, port: OutPort) -> Result<()> {
        self.set_stop_action(port, StopAction::Coast)
    }

    pub fn set_stop_action(&self, port: OutPort, action: StopAction) -> Result<()> {
        let dir = self.device(port)?;
        self.io.write_token(&dir, action)
    }

    /// Raw `state` attribute; see [`state_flags`](super::protocol::state_flags)
    pub fn get_state(&self, port: OutPort) -> Result<String> {
        let dir = self.device(port)?;
        self.io.read_attribute(&dir, Attribute::State)
    }
}
