// Motor control module for EV3 tacho motors
//
// Provides:
// - ev3dev tacho-motor attribute protocol (file names and command tokens)
// - Port to device directory resolution
// - High-level motor API

mod attribute;
mod driver;
mod error;
pub mod port;
pub mod protocol;
#[cfg(test)]
pub(crate) mod testing;

pub use attribute::{AttributeIo, SysfsAttributes};
pub use driver::TachoMotor;
pub use error::{ErrorKind, MotorError, Result};
pub use port::{OutPort, ParsePortError, PortResolver};
pub use protocol::{state_flags, Attribute, Command, StopAction, StopCommand, Token};
