// ev3dev tacho-motor attribute protocol
//
// Each device directory under the class root exposes one text file per
// parameter. File names and command tokens here are bit-exact with the driver.

use std::fmt;

/// Attribute files exposed by a tacho-motor device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Address,      // read-only: "ev3-ports:outX"
    Speed,        // read-only, i16
    SpeedSp,      // read/write, i16
    DutyCycle,    // read-only, i16
    Position,     // read/write, i32
    PositionSp,   // read/write, i32 (written as i16 by run-to-abs-pos)
    Command,      // write-only, see `Command`
    StopCommand,  // read/write, see `StopCommand`
    StopAction,   // read/write, see `StopAction`
    State,        // read-only, space separated flags
}

impl Attribute {
    pub const ALL: [Attribute; 10] = [
        Attribute::Address,
        Attribute::Speed,
        Attribute::SpeedSp,
        Attribute::DutyCycle,
        Attribute::Position,
        Attribute::PositionSp,
        Attribute::Command,
        Attribute::StopCommand,
        Attribute::StopAction,
        Attribute::State,
    ];

    /// File name under the device directory
    pub const fn file_name(self) -> &'static str {
        match self {
            Attribute::Address => "address",
            Attribute::Speed => "speed",
            Attribute::SpeedSp => "speed_sp",
            Attribute::DutyCycle => "duty_cycle",
            Attribute::Position => "position",
            Attribute::PositionSp => "position_sp",
            Attribute::Command => "command",
            Attribute::StopCommand => "stop_command",
            Attribute::StopAction => "stop_action",
            Attribute::State => "state",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// A value written verbatim to a token attribute
pub trait Token: Copy {
    /// Attribute the token is written to
    const ATTRIBUTE: Attribute;

    fn token(self) -> &'static str;
}

/// Tokens accepted by the `command` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RunForever,
    RunToAbsPos,
    Stop,
    Reset,
}

impl Token for Command {
    const ATTRIBUTE: Attribute = Attribute::Command;

    fn token(self) -> &'static str {
        match self {
            Command::RunForever => "run-forever",
            Command::RunToAbsPos => "run-to-abs-pos",
            Command::Stop => "stop",
            Command::Reset => "reset",
        }
    }
}

/// Tokens accepted by the `stop_command` attribute (brake mode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCommand {
    Brake,
    Coast,
}

impl Token for StopCommand {
    const ATTRIBUTE: Attribute = Attribute::StopCommand;

    fn token(self) -> &'static str {
        match self {
            StopCommand::Brake => "brake",
            StopCommand::Coast => "coast",
        }
    }
}

/// Tokens accepted by the `stop_action` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopAction {
    Hold,
    Coast,
}

impl Token for StopAction {
    const ATTRIBUTE: Attribute = Attribute::StopAction;

    fn token(self) -> &'static str {
        match self {
            StopAction::Hold => "hold",
            StopAction::Coast => "coast",
        }
    }
}

/// Split the raw `state` attribute into its flags without interpreting them.
///
/// An idle motor reports an empty string, which yields no flags.
pub fn state_flags(state: &str) -> Vec<&str> {
    state.split_whitespace().collect()
}
