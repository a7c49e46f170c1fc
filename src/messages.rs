// Message types exchanged with the runtime

use serde::{Deserialize, Serialize};

use crate::motor::{OutPort, StopAction};

// Command from teleop/scripts -> runtime
// JSON shape: {"cmd": "run", "port": "A", "speed": 50}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum MotorCommand {
    Run { port: OutPort, speed: i16 },
    RunToAbsPosition { port: OutPort, speed: i16, position: i16 },
    Stop { port: OutPort },
    Reset { port: OutPort },
    BrakeMode { port: OutPort, enabled: bool },
    StopAction { port: OutPort, action: StopAction },
    InitializePosition { port: OutPort, value: i32 },
}

impl MotorCommand {
    pub fn port(&self) -> OutPort {
        match *self {
            MotorCommand::Run { port, .. }
            | MotorCommand::RunToAbsPosition { port, .. }
            | MotorCommand::Stop { port }
            | MotorCommand::Reset { port }
            | MotorCommand::BrakeMode { port, .. }
            | MotorCommand::StopAction { port, .. }
            | MotorCommand::InitializePosition { port, .. } => port,
        }
    }
}

/// Telemetry snapshot of one motor, published by the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorTelemetry {
    pub port: OutPort,
    pub speed: i16,
    pub power: i16,
    pub position: i32,
    // Raw driver flags, e.g. ["running", "stalled"]
    pub state: Vec<String>,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    NoMotors,
}
