// Device root, timeouts, topics
use std::time::Duration;

// Class directory holding one subdirectory per enumerated tacho motor
pub const MOTOR_ROOT: &str = "/sys/class/tacho-motor";

// Environment variable overriding MOTOR_ROOT for the CLI
pub const MOTOR_ROOT_ENV: &str = "EV3_MOTOR_ROOT";

// Runtime loop frequency (telemetry publish rate)
pub const LOOP_HZ: u64 = 10;

// Motors started with `run` are stopped after this long without a command
pub const CMD_TIMEOUT: Duration = Duration::from_millis(500);

// Zenoh topics
pub const TOPIC_CMD_MOTOR: &str = "ev3/cmd/motor"; // commands
pub const TOPIC_STATE_MOTOR: &str = "ev3/state/motor"; // telemetry
pub const TOPIC_HEALTH: &str = "ev3/state/health"; // health status
