// Zenoh bridge with watchdog
// Commands arrive as JSON on TOPIC_CMD_MOTOR and are executed immediately.
// Telemetry and health are published every tick. A motor started with `run`
// keeps spinning until stopped, so if the commanding side goes quiet the
// watchdog stops it.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::config::{CMD_TIMEOUT, LOOP_HZ, TOPIC_CMD_MOTOR, TOPIC_HEALTH, TOPIC_STATE_MOTOR};
use crate::messages::{MotorCommand, MotorTelemetry, RuntimeHealth};
use crate::motor::{state_flags, AttributeIo, ErrorKind, OutPort, TachoMotor};

pub struct Runtime<A: AttributeIo> {
    motor: TachoMotor<A>,
    running: BTreeSet<OutPort>,
    cmd_received_at: Option<Instant>,
    health: RuntimeHealth,
}

impl<A: AttributeIo> Runtime<A> {
    pub fn new(motor: TachoMotor<A>) -> Self {
        Self {
            motor,
            running: BTreeSet::new(),
            cmd_received_at: None,
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Ports started with `run` and not stopped since
    pub fn running(&self) -> impl Iterator<Item = OutPort> + '_ {
        self.running.iter().copied()
    }

    /// A command arrived within CMD_TIMEOUT of `now`
    fn cmd_fresh(&self, now: Instant) -> bool {
        self.cmd_received_at
            .is_some_and(|at| now.saturating_duration_since(at) <= CMD_TIMEOUT)
    }

    /// Process incoming command
    pub fn on_command(&mut self, cmd: MotorCommand, now: Instant) {
        info!("Received command: {:?}", &cmd);
        self.cmd_received_at = Some(now);
        self.health = RuntimeHealth::Ok;

        let port = cmd.port();
        let continuous = matches!(cmd, MotorCommand::Run { speed, .. } if speed != 0);
        match execute(&self.motor, &cmd) {
            Ok(()) if continuous => {
                self.running.insert(port);
            }
            Ok(()) => {
                if matches!(
                    cmd,
                    MotorCommand::Run { .. }
                        | MotorCommand::RunToAbsPosition { .. }
                        | MotorCommand::Stop { .. }
                        | MotorCommand::Reset { .. }
                ) {
                    self.running.remove(&port);
                }
            }
            Err(e) => {
                warn!("Command for {} failed: {}", port, e);
                if e.kind() == ErrorKind::Environment {
                    self.health = RuntimeHealth::NoMotors;
                }
            }
        }
    }

    /// Stop running motors if no command arrived within CMD_TIMEOUT
    pub fn check_watchdog(&mut self, now: Instant) {
        if self.cmd_fresh(now) {
            return;
        }

        if self.health == RuntimeHealth::Ok {
            self.health = RuntimeHealth::CmdStale;
        }
        if self.running.is_empty() {
            return;
        }

        warn!("Command stale, stopping {} motor(s)", self.running.len());
        self.stop_running();
    }

    /// Stop every tracked motor. Ports whose stop fails stay tracked so the
    /// next call retries them.
    pub fn stop_running(&mut self) {
        let ports: Vec<OutPort> = self.running.iter().copied().collect();
        for port in ports {
            match self.motor.stop(port) {
                Ok(()) => {
                    self.running.remove(&port);
                }
                Err(e) => warn!("Failed to stop {}: {}", port, e),
            }
        }
    }

    /// Telemetry for every connected port
    pub fn telemetry(&mut self, now: Instant) -> Vec<MotorTelemetry> {
        let mut out = Vec::new();
        for port in OutPort::ALL {
            match read_telemetry(&self.motor, port) {
                Ok(t) => out.push(t),
                Err(e) if e.kind() == ErrorKind::PortNotFound => {
                    debug!("No motor on {}", port)
                }
                Err(e) if e.kind() == ErrorKind::Environment => {
                    self.health = RuntimeHealth::NoMotors;
                    return out;
                }
                Err(e) => warn!("Failed to read telemetry for {}: {}", port, e),
            }
        }

        if self.health == RuntimeHealth::NoMotors {
            // Hardware came back
            self.health = if self.cmd_fresh(now) {
                RuntimeHealth::Ok
            } else {
                RuntimeHealth::CmdStale
            };
        }
        out
    }
}

/// Execute one command through the motor API
pub fn execute<A: AttributeIo>(motor: &TachoMotor<A>, cmd: &MotorCommand) -> crate::motor::Result<()> {
    match *cmd {
        MotorCommand::Run { port, speed } => motor.run(port, speed),
        MotorCommand::RunToAbsPosition { port, speed, position } => {
            motor.run_to_abs_position(port, speed, position)
        }
        MotorCommand::Stop { port } => motor.stop(port),
        MotorCommand::Reset { port } => motor.reset(port),
        MotorCommand::BrakeMode { port, enabled: true } => motor.enable_brake_mode(port),
        MotorCommand::BrakeMode { port, enabled: false } => motor.disable_brake_mode(port),
        MotorCommand::StopAction { port, action } => motor.set_stop_action(port, action),
        MotorCommand::InitializePosition { port, value } => motor.initialize_position(port, value),
    }
}

/// Telemetry for every connected port, failing on missing hardware or on
/// any unreadable attribute of a connected motor
pub fn status<A: AttributeIo>(motor: &TachoMotor<A>) -> crate::motor::Result<Vec<MotorTelemetry>> {
    motor.resolver().devices()?;
    let mut out = Vec::new();
    for port in OutPort::ALL {
        match read_telemetry(motor, port) {
            Ok(t) => out.push(t),
            Err(e) if e.kind() == ErrorKind::PortNotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

/// Read speed, power, position and state of one motor
pub fn read_telemetry<A: AttributeIo>(
    motor: &TachoMotor<A>,
    port: OutPort,
) -> crate::motor::Result<MotorTelemetry> {
    Ok(MotorTelemetry {
        port,
        speed: motor.current_speed(port)?,
        power: motor.current_power(port)?,
        position: motor.current_position(port)?,
        state: state_flags(&motor.get_state(port)?)
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn publish<A: AttributeIo>(
    runtime: &mut Runtime<A>,
    pub_state: &zenoh::pubsub::Publisher<'_>,
    pub_health: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), BoxError> {
    let telemetry = runtime.telemetry(Instant::now());
    pub_state.put(serde_json::to_string(&telemetry)?).await?;

    let health_json = serde_json::to_string(&runtime.health())?;
    pub_health.put(health_json).await?;
    Ok(())
}

pub async fn run(root: &Path) -> Result<(), BoxError> {
    info!("Using motor root {}", root.display());
    let mut runtime = Runtime::new(TachoMotor::with_root(root));

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_MOTOR).await?;
    let pub_state = session.declare_publisher(TOPIC_STATE_MOTOR).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        LOOP_HZ,
        CMD_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_CMD_MOTOR);
    info!("Publishing to: {}, {}", TOPIC_STATE_MOTOR, TOPIC_HEALTH);

    let result: Result<(), BoxError> = loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break Ok(());
            }
        }

        // 1. Drain all pending commands (non-blocking), in arrival order
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<MotorCommand>(&payload) {
                Ok(cmd) => runtime.on_command(cmd, Instant::now()),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }

        // 2. Watchdog
        runtime.check_watchdog(Instant::now());

        // 3. Publish telemetry and health
        if let Err(e) = publish(&mut runtime, &pub_state, &pub_health).await {
            break Err(e);
        }
    };

    // Leave nothing spinning, also when publishing failed
    runtime.stop_running();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::testing::{add_motor, read_back};
    use crate::motor::{Attribute, SysfsAttributes};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_watchdog_stops_running_motors() {
        let root = tempdir().unwrap();
        let dir_a = add_motor(root.path(), "motor0", OutPort::A);
        let mut rt = Runtime::new(TachoMotor::with_root(root.path()));

        let t0 = Instant::now();
        rt.on_command(MotorCommand::Run { port: OutPort::A, speed: 30 }, t0);
        assert_eq!(rt.health(), RuntimeHealth::Ok);
        assert_eq!(rt.running().collect::<Vec<_>>(), vec![OutPort::A]);

        rt.check_watchdog(t0 + CMD_TIMEOUT / 2);
        assert_eq!(read_back(&dir_a, Attribute::Command), "run-forever");

        rt.check_watchdog(t0 + CMD_TIMEOUT * 2);
        assert_eq!(read_back(&dir_a, Attribute::Command), "stop");
        assert_eq!(rt.health(), RuntimeHealth::CmdStale);
        assert_eq!(rt.running().count(), 0);
    }

    #[test]
    fn test_stop_clears_running() {
        let root = tempdir().unwrap();
        add_motor(root.path(), "motor0", OutPort::B);
        let mut rt = Runtime::new(TachoMotor::with_root(root.path()));

        let now = Instant::now();
        rt.on_command(MotorCommand::Run { port: OutPort::B, speed: -20 }, now);
        rt.on_command(MotorCommand::Stop { port: OutPort::B }, now);
        assert_eq!(rt.running().count(), 0);
    }

    #[test]
    fn test_failed_command_is_not_tracked() {
        let root = tempdir().unwrap();
        add_motor(root.path(), "motor0", OutPort::A);
        let mut rt = Runtime::new(TachoMotor::with_root(root.path()));

        rt.on_command(MotorCommand::Run { port: OutPort::C, speed: 30 }, Instant::now());
        assert_eq!(rt.running().count(), 0);
        assert_eq!(rt.health(), RuntimeHealth::Ok);
    }

    #[test]
    fn test_execute_brake_mode() {
        let root = tempdir().unwrap();
        let dir = add_motor(root.path(), "motor0", OutPort::D);
        let motor = TachoMotor::with_io(root.path(), SysfsAttributes);

        execute(&motor, &MotorCommand::BrakeMode { port: OutPort::D, enabled: true }).unwrap();
        assert_eq!(read_back(&dir, Attribute::StopCommand), "brake");

        execute(&motor, &MotorCommand::BrakeMode { port: OutPort::D, enabled: false }).unwrap();
        assert_eq!(read_back(&dir, Attribute::StopCommand), "coast");
    }

    #[test]
    fn test_telemetry_skips_unconnected_ports() {
        let root = tempdir().unwrap();
        let dir = add_motor(root.path(), "motor3", OutPort::C);
        fs::write(dir.join("speed"), "-350\n").unwrap();
        fs::write(dir.join("state"), "running ramping\n").unwrap();
        let mut rt = Runtime::new(TachoMotor::with_root(root.path()));

        let telemetry = rt.telemetry(Instant::now());
        assert_eq!(telemetry.len(), 1);
        assert_eq!(telemetry[0].port, OutPort::C);
        assert_eq!(telemetry[0].speed, -350);
        assert_eq!(telemetry[0].state, vec!["running", "ramping"]);
    }

    #[test]
    fn test_no_motors_health() {
        let root = tempdir().unwrap();
        let mut rt = Runtime::new(TachoMotor::with_root(root.path().join("absent")));

        assert!(rt.telemetry(Instant::now()).is_empty());
        assert_eq!(rt.health(), RuntimeHealth::NoMotors);
    }

    #[test]
    fn test_watchdog_retries_failed_stop() {
        let root = tempdir().unwrap();
        let dir = add_motor(root.path(), "motor0", OutPort::A);
        let mut rt = Runtime::new(TachoMotor::with_root(root.path()));

        let t0 = Instant::now();
        rt.on_command(MotorCommand::Run { port: OutPort::A, speed: 30 }, t0);

        // A directory in place of the command file makes the stop write fail
        fs::remove_file(dir.join("command")).unwrap();
        fs::create_dir(dir.join("command")).unwrap();
        rt.check_watchdog(t0 + CMD_TIMEOUT * 2);
        assert_eq!(rt.running().collect::<Vec<_>>(), vec![OutPort::A]);

        fs::remove_dir(dir.join("command")).unwrap();
        rt.check_watchdog(t0 + CMD_TIMEOUT * 4);
        assert_eq!(read_back(&dir, Attribute::Command), "stop");
        assert_eq!(rt.running().count(), 0);
    }

    #[test]
    fn test_stop_running_on_shutdown() {
        let root = tempdir().unwrap();
        let dir_b = add_motor(root.path(), "motor0", OutPort::B);
        let dir_c = add_motor(root.path(), "motor1", OutPort::C);
        let mut rt = Runtime::new(TachoMotor::with_root(root.path()));

        let now = Instant::now();
        rt.on_command(MotorCommand::Run { port: OutPort::B, speed: 40 }, now);
        rt.on_command(MotorCommand::Run { port: OutPort::C, speed: -40 }, now);

        // Commands are still fresh; shutdown stops regardless
        rt.stop_running();
        assert_eq!(read_back(&dir_b, Attribute::Command), "stop");
        assert_eq!(read_back(&dir_c, Attribute::Command), "stop");
        assert_eq!(rt.running().count(), 0);
    }

    #[test]
    fn test_health_after_hardware_returns() {
        let root = tempdir().unwrap();
        let motors = root.path().join("tacho-motor");
        let mut rt = Runtime::new(TachoMotor::with_root(&motors));

        let t0 = Instant::now();
        rt.on_command(MotorCommand::Stop { port: OutPort::A }, t0);
        assert_eq!(rt.health(), RuntimeHealth::NoMotors);

        add_motor(&motors, "motor0", OutPort::A);
        assert_eq!(rt.telemetry(t0 + CMD_TIMEOUT / 2).len(), 1);
        assert_eq!(rt.health(), RuntimeHealth::Ok);
    }

    #[test]
    fn test_health_after_hardware_returns_stale() {
        let root = tempdir().unwrap();
        let motors = root.path().join("tacho-motor");
        let mut rt = Runtime::new(TachoMotor::with_root(&motors));

        let t0 = Instant::now();
        assert!(rt.telemetry(t0).is_empty());
        assert_eq!(rt.health(), RuntimeHealth::NoMotors);

        // Never commanded
        add_motor(&motors, "motor0", OutPort::A);
        rt.telemetry(t0);
        assert_eq!(rt.health(), RuntimeHealth::CmdStale);
    }

    #[test]
    fn test_status_skips_unconnected_ports() {
        let root = tempdir().unwrap();
        add_motor(root.path(), "motor0", OutPort::D);
        let motor = TachoMotor::with_root(root.path());

        let telemetry = status(&motor).unwrap();
        assert_eq!(telemetry.len(), 1);
        assert_eq!(telemetry[0].port, OutPort::D);
    }

    #[test]
    fn test_status_reports_unreadable_attribute() {
        let root = tempdir().unwrap();
        let dir = add_motor(root.path(), "motor0", OutPort::A);
        fs::write(dir.join("position"), "garbage\n").unwrap();
        let motor = TachoMotor::with_root(root.path());

        let err = status(&motor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AttributeIo);
        assert_eq!(err.attribute(), Some(Attribute::Position));
    }

    #[test]
    fn test_status_without_hardware() {
        let root = tempdir().unwrap();
        let motor = TachoMotor::with_root(root.path());
        assert_eq!(status(&motor).unwrap_err().kind(), ErrorKind::Environment);
    }
}
