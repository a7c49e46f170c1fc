// Keyboard teleop for two motors (differential drive on ports B and C)
// W/S forward/back, A/D turn, R/F speed, Space stop, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ev3_motor_runtime::config::TOPIC_CMD_MOTOR;
use ev3_motor_runtime::messages::MotorCommand;
use ev3_motor_runtime::motor::OutPort;
use std::time::{Duration, Instant};
use tracing::info;

const LEFT: OutPort = OutPort::B;
const RIGHT: OutPort = OutPort::C;
const SPEEDS: [i16; 3] = [20, 50, 90]; // percent power
const INPUT_TIMEOUT_MS: u64 = 150; // Stop after this much time with no input
const PUBLISH_PERIOD: Duration = Duration::from_millis(100); // keeps the runtime watchdog fed

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_MOTOR).await?;

    info!("Controls: W/S=drive, A/D=turn, R/F=speed, Space=stop, Q=quit");
    info!("Speed: LOW");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    // Leave the motors stopped
    for port in [LEFT, RIGHT] {
        publish(&publisher, &MotorCommand::Stop { port }).await?;
    }

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;

    // (left, right) power
    let mut drive = (0i16, 0i16);
    let mut last_movement_input = Instant::now();
    let mut last_publish = Instant::now();
    let mut was_moving = false;

    loop {
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                let speed = SPEEDS[speed_idx];

                match code {
                    KeyCode::Char('w') if pressed => {
                        drive = (speed, speed);
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('s') if pressed => {
                        drive = (-speed, -speed);
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('a') if pressed => {
                        drive = (-speed, speed);
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char('d') if pressed => {
                        drive = (speed, -speed);
                        last_movement_input = Instant::now();
                    }
                    KeyCode::Char(' ') if pressed => drive = (0, 0),

                    // Speed control
                    KeyCode::Char('r') if pressed => {
                        speed_idx = (speed_idx + 1).min(2);
                        print_speed(speed_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        print_speed(speed_idx);
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            drive = (0, 0);
        }

        let moving = drive != (0, 0);
        if moving && last_publish.elapsed() >= PUBLISH_PERIOD {
            publish(publisher, &MotorCommand::Run { port: LEFT, speed: drive.0 }).await?;
            publish(publisher, &MotorCommand::Run { port: RIGHT, speed: drive.1 }).await?;
            last_publish = Instant::now();
        } else if !moving && was_moving {
            publish(publisher, &MotorCommand::Stop { port: LEFT }).await?;
            publish(publisher, &MotorCommand::Stop { port: RIGHT }).await?;
        }
        was_moving = moving;
    }

    Ok(())
}

async fn publish(
    publisher: &zenoh::pubsub::Publisher<'_>,
    cmd: &MotorCommand,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    publisher.put(serde_json::to_string(cmd)?).await?;
    Ok(())
}

fn print_speed(idx: usize) {
    let label = ["LOW", "MED", "HIGH"][idx];
    info!("Speed: {}", label);
}
