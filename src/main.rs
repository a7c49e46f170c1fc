use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ev3_motor_runtime::config::{MOTOR_ROOT, MOTOR_ROOT_ENV};
use ev3_motor_runtime::motor::{OutPort, TachoMotor};
use ev3_motor_runtime::runtime;

/// Drive EV3 tacho motors through the ev3dev sysfs interface
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Tacho-motor class directory
    #[arg(long, env = MOTOR_ROOT_ENV, default_value = MOTOR_ROOT)]
    root: PathBuf,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run until stopped (power % unregulated, speed units regulated)
    Run {
        port: OutPort,
        #[arg(allow_negative_numbers = true)]
        speed: i16,
    },
    /// Run to an absolute position and hold there
    RunTo {
        port: OutPort,
        #[arg(allow_negative_numbers = true)]
        speed: i16,
        #[arg(allow_negative_numbers = true)]
        position: i16,
    },
    /// Stop using the configured stop action
    Stop { port: OutPort },
    /// Reset the motor
    Reset { port: OutPort },
    /// Brake to a stop
    Brake { port: OutPort },
    /// Coast to a stop (disable brake mode)
    Coast { port: OutPort },
    /// Set stop action to hold
    Hold { port: OutPort },
    /// Set stop action to coast
    CoastAction { port: OutPort },
    /// Print the current speed
    Speed { port: OutPort },
    /// Print the current power
    Power { port: OutPort },
    /// Print the current position
    Position { port: OutPort },
    /// Overwrite the position counter
    SetPosition {
        port: OutPort,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
    /// Print the raw driver state
    State { port: OutPort },
    /// Print telemetry of every connected motor as JSON
    Status,
    /// Bridge motor commands and telemetry over zenoh
    Serve,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init(); // installs the subscriber globally

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let motor = TachoMotor::with_root(&cli.root);
    match cli.command {
        Cmd::Run { port, speed } => motor.run(port, speed)?,
        Cmd::RunTo { port, speed, position } => motor.run_to_abs_position(port, speed, position)?,
        Cmd::Stop { port } => motor.stop(port)?,
        Cmd::Reset { port } => motor.reset(port)?,
        Cmd::Brake { port } => motor.enable_brake_mode(port)?,
        Cmd::Coast { port } => motor.disable_brake_mode(port)?,
        Cmd::Hold { port } => motor.hold_stop_action(port)?,
        Cmd::CoastAction { port } => motor.coast_stop_action(port)?,
        Cmd::Speed { port } => println!("{}", motor.current_speed(port)?),
        Cmd::Power { port } => println!("{}", motor.current_power(port)?),
        Cmd::Position { port } => println!("{}", motor.current_position(port)?),
        Cmd::SetPosition { port, value } => motor.initialize_position(port, value)?,
        Cmd::State { port } => println!("{}", motor.get_state(port)?),
        Cmd::Status => {
            // Skips ports with nothing attached
            let telemetry = runtime::status(&motor)?;
            println!("{}", serde_json::to_string_pretty(&telemetry)?);
        }
        Cmd::Serve => runtime::run(&cli.root).await?,
    }
    Ok(())
}
