// Motor diagnostic: READ-ONLY check of connected tacho motors
//
// This tool does NOT write any attribute - it's completely safe.
// Use this first before running motor_test.
//
// Usage: cargo run --example motor_diagnostic -- [root]
// Example: cargo run --example motor_diagnostic -- /sys/class/tacho-motor

use ev3_motor_runtime::config::MOTOR_ROOT;
use ev3_motor_runtime::motor::{state_flags, Attribute, AttributeIo, OutPort, SysfsAttributes, TachoMotor};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    // Get root from args or use default
    let root = std::env::args().nth(1).unwrap_or_else(|| MOTOR_ROOT.to_string());

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║             EV3 Motor Diagnostic (READ-ONLY)                 ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  This tool only READS attributes - no writes, no movement    ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Motor root: {}", root);
    println!();

    let motor = TachoMotor::with_root(&root);

    // List devices
    println!("Step 1: Listing devices...");
    let devices = match motor.resolver().devices() {
        Ok(devices) => devices,
        Err(e) => {
            println!("  ✗ {}", e);
            println!();
            println!("Troubleshooting:");
            println!("  - Check the motor cables are plugged into output ports A-D");
            println!("  - Verify the tacho-motor driver is loaded (ev3dev kernel)");
            return Err(e.into());
        }
    };
    for dir in &devices {
        match SysfsAttributes.read_attribute(dir, Attribute::Address) {
            Ok(address) => println!("  ✓ {} -> {}", dir.display(), address),
            Err(e) => println!("  ✗ {}: {}", dir.display(), e),
        }
    }
    println!();

    // Read telemetry from each port
    println!("Step 2: Reading motor attributes...");
    println!();

    for port in OutPort::ALL {
        println!("  === Port {} ===", port);

        if let Err(e) = motor.device(port) {
            println!("    {}", e);
            println!();
            continue;
        }

        match motor.current_speed(port) {
            Ok(speed) => println!("    Speed:    {}", speed),
            Err(e) => println!("    Speed:    ERROR - {}", e),
        }
        match motor.current_power(port) {
            Ok(power) => println!("    Power:    {}%", power),
            Err(e) => println!("    Power:    ERROR - {}", e),
        }
        match motor.current_position(port) {
            Ok(pos) => println!("    Position: {}", pos),
            Err(e) => println!("    Position: ERROR - {}", e),
        }
        match motor.get_state(port) {
            Ok(state) if state.is_empty() => println!("    State:    (idle)"),
            Ok(state) => println!("    State:    {:?}", state_flags(&state)),
            Err(e) => println!("    State:    ERROR - {}", e),
        }

        println!();
    }

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Diagnostic Complete                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Speed and power should be 0 while motors are stationary.");
    println!();
    println!("Next step: Run 'cargo run --example motor_test -- <port>' with the motor free to spin");

    Ok(())
}
