//! CLI client for the LED device.
//!
//! Builds the simulated platform, initializes the driver, opens the
//! endpoint, performs one command, and tears everything down:
//!
//! ```bash
//! led_control on       # write '1'
//! led_control off      # write '0'
//! led_control status   # read one byte, print ON/OFF
//! ```
//!
//! Exit codes: 0 on success, 1 on runtime failure (e.g. the device could not
//! be opened), 2 on a usage error (clap).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use led_driver::config::Settings;
use led_driver::device::{LedDriver, SimDeviceHost};
use led_driver::gpio::SimGpioController;
use led_driver::logging;

#[derive(Parser)]
#[command(name = "led_control")]
#[command(about = "Control the LED device endpoint", long_about = None)]
struct Cli {
    /// Optional configuration file (defaults to config/led.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn the LED on (writes '1').
    On,
    /// Turn the LED off (writes '0').
    Off,
    /// Report whether the LED is on (reads one byte).
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load configuration")?;
    settings.validate().context("invalid configuration")?;

    if let Err(err) = logging::init_from_settings(&settings) {
        eprintln!("warning: {err}");
    }

    let host = Arc::new(SimDeviceHost::new());
    let gpio = Arc::new(SimGpioController::new(settings.gpio.line_count));

    let driver = LedDriver::initialize(host, Arc::clone(&gpio), &settings)
        .context("failed to open device")?;
    let handle = driver.open();

    let outcome = match cli.command {
        Command::On => handle.write(b"1").map(|_| ()),
        Command::Off => handle.write(b"0").map(|_| ()),
        Command::Status => {
            let mut buffer = [0u8; 1];
            handle.read(&mut buffer).map(|_| {
                let status = if buffer[0] == 1 { "ON" } else { "OFF" };
                println!("LED is currently: {status}");
            })
        }
    };

    handle.release();
    driver.teardown();

    outcome.context("device operation failed")?;
    Ok(())
}
