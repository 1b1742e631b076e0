//! # LED Character-Device Driver
//!
//! This crate exposes a single hardware output pin (an LED) as a
//! byte-oriented device endpoint: writing ASCII `'0'`/`'1'` sets the pin
//! level, reading reports the last-commanded level as a binary byte. The
//! interesting part is the device's lifecycle: how it registers with the
//! host, how its one piece of mutable state behaves under concurrent handles,
//! and how partial-initialization failures unwind deterministically.
//!
//! ## Crate Structure
//!
//! - **`config`**: strongly-typed settings loaded from TOML and environment
//!   variables via Figment, with a validation pass.
//! - **`device`**: the lifecycle manager (staged initialization with
//!   reverse-order unwind, ordered teardown), the byte-stream endpoint
//!   operations, the shared state singleton, and the simulated host
//!   registration bookkeeping.
//! - **`error`**: the centralized `LedError` taxonomy.
//! - **`gpio`**: the pin controller, with reservation and output handles over a
//!   simulated GPIO line table.
//! - **`logging`**: tracing subscriber setup driven by the configuration.
//!
//! ## Quick start
//!
//! ```
//! use led_driver::config::Settings;
//! use led_driver::device::{LedDriver, SimDeviceHost};
//! use led_driver::gpio::SimGpioController;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), led_driver::error::LedError> {
//! let settings = Settings::default();
//! let host = Arc::new(SimDeviceHost::new());
//! let gpio = Arc::new(SimGpioController::new(settings.gpio.line_count));
//!
//! let driver = LedDriver::initialize(host, Arc::clone(&gpio), &settings)?;
//! let handle = driver.open();
//!
//! handle.write(b"1")?;
//! let mut status = [0u8; 1];
//! handle.read(&mut status)?;
//! assert_eq!(status[0], 1);
//!
//! drop(handle);
//! driver.teardown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency contract
//!
//! By default nothing serializes the drive-pin/store-state pair inside
//! `write`: concurrent writers may interleave so that the reported state
//! transiently diverges from the physical line. That unguarded pair is the
//! device's documented baseline behavior. Building with the `synchronized`
//! feature closes the window with a mutex around the pair; the test suite
//! passes in both configurations.

pub mod config;
pub mod device;
pub mod error;
pub mod gpio;
pub mod logging;
