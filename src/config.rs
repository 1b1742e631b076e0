//! Configuration loading and validation.
//!
//! Strongly-typed settings loaded with Figment from:
//! 1. a TOML file (`config/led.toml` by default), then
//! 2. environment variables prefixed with `LED_DRIVER_` (section and key
//!    separated by a double underscore, e.g. `LED_DRIVER_GPIO__LINE=7`).
//!
//! Every field has a default, so a missing file yields a usable
//! configuration. Values that parse but are logically invalid are caught by
//! [`Settings::validate`].
//!
//! # Example
//! ```no_run
//! use led_driver::config::Settings;
//!
//! # fn main() -> Result<(), led_driver::error::LedError> {
//! let settings = Settings::load()?;
//! settings.validate()?;
//! println!("driving GPIO line {}", settings.gpio.line);
//! # Ok(())
//! # }
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LedError, LedResult};

/// Default configuration file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/led.toml";

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application-level settings.
    #[serde(default)]
    pub application: ApplicationSettings,
    /// Device registration names.
    #[serde(default)]
    pub device: DeviceSettings,
    /// GPIO controller and line selection.
    #[serde(default)]
    pub gpio: GpioSettings,
}

/// Application-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// Application name used in logs.
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Names under which the device registers with the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Device (and node) name.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// Device class name.
    #[serde(default = "default_class_name")]
    pub class_name: String,
}

/// GPIO controller shape and the line wired to the LED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpioSettings {
    /// Line driving the LED.
    #[serde(default = "default_line")]
    pub line: u32,
    /// Number of lines the simulated controller exposes.
    #[serde(default = "default_line_count")]
    pub line_count: u32,
}

fn default_app_name() -> String {
    "led-driver".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_device_name() -> String {
    "led_driver".to_owned()
}

fn default_class_name() -> String {
    "led_class".to_owned()
}

// PD22 on the reference board.
fn default_line() -> u32 {
    118
}

fn default_line_count() -> u32 {
    256
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            class_name: default_class_name(),
        }
    }
}

impl Default for GpioSettings {
    fn default() -> Self {
        Self {
            line: default_line(),
            line_count: default_line_count(),
        }
    }
}

impl Settings {
    /// Load configuration from the default file and environment variables.
    ///
    /// Environment variables override the file with prefix `LED_DRIVER_`,
    /// e.g. `LED_DRIVER_APPLICATION__LOG_LEVEL=debug`.
    pub fn load() -> LedResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path plus the environment.
    pub fn load_from<P: AsRef<Path>>(path: P) -> LedResult<Self> {
        let settings = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("LED_DRIVER_").split("__"))
            .extract()?;
        Ok(settings)
    }

    /// Validate configuration after loading.
    ///
    /// # Errors
    ///
    /// [`LedError::ConfigValidation`] naming the offending value.
    pub fn validate(&self) -> LedResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(LedError::ConfigValidation(format!(
                "invalid log_level '{}': must be one of {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        for (field, value) in [
            ("device_name", &self.device.device_name),
            ("class_name", &self.device.class_name),
        ] {
            if value.is_empty() {
                return Err(LedError::ConfigValidation(format!("{field} must not be empty")));
            }
            if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(LedError::ConfigValidation(format!(
                    "invalid {field} '{value}': use alphanumerics and underscores"
                )));
            }
        }

        if self.gpio.line_count == 0 {
            return Err(LedError::ConfigValidation(
                "gpio.line_count must be at least 1".to_owned(),
            ));
        }
        if self.gpio.line >= self.gpio.line_count {
            return Err(LedError::ConfigValidation(format!(
                "gpio.line {} is outside the controller's {} lines",
                self.gpio.line, self.gpio.line_count
            )));
        }

        Ok(())
    }
}
