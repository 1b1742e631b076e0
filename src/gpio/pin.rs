//! Output pin handles.
//!
//! A consumer walks one line through three states:
//!
//! ```text
//! ReservedPin::request ──▶ ReservedPin ──into_output()──▶ OutputPin
//!        │                      │                            │
//!        ▼                      ▼                            ▼
//!   LineBusy /             release(self)                set_level /
//!   InvalidLine                                         release(self)
//! ```
//!
//! Both handle types consume `self` on release, so a double release does not
//! compile. There is deliberately no `Drop` auto-release: the reservation is
//! freed exactly once, by whoever owns the lifecycle (the device teardown or
//! an initialization unwind), never implicitly.

use std::sync::Arc;

use tracing::info;

use crate::error::GpioError;
use crate::gpio::sim::SimGpioController;
use crate::gpio::Level;

/// A line reservation whose direction has not been configured yet.
///
/// The only useful transition is [`ReservedPin::into_output`]; holding a
/// `ReservedPin` long-term is a bug in the caller's lifecycle discipline.
#[derive(Debug)]
pub struct ReservedPin {
    controller: Arc<SimGpioController>,
    line: u32,
}

impl ReservedPin {
    /// Reserve `line` exclusively for `consumer`.
    ///
    /// # Errors
    ///
    /// [`GpioError::LineBusy`] if another consumer holds the line,
    /// [`GpioError::InvalidLine`] if the identifier is out of range.
    pub fn request(
        controller: Arc<SimGpioController>,
        line: u32,
        consumer: &str,
    ) -> Result<Self, GpioError> {
        controller.try_request(line, consumer)?;
        Ok(Self { controller, line })
    }

    /// Configure the line as a digital output, driven low.
    ///
    /// On success the reservation is subsumed by the returned [`OutputPin`].
    /// On failure the reservation is handed back together with the error so
    /// the caller can release it as part of its unwind.
    pub fn into_output(self) -> Result<OutputPin, (ReservedPin, GpioError)> {
        match self.controller.configure_output(self.line) {
            Ok(()) => Ok(OutputPin {
                controller: self.controller,
                line: self.line,
            }),
            Err(err) => Err((self, err)),
        }
    }

    /// Relinquish the reservation without ever having configured the line.
    pub fn release(self) {
        self.controller.free(self.line);
    }

    /// The reserved line number.
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// A reserved line configured as a digital output.
#[derive(Debug)]
pub struct OutputPin {
    controller: Arc<SimGpioController>,
    line: u32,
}

impl OutputPin {
    /// Drive the line. Observable externally via the controller; infallible
    /// once the direction is configured, per the platform contract.
    pub fn set_level(&self, level: Level) {
        self.controller.drive(self.line, level);
    }

    /// The driven line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Relinquish the reservation.
    pub fn release(self) {
        info!(line = self.line, "releasing output pin");
        self.controller.free(self.line);
    }
}
