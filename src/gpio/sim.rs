//! Simulated GPIO controller.
//!
//! Provides an in-memory GPIO line table for running and testing the driver
//! without physical hardware. The controller models exactly what the pin
//! layer relies on:
//!
//! - exclusive reservation of a line by a named consumer,
//! - a direction latch that must be set before the line can be driven,
//! - an observable electrical level per line,
//! - acquisition/release accounting and direction failure injection for
//!   tests.
//!
//! All methods take `&self`; the line table lives behind a mutex so the
//! controller can be shared across handles and threads via `Arc`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::GpioError;
use crate::gpio::Level;

/// One entry in the controller's line table.
#[derive(Debug, Clone)]
struct LineSlot {
    /// Name of the consumer holding the reservation, if any.
    reserved_by: Option<String>,
    /// Whether the line has been configured as a digital output.
    output: bool,
    /// Current electrical level of the line.
    level: Level,
}

impl Default for LineSlot {
    fn default() -> Self {
        Self {
            reserved_by: None,
            output: false,
            level: Level::Low,
        }
    }
}

/// In-memory stand-in for the platform GPIO subsystem.
///
/// # Example
///
/// ```
/// use led_driver::gpio::{Level, ReservedPin, SimGpioController};
/// use std::sync::Arc;
///
/// let controller = Arc::new(SimGpioController::new(32));
/// let reserved = ReservedPin::request(Arc::clone(&controller), 7, "demo")?;
/// let pin = reserved.into_output().map_err(|(_, err)| err)?;
/// pin.set_level(Level::High);
/// assert_eq!(controller.level(7), Some(Level::High));
/// pin.release();
/// # Ok::<(), led_driver::error::GpioError>(())
/// ```
pub struct SimGpioController {
    lines: Mutex<Vec<LineSlot>>,
    requests: AtomicUsize,
    releases: AtomicUsize,
    fail_next_direction: AtomicBool,
}

impl SimGpioController {
    /// Create a controller exposing lines `0..line_count`.
    pub fn new(line_count: u32) -> Self {
        Self {
            lines: Mutex::new(vec![LineSlot::default(); line_count as usize]),
            requests: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            fail_next_direction: AtomicBool::new(false),
        }
    }

    /// Lock the line table, recovering from poisoning (the table itself is
    /// always left consistent; a panicking test thread must not wedge it).
    fn table(&self) -> MutexGuard<'_, Vec<LineSlot>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Operations used by the pin layer
    // =========================================================================

    /// Reserve `line` exclusively for `consumer`.
    pub(crate) fn try_request(&self, line: u32, consumer: &str) -> Result<(), GpioError> {
        let mut table = self.table();
        let slot = table
            .get_mut(line as usize)
            .ok_or(GpioError::InvalidLine(line))?;
        if let Some(owner) = &slot.reserved_by {
            warn!(line, owner = %owner, "line request rejected: busy");
            return Err(GpioError::LineBusy(line));
        }
        slot.reserved_by = Some(consumer.to_owned());
        self.requests.fetch_add(1, Ordering::Relaxed);
        debug!(line, consumer, "line reserved");
        Ok(())
    }

    /// Configure a reserved line as a digital output, driven low.
    pub(crate) fn configure_output(&self, line: u32) -> Result<(), GpioError> {
        if self.fail_next_direction.swap(false, Ordering::Relaxed) {
            warn!(line, "injected direction failure");
            return Err(GpioError::DirectionFailed(line));
        }
        let mut table = self.table();
        let slot = table
            .get_mut(line as usize)
            .ok_or(GpioError::InvalidLine(line))?;
        slot.output = true;
        slot.level = Level::Low;
        debug!(line, "line configured as output");
        Ok(())
    }

    /// Drive a configured output line. Infallible once the direction is set,
    /// matching the platform contract the pin layer relies on.
    pub(crate) fn drive(&self, line: u32, level: Level) {
        let mut table = self.table();
        if let Some(slot) = table.get_mut(line as usize) {
            debug_assert!(slot.output, "line driven before direction configured");
            slot.level = level;
        }
    }

    /// Relinquish the reservation on `line`.
    pub(crate) fn free(&self, line: u32) {
        let mut table = self.table();
        if let Some(slot) = table.get_mut(line as usize) {
            slot.reserved_by = None;
            slot.output = false;
        }
        self.releases.fetch_add(1, Ordering::Relaxed);
        debug!(line, "line released");
    }

    // =========================================================================
    // Observation & failure injection (tests, demo harness)
    // =========================================================================

    /// Observe the electrical level of `line`, if the line exists.
    pub fn level(&self, line: u32) -> Option<Level> {
        self.table().get(line as usize).map(|slot| slot.level)
    }

    /// Whether `line` currently holds a reservation.
    pub fn is_reserved(&self, line: u32) -> bool {
        self.table()
            .get(line as usize)
            .is_some_and(|slot| slot.reserved_by.is_some())
    }

    /// Total number of successful line reservations.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Total number of line releases.
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::Relaxed)
    }

    /// Make the next `configure_output` call fail.
    pub fn fail_next_direction(&self) {
        self.fail_next_direction.store(true, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for SimGpioController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimGpioController")
            .field("requests", &self.request_count())
            .field("releases", &self.release_count())
            .finish()
    }
}
