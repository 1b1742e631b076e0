//! Shared device state.
//!
//! The device owns exactly one piece of mutable state: the last commanded
//! level. It is an explicitly owned singleton shared by `Arc` between every
//! open handle, never an implicit global, so both the sharing and the absence
//! of locking stay visible and testable.
//!
//! The level lives in an `AtomicU8` with relaxed ordering: individual loads
//! and stores are atomic, but in the default build nothing orders the
//! drive-pin/store-state pair in `write` against concurrent calls. Two
//! writers can interleave so the reported state transiently diverges from the
//! physical line. That is the documented baseline contract of the device, not
//! a bug. The `synchronized` feature adds a write gate around the pair.

use std::sync::atomic::{AtomicU8, Ordering};
#[cfg(feature = "synchronized")]
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::gpio::Level;

/// The single process-wide scalar: last level commanded through the endpoint.
pub struct LineState {
    level: AtomicU8,
    #[cfg(feature = "synchronized")]
    write_gate: Mutex<()>,
}

impl LineState {
    /// Create the state with an initial level.
    pub fn new(initial: Level) -> Self {
        Self {
            level: AtomicU8::new(initial.wire_byte()),
            #[cfg(feature = "synchronized")]
            write_gate: Mutex::new(()),
        }
    }

    /// Last commanded level.
    pub fn load(&self) -> Level {
        if self.level.load(Ordering::Relaxed) == 0 {
            Level::Low
        } else {
            Level::High
        }
    }

    /// Record a newly commanded level.
    pub(crate) fn store(&self, level: Level) {
        self.level.store(level.wire_byte(), Ordering::Relaxed);
    }

    /// Gate serializing the drive-pin/store-state pair (`synchronized` builds
    /// only).
    #[cfg(feature = "synchronized")]
    pub(crate) fn write_gate(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineState").field("level", &self.load()).finish()
    }
}
