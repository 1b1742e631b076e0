//! Byte-stream endpoint operations.
//!
//! Once the driver is `Ready`, clients interact with it through
//! [`OpenHandle`]s, one per open, each a thin reference to the shared
//! endpoint. Handles carry no private state: every read and write acts on the
//! single shared [`LineState`](crate::device::state::LineState) and the one
//! output pin.
//!
//! ## Wire contract
//!
//! - `write`: only the first byte of the caller's buffer is inspected; ASCII
//!   `'1'` drives the pin high, `'0'` drives it low, anything else is
//!   rejected with no state change. On success the **full requested length**
//!   is reported as consumed even though one byte was inspected. That return
//!   value is intentional protocol behavior the status client depends on; do
//!   not "fix" it to 1.
//! - `read`: produces exactly one binary byte, `0` or `1` (not ASCII),
//!   reporting the last commanded level.
//! - No seek semantics, no chunking beyond the single byte transferred.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::device::state::LineState;
use crate::error::{LedError, LedResult};
use crate::gpio::{Level, OutputPin};

/// Endpoint internals shared by the driver and every open handle.
pub(crate) struct EndpointShared {
    /// The single piece of process-wide mutable state.
    pub(crate) state: LineState,
    /// The output pin the state mirrors. `None` only once teardown has taken
    /// it; no handle can observe that, because teardown only takes the pin
    /// when it holds the last reference.
    pin: Option<OutputPin>,
    /// Currently open handles.
    pub(crate) open_handles: AtomicU64,
    /// Total opens since initialization. Diagnostics only.
    pub(crate) total_opens: AtomicU64,
}

impl EndpointShared {
    pub(crate) fn new(pin: OutputPin, initial: Level) -> Self {
        Self {
            state: LineState::new(initial),
            pin: Some(pin),
            open_handles: AtomicU64::new(0),
            total_opens: AtomicU64::new(0),
        }
    }

    /// Drive the pin.
    pub(crate) fn drive(&self, level: Level) {
        if let Some(pin) = &self.pin {
            pin.set_level(level);
        }
    }

    /// Take the pin out for an ordered release during teardown.
    pub(crate) fn take_pin(&mut self) -> Option<OutputPin> {
        self.pin.take()
    }
}

impl Drop for EndpointShared {
    fn drop(&mut self) {
        // Backstop for the degraded case where a handle outlived teardown:
        // the reservation is still freed exactly once, when the last
        // reference goes away.
        if let Some(pin) = self.pin.take() {
            pin.release();
        }
    }
}

/// A caller's reference to the open device.
///
/// Obtained from [`LedDriver::open`](crate::device::lifecycle::LedDriver::open);
/// opening always succeeds once the driver is ready. Dropping the handle is
/// the release hook. No resource is freed per handle; it is a logged
/// lifecycle event kept symmetric with open.
pub struct OpenHandle {
    shared: Arc<EndpointShared>,
}

impl OpenHandle {
    pub(crate) fn new(shared: Arc<EndpointShared>) -> Self {
        shared.open_handles.fetch_add(1, Ordering::Relaxed);
        shared.total_opens.fetch_add(1, Ordering::Relaxed);
        info!("device opened");
        Self { shared }
    }

    /// Copy the current level into `buf[0]` as a binary `0`/`1`.
    ///
    /// Always transfers exactly one byte.
    ///
    /// # Errors
    ///
    /// [`LedError::FaultCopyingToCaller`] if the destination cannot receive a
    /// byte (empty buffer). Nothing else can fail.
    pub fn read(&self, buf: &mut [u8]) -> LedResult<usize> {
        let Some(slot) = buf.first_mut() else {
            return Err(LedError::FaultCopyingToCaller);
        };
        let level = self.shared.state.load();
        *slot = level.wire_byte();
        debug!(state = level.wire_byte(), "reading state");
        Ok(1)
    }

    /// Inspect `buf[0]` and command the corresponding level.
    ///
    /// Accepts only ASCII `'0'` and `'1'`. On success the pin is driven and
    /// the shared state updated, and the call reports the **full requested
    /// length** `buf.len()` as consumed (intentional quirk, see module docs).
    ///
    /// # Errors
    ///
    /// - [`LedError::FaultCopyingFromCaller`] if the buffer cannot supply a
    ///   byte (empty buffer); no state change.
    /// - [`LedError::InvalidValue`] for any first byte outside `'0'`/`'1'`;
    ///   no state change.
    pub fn write(&self, buf: &[u8]) -> LedResult<usize> {
        let Some(&byte) = buf.first() else {
            return Err(LedError::FaultCopyingFromCaller);
        };
        let Some(level) = Level::from_command_byte(byte) else {
            warn!(byte, "invalid input");
            return Err(LedError::InvalidValue(byte));
        };
        debug!(value = %(byte as char), "writing value");

        // Serialize the drive/store pair only when the crate is built with
        // the `synchronized` feature; the unguarded interleaving below is the
        // device's documented baseline behavior.
        #[cfg(feature = "synchronized")]
        let _gate = self.shared.state.write_gate();

        self.shared.drive(level);
        self.shared.state.store(level);
        Ok(buf.len())
    }

    /// Explicit release hook, symmetric with open. Equivalent to dropping
    /// the handle; frees nothing, the state is process-wide.
    pub fn release(self) {}
}

impl Drop for OpenHandle {
    fn drop(&mut self) {
        self.shared.open_handles.fetch_sub(1, Ordering::Relaxed);
        info!("device closed");
    }
}

impl std::fmt::Debug for OpenHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenHandle")
            .field("state", &self.shared.state)
            .finish()
    }
}
