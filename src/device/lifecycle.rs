//! Device lifecycle: staged initialization, teardown, unwind.
//!
//! Initialization acquires five resources in a fixed order and teardown
//! releases them in the exact reverse order:
//!
//! ```text
//! initialize            teardown
//! ──────────▶           ◀──────────
//! 1. device number      4. release number range
//! 2. device class       3. destroy class
//! 3. device node        2. destroy node
//! 4. pin reservation    1. free pin           (after forcing it low)
//! 5. output direction      (no separate release)
//! ```
//!
//! When acquisition fails at stage k, exactly the resources acquired at
//! stages 1..k-1 are released, newest first, before the error is returned;
//! the host is never left partially registered. The unwind is structural:
//! each acquired resource pushes a token onto a stack, a failure pops and
//! releases the stack, and success commits the tokens into the driver value.
//!
//! Both `initialize` and `teardown` move the driver by value, so
//! double-initialize of one driver and double-teardown do not compile;
//! re-registering a name the host still knows fails fast with a precondition
//! error from the host layer.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::Settings;
use crate::device::endpoint::{EndpointShared, OpenHandle};
use crate::device::host::{ClassId, DeviceNumber, NodeId, SimDeviceHost};
use crate::error::{LedError, LedResult, StageError};
use crate::gpio::{Level, ReservedPin, SimGpioController};

/// The five ordered initialization stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    /// Device-number range allocation.
    NumberRange,
    /// Device class registration.
    NodeClass,
    /// Device node creation.
    Node,
    /// Exclusive GPIO line reservation.
    PinReservation,
    /// Configuring the reserved line as an output.
    DirectionConfig,
}

impl InitStage {
    /// Human-readable stage name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NumberRange => "device number range",
            Self::NodeClass => "device class",
            Self::Node => "device node",
            Self::PinReservation => "pin reservation",
            Self::DirectionConfig => "output direction",
        }
    }
}

impl std::fmt::Display for InitStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Token for one acquired host resource, held on the unwind stack until the
/// driver commits.
enum Acquired {
    NumberRange(DeviceNumber),
    NodeClass(ClassId),
    Node(NodeId),
}

impl Acquired {
    fn release(self, host: &SimDeviceHost) {
        match self {
            Self::NumberRange(number) => host.release_device_number(number),
            Self::NodeClass(class) => host.destroy_class(class),
            Self::Node(node) => host.destroy_node(node),
        }
    }
}

/// A fully initialized LED device, `Ready` for endpoint traffic.
///
/// Holds the registration tokens and the configured pin; consuming it with
/// [`LedDriver::teardown`] is the only way to give them back.
pub struct LedDriver {
    host: Arc<SimDeviceHost>,
    number: DeviceNumber,
    class: ClassId,
    node: NodeId,
    shared: Arc<EndpointShared>,
}

impl LedDriver {
    /// Acquire the five registration resources in order and return a ready
    /// driver.
    ///
    /// # Errors
    ///
    /// [`LedError::ResourceAcquisition`] naming the failed stage. By the time
    /// the error is returned, every resource acquired before that stage has
    /// been released in reverse order.
    pub fn initialize(
        host: Arc<SimDeviceHost>,
        gpio: Arc<SimGpioController>,
        settings: &Settings,
    ) -> LedResult<Self> {
        let device_name = settings.device.device_name.as_str();
        let class_name = settings.device.class_name.as_str();
        let line = settings.gpio.line;
        info!(device_name, class_name, line, "initializing LED driver");

        let mut unwind: Vec<Acquired> = Vec::with_capacity(3);

        let number = match host.alloc_device_number(device_name) {
            Ok(number) => number,
            Err(err) => return Err(Self::unwound(&host, unwind, InitStage::NumberRange, err)),
        };
        unwind.push(Acquired::NumberRange(number));

        let class = match host.create_class(class_name) {
            Ok(class) => class,
            Err(err) => return Err(Self::unwound(&host, unwind, InitStage::NodeClass, err)),
        };
        unwind.push(Acquired::NodeClass(class));

        let node = match host.create_node(class, number, device_name) {
            Ok(node) => node,
            Err(err) => return Err(Self::unwound(&host, unwind, InitStage::Node, err)),
        };
        unwind.push(Acquired::Node(node));

        let reserved = match ReservedPin::request(gpio, line, device_name) {
            Ok(reserved) => reserved,
            Err(err) => return Err(Self::unwound(&host, unwind, InitStage::PinReservation, err)),
        };

        let pin = match reserved.into_output() {
            Ok(pin) => pin,
            Err((reserved, err)) => {
                // The reservation is the newest resource; free it first,
                // then pop the host stack.
                reserved.release();
                return Err(Self::unwound(&host, unwind, InitStage::DirectionConfig, err));
            }
        };

        info!("driver initialized successfully");
        Ok(Self {
            host,
            number,
            class,
            node,
            shared: Arc::new(EndpointShared::new(pin, Level::Low)),
        })
    }

    /// Release everything on the unwind stack, newest first, and produce the
    /// acquisition error for `stage`.
    fn unwound(
        host: &SimDeviceHost,
        mut unwind: Vec<Acquired>,
        stage: InitStage,
        source: impl Into<StageError>,
    ) -> LedError {
        error!(stage = stage.name(), "initialization failed, unwinding");
        while let Some(acquired) = unwind.pop() {
            acquired.release(host);
        }
        LedError::acquisition(stage, source)
    }

    /// Open the device. Always succeeds once the driver is ready.
    pub fn open(&self) -> OpenHandle {
        OpenHandle::new(Arc::clone(&self.shared))
    }

    /// Handles currently open. Diagnostics only.
    pub fn open_handles(&self) -> u64 {
        self.shared.open_handles.load(Ordering::Relaxed)
    }

    /// Total opens since initialization. Diagnostics only.
    pub fn open_count(&self) -> u64 {
        self.shared.total_opens.load(Ordering::Relaxed)
    }

    /// Last level commanded through the endpoint.
    pub fn current_level(&self) -> Level {
        self.shared.state.load()
    }

    /// Tear the device down: force the pin low, then release the resources
    /// in strict reverse order of acquisition.
    ///
    /// Consumes the driver; open handles keep their shared state but the
    /// registration and the pin reservation are gone. The caller is expected
    /// to drop handles before tearing down.
    pub fn teardown(self) {
        info!("tearing down LED driver");

        // First action, regardless of prior state: force the pin low.
        self.shared.drive(Level::Low);
        self.shared.state.store(Level::Low);

        // Then release in reverse order of acquisition. The direction latch
        // has no separate release; freeing the pin clears it.
        let Self {
            host,
            number,
            class,
            node,
            shared,
        } = self;
        match Arc::try_unwrap(shared) {
            Ok(mut endpoint) => {
                if let Some(pin) = endpoint.take_pin() {
                    pin.release();
                }
            }
            Err(shared) => {
                // Degraded path: a handle outlived teardown. The shared
                // endpoint's drop backstop frees the reservation when the
                // last handle goes away.
                error!(
                    open_handles = shared.open_handles.load(Ordering::Relaxed),
                    "teardown with handles still open"
                );
                drop(shared);
            }
        }
        host.destroy_node(node);
        host.destroy_class(class);
        host.release_device_number(number);

        info!("driver unloaded");
    }
}

impl std::fmt::Debug for LedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedDriver")
            .field("number", &self.number)
            .field("level", &self.current_level())
            .finish()
    }
}
