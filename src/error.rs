//! Custom error types for the driver.
//!
//! This module defines the primary error type, `LedError`, for the whole
//! crate. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the different kinds of failures the device can
//! produce, from partial-initialization unwinds to bad write payloads.
//!
//! ## Error Hierarchy
//!
//! `LedError` is an enum that consolidates the error sources of the endpoint:
//!
//! - **`ResourceAcquisition`**: initialization failed while acquiring one of
//!   the five ordered registration resources. The failed stage is carried in
//!   the variant; the resources acquired before it have already been released
//!   in reverse order by the time this error is returned.
//! - **`InvalidValue`**: a write supplied a command byte outside `'0'`/`'1'`.
//!   Recoverable; neither the reported state nor the pin was touched.
//! - **`FaultCopyingToCaller`** / **`FaultCopyingFromCaller`**: the
//!   caller-supplied buffer could not transfer a single byte. Recoverable,
//!   no state mutation.
//! - **`Config`** / **`ConfigValidation`**: configuration could not be loaded
//!   or contained values that parse but are logically invalid.
//!
//! The per-layer enums `GpioError` and `HostError` belong to the simulated
//! platform collaborators; the lifecycle manager wraps them into
//! `ResourceAcquisition` via [`StageError`] so callers see one taxonomy.
//!
//! By using `#[from]`, `LedError` can be seamlessly created from underlying
//! error types, simplifying error handling throughout the crate with the `?`
//! operator.

use crate::device::lifecycle::InitStage;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type LedResult<T> = std::result::Result<T, LedError>;

/// Central error type for the LED device endpoint.
#[derive(Error, Debug)]
pub enum LedError {
    /// Initialization failed while acquiring the named stage. All resources
    /// acquired before it were released in reverse order before returning.
    #[error("initialization failed at stage '{stage}'")]
    ResourceAcquisition {
        /// The stage whose acquisition failed.
        stage: InitStage,
        /// The platform-level failure behind it.
        #[source]
        source: StageError,
    },

    /// A write supplied a command byte other than ASCII `'0'` or `'1'`.
    #[error("invalid command byte 0x{0:02x}: expected '0' or '1'")]
    InvalidValue(u8),

    /// The caller-supplied read buffer cannot receive a single byte.
    #[error("caller buffer cannot receive the state byte")]
    FaultCopyingToCaller,

    /// The caller-supplied write buffer cannot supply a single byte.
    #[error("caller buffer cannot supply a command byte")]
    FaultCopyingFromCaller,

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Semantic configuration error caught during validation.
    #[error("configuration validation error: {0}")]
    ConfigValidation(String),
}

impl LedError {
    /// Wrap a platform-layer failure as an acquisition error for `stage`.
    pub fn acquisition(stage: InitStage, source: impl Into<StageError>) -> Self {
        Self::ResourceAcquisition {
            stage,
            source: source.into(),
        }
    }
}

/// Platform-layer failure behind a [`LedError::ResourceAcquisition`].
#[derive(Error, Debug)]
pub enum StageError {
    /// The GPIO controller rejected the request.
    #[error(transparent)]
    Gpio(#[from] GpioError),

    /// The device host rejected the request.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors produced by the GPIO controller layer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The line is already reserved by another consumer.
    #[error("GPIO line {0} is busy")]
    LineBusy(u32),

    /// The line identifier is out of range for the controller.
    #[error("GPIO line {0} is out of range")]
    InvalidLine(u32),

    /// The line could not be configured as a digital output.
    #[error("failed to configure GPIO line {0} as output")]
    DirectionFailed(u32),
}

/// Errors produced by the device host registration layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// A device with this name is still registered. Initializing twice
    /// without an intervening teardown is a programmer error.
    #[error("device name '{0}' is already registered")]
    NameInUse(String),

    /// No device number range could be allocated.
    #[error("no free device numbers for '{0}'")]
    NumbersExhausted(String),

    /// The device class could not be registered.
    #[error("failed to register class '{0}'")]
    ClassCreateFailed(String),

    /// The device node could not be created.
    #[error("failed to create node '{0}'")]
    NodeCreateFailed(String),

    /// A node was requested for a class the host does not know.
    #[error("node requested for unknown class")]
    UnknownClass,
}
