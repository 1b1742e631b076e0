//! Device lifecycle and byte-stream endpoint.
//!
//! The device side of the crate has three tiers, mirrored by its submodules:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  lifecycle::LedDriver                       │
//! │  initialize: number range → class → node → pin → direction  │
//! │  teardown:   pin low, then release in strict reverse order  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  endpoint::OpenHandle                       │
//! │  open / read / write / release over the shared LineState    │
//! ├─────────────────────────────────────────────────────────────┤
//! │        host::SimDeviceHost   +   gpio::SimGpioController    │
//! │  registration bookkeeping        line reservation & levels  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **`host`**: the host-OS registration collaborator (device numbers,
//!   classes, nodes) with failure injection and accounting.
//! - **`state`**: the single piece of process-wide mutable state, shared by
//!   every open handle.
//! - **`endpoint`**: the four byte-stream operations bound to the pin.
//! - **`lifecycle`**: ordered acquisition with reverse-order unwind, and
//!   ordered teardown.

pub mod endpoint;
pub mod host;
pub mod lifecycle;
pub mod state;

pub use endpoint::OpenHandle;
pub use host::SimDeviceHost;
pub use lifecycle::{InitStage, LedDriver};
pub use state::LineState;
