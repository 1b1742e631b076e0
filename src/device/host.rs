//! Simulated device host.
//!
//! In-memory stand-in for the host-OS bookkeeping that makes a device
//! addressable: device-number allocation, class registration, and node
//! creation. The lifecycle manager acquires these three resources in order
//! and releases them in reverse; this module gives it typed tokens for each,
//! plus the two things the real bookkeeping cannot offer tests:
//!
//! - **failure injection** per resource kind, so every initialization stage
//!   can be made to fail deterministically, and
//! - **accounting**: a journal of every acquisition and release, in order,
//!   so tests can assert that unwind and teardown touch exactly the right
//!   resources in exactly the right order.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::HostError;

/// Allocated device-number range (major/minor analog).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNumber {
    /// Major number identifying the driver with the host.
    pub major: u32,
    /// First minor number of the allocated range.
    pub minor: u32,
}

/// Token for a registered device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

/// Token for a created device node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// Host resource kinds, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostResource {
    /// Device-number range allocation.
    NumberRange,
    /// Device class registration.
    Class,
    /// Device node creation.
    Node,
}

#[derive(Default)]
struct HostTable {
    /// Device names with a live number allocation, by major.
    numbers: HashMap<u32, String>,
    /// Registered classes by id.
    classes: HashMap<ClassId, String>,
    /// Created nodes by id: owning class and node path.
    nodes: HashMap<NodeId, (ClassId, String)>,
    next_major: u32,
    next_class: u32,
    next_node: u32,
    /// Resource kind whose next acquisition should fail.
    fail_next: Option<HostResource>,
    /// Ordered record of every acquisition and release.
    journal: Vec<String>,
}

/// In-memory device host with registration bookkeeping.
///
/// All methods take `&self`; the registration tables live behind a mutex so
/// the host can be shared via `Arc` between the driver and the test harness.
pub struct SimDeviceHost {
    inner: Mutex<HostTable>,
}

impl SimDeviceHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HostTable::default()),
        }
    }

    fn tables(&self) -> MutexGuard<'_, HostTable> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Registration resources, in acquisition order
    // =========================================================================

    /// Allocate a device-number range for `name`.
    ///
    /// Fails fast with [`HostError::NameInUse`] if `name` still holds an
    /// allocation: initializing twice without an intervening teardown is a
    /// precondition violation, not a runtime condition to recover from.
    pub fn alloc_device_number(&self, name: &str) -> Result<DeviceNumber, HostError> {
        let mut tables = self.tables();
        if tables.fail_next == Some(HostResource::NumberRange) {
            tables.fail_next = None;
            warn!(name, "injected device-number allocation failure");
            return Err(HostError::NumbersExhausted(name.to_owned()));
        }
        if tables.numbers.values().any(|n| n == name) {
            return Err(HostError::NameInUse(name.to_owned()));
        }
        let major = tables.next_major;
        tables.next_major += 1;
        tables.numbers.insert(major, name.to_owned());
        tables.journal.push(format!("alloc_number:{name}"));
        debug!(name, major, "device number range allocated");
        Ok(DeviceNumber { major, minor: 0 })
    }

    /// Release a device-number range.
    pub fn release_device_number(&self, number: DeviceNumber) {
        let mut tables = self.tables();
        if let Some(name) = tables.numbers.remove(&number.major) {
            tables.journal.push(format!("release_number:{name}"));
            debug!(name = %name, major = number.major, "device number range released");
        }
    }

    /// Register a device class under `name`.
    pub fn create_class(&self, name: &str) -> Result<ClassId, HostError> {
        let mut tables = self.tables();
        if tables.fail_next == Some(HostResource::Class) {
            tables.fail_next = None;
            warn!(name, "injected class registration failure");
            return Err(HostError::ClassCreateFailed(name.to_owned()));
        }
        if tables.classes.values().any(|n| n == name) {
            return Err(HostError::NameInUse(name.to_owned()));
        }
        let id = ClassId(tables.next_class);
        tables.next_class += 1;
        tables.classes.insert(id, name.to_owned());
        tables.journal.push(format!("create_class:{name}"));
        debug!(name, "device class registered");
        Ok(id)
    }

    /// Destroy a registered class.
    pub fn destroy_class(&self, class: ClassId) {
        let mut tables = self.tables();
        if let Some(name) = tables.classes.remove(&class) {
            tables.journal.push(format!("destroy_class:{name}"));
            debug!(name = %name, "device class destroyed");
        }
    }

    /// Create the node that makes the device addressable as `/dev/{name}`.
    pub fn create_node(
        &self,
        class: ClassId,
        _number: DeviceNumber,
        name: &str,
    ) -> Result<NodeId, HostError> {
        let mut tables = self.tables();
        if tables.fail_next == Some(HostResource::Node) {
            tables.fail_next = None;
            warn!(name, "injected node creation failure");
            return Err(HostError::NodeCreateFailed(name.to_owned()));
        }
        if !tables.classes.contains_key(&class) {
            return Err(HostError::UnknownClass);
        }
        let id = NodeId(tables.next_node);
        tables.next_node += 1;
        let path = format!("/dev/{name}");
        tables.nodes.insert(id, (class, path.clone()));
        tables.journal.push(format!("create_node:{name}"));
        debug!(name, path = %path, "device node created");
        Ok(id)
    }

    /// Destroy a device node.
    pub fn destroy_node(&self, node: NodeId) {
        let mut tables = self.tables();
        if let Some((_, path)) = tables.nodes.remove(&node) {
            tables.journal.push(format!("destroy_node:{path}"));
            debug!(path = %path, "device node destroyed");
        }
    }

    // =========================================================================
    // Observation & failure injection (tests, demo harness)
    // =========================================================================

    /// Make the next acquisition of `resource` fail.
    pub fn fail_next(&self, resource: HostResource) {
        self.tables().fail_next = Some(resource);
    }

    /// Node path for a live node, if it exists.
    pub fn node_path(&self, node: NodeId) -> Option<String> {
        self.tables().nodes.get(&node).map(|(_, path)| path.clone())
    }

    /// Numbers of live registrations: (number ranges, classes, nodes).
    pub fn live_counts(&self) -> (usize, usize, usize) {
        let tables = self.tables();
        (
            tables.numbers.len(),
            tables.classes.len(),
            tables.nodes.len(),
        )
    }

    /// Ordered journal of every acquisition and release so far.
    ///
    /// Entries look like `alloc_number:led_driver` or `destroy_node:/dev/led_driver`.
    pub fn journal(&self) -> Vec<String> {
        self.tables().journal.clone()
    }
}

impl Default for SimDeviceHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimDeviceHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (numbers, classes, nodes) = self.live_counts();
        f.debug_struct("SimDeviceHost")
            .field("numbers", &numbers)
            .field("classes", &classes)
            .field("nodes", &nodes)
            .finish()
    }
}
