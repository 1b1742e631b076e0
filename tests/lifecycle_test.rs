//! Integration tests for staged initialization, unwind, and teardown.

use std::sync::Arc;

use led_driver::config::Settings;
use led_driver::device::host::HostResource;
use led_driver::device::{InitStage, LedDriver, SimDeviceHost};
use led_driver::error::LedError;
use led_driver::gpio::{Level, ReservedPin, SimGpioController};

/// Helper to create test settings on a small controller.
fn test_settings(line: u32) -> Settings {
    let toml_str = format!(
        r#"
        [device]
        device_name = "led_driver"
        class_name = "led_class"

        [gpio]
        line = {line}
        line_count = 8
    "#
    );
    toml::from_str(&toml_str).expect("failed to parse test settings")
}

fn test_rig(line: u32) -> (Arc<SimDeviceHost>, Arc<SimGpioController>, Settings) {
    let settings = test_settings(line);
    let host = Arc::new(SimDeviceHost::new());
    let gpio = Arc::new(SimGpioController::new(settings.gpio.line_count));
    (host, gpio, settings)
}

fn failed_stage(err: &LedError) -> InitStage {
    match err {
        LedError::ResourceAcquisition { stage, .. } => *stage,
        other => panic!("expected ResourceAcquisition, got {other:?}"),
    }
}

#[test]
fn initialize_then_teardown_leaves_no_resource_reserved() {
    let (host, gpio, settings) = test_rig(3);

    let driver =
        LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).expect("init");
    driver.teardown();

    // Acquisition count == release count for every resource type.
    assert_eq!(host.live_counts(), (0, 0, 0));
    assert_eq!(gpio.request_count(), 1);
    assert_eq!(gpio.release_count(), 1);
    assert!(!gpio.is_reserved(3));
}

#[test]
fn teardown_releases_in_strict_reverse_order() {
    let (host, gpio, settings) = test_rig(3);

    let driver =
        LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).expect("init");
    driver.teardown();

    assert_eq!(
        host.journal(),
        vec![
            "alloc_number:led_driver",
            "create_class:led_class",
            "create_node:led_driver",
            "destroy_node:/dev/led_driver",
            "destroy_class:led_class",
            "release_number:led_driver",
        ]
    );
}

#[test]
fn teardown_forces_the_pin_low_first() {
    let (host, gpio, settings) = test_rig(2);

    let driver = LedDriver::initialize(host, Arc::clone(&gpio), &settings).expect("init");
    let handle = driver.open();
    handle.write(b"1").expect("write");
    assert_eq!(gpio.level(2), Some(Level::High));

    drop(handle);
    driver.teardown();
    assert_eq!(gpio.level(2), Some(Level::Low));
}

#[test]
fn failure_at_number_range_touches_nothing() {
    let (host, gpio, settings) = test_rig(0);
    host.fail_next(HostResource::NumberRange);

    let err = LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).unwrap_err();
    assert_eq!(failed_stage(&err), InitStage::NumberRange);
    assert!(host.journal().is_empty());
    assert_eq!(gpio.request_count(), 0);
}

#[test]
fn failure_at_class_unwinds_the_number_range() {
    let (host, gpio, settings) = test_rig(0);
    host.fail_next(HostResource::Class);

    let err = LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).unwrap_err();
    assert_eq!(failed_stage(&err), InitStage::NodeClass);
    assert_eq!(
        host.journal(),
        vec!["alloc_number:led_driver", "release_number:led_driver"]
    );
    assert_eq!(host.live_counts(), (0, 0, 0));
    assert_eq!(gpio.request_count(), 0);
}

#[test]
fn failure_at_node_unwinds_class_then_number() {
    let (host, gpio, settings) = test_rig(0);
    host.fail_next(HostResource::Node);

    let err = LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).unwrap_err();
    assert_eq!(failed_stage(&err), InitStage::Node);
    assert_eq!(
        host.journal(),
        vec![
            "alloc_number:led_driver",
            "create_class:led_class",
            "destroy_class:led_class",
            "release_number:led_driver",
        ]
    );
    assert_eq!(host.live_counts(), (0, 0, 0));
    assert_eq!(gpio.request_count(), 0);
}

#[test]
fn failure_at_pin_reservation_unwinds_all_host_resources() {
    let (host, gpio, settings) = test_rig(5);

    // Another consumer already owns the line.
    let blocker = ReservedPin::request(Arc::clone(&gpio), 5, "blocker").expect("blocker");

    let err = LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).unwrap_err();
    assert_eq!(failed_stage(&err), InitStage::PinReservation);
    assert_eq!(
        host.journal(),
        vec![
            "alloc_number:led_driver",
            "create_class:led_class",
            "create_node:led_driver",
            "destroy_node:/dev/led_driver",
            "destroy_class:led_class",
            "release_number:led_driver",
        ]
    );
    assert_eq!(host.live_counts(), (0, 0, 0));
    // Only the blocker's reservation was ever granted, and it is untouched.
    assert_eq!(gpio.request_count(), 1);
    assert_eq!(gpio.release_count(), 0);
    assert!(gpio.is_reserved(5));

    blocker.release();
}

#[test]
fn failure_at_direction_config_unwinds_pin_and_host_resources() {
    let (host, gpio, settings) = test_rig(4);
    gpio.fail_next_direction();

    let err = LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).unwrap_err();
    assert_eq!(failed_stage(&err), InitStage::DirectionConfig);
    assert_eq!(host.live_counts(), (0, 0, 0));
    assert_eq!(gpio.request_count(), 1);
    assert_eq!(gpio.release_count(), 1);
    assert!(!gpio.is_reserved(4));
}

#[test]
fn double_initialize_without_teardown_fails_fast() {
    let (host, gpio, settings) = test_rig(1);

    let driver =
        LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).expect("first init");

    let err = LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).unwrap_err();
    assert_eq!(failed_stage(&err), InitStage::NumberRange);

    driver.teardown();
}

#[test]
fn reinitialize_after_teardown_works() {
    let (host, gpio, settings) = test_rig(1);

    let first =
        LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings).expect("first init");
    first.teardown();

    let second = LedDriver::initialize(Arc::clone(&host), Arc::clone(&gpio), &settings)
        .expect("second init");
    second.teardown();

    assert_eq!(host.live_counts(), (0, 0, 0));
    assert_eq!(gpio.request_count(), 2);
    assert_eq!(gpio.release_count(), 2);
}
