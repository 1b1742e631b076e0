//! Configuration loading and override tests.

use std::io::Write as _;

use serial_test::serial;

use led_driver::config::Settings;

#[test]
fn missing_file_yields_usable_defaults() {
    let settings = Settings::load_from("does/not/exist.toml").expect("load");
    settings.validate().expect("defaults validate");
    assert_eq!(settings.device.device_name, "led_driver");
    assert_eq!(settings.gpio.line, 118);
}

#[test]
fn file_values_override_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
        [device]
        device_name = "panel_led"

        [gpio]
        line = 7
        line_count = 16
    "#
    )
    .expect("write config");

    let settings = Settings::load_from(file.path()).expect("load");
    settings.validate().expect("validate");
    assert_eq!(settings.device.device_name, "panel_led");
    assert_eq!(settings.device.class_name, "led_class");
    assert_eq!(settings.gpio.line, 7);
    assert_eq!(settings.gpio.line_count, 16);
}

#[test]
#[serial]
fn environment_overrides_the_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
        [gpio]
        line = 7
        line_count = 16
    "#
    )
    .expect("write config");

    std::env::set_var("LED_DRIVER_GPIO__LINE", "3");
    let settings = Settings::load_from(file.path()).expect("load");
    std::env::remove_var("LED_DRIVER_GPIO__LINE");

    assert_eq!(settings.gpio.line, 3);
    assert_eq!(settings.gpio.line_count, 16);
}

#[test]
#[serial]
fn environment_alone_is_sufficient() {
    std::env::set_var("LED_DRIVER_APPLICATION__LOG_LEVEL", "debug");
    let settings = Settings::load_from("does/not/exist.toml").expect("load");
    std::env::remove_var("LED_DRIVER_APPLICATION__LOG_LEVEL");

    settings.validate().expect("validate");
    assert_eq!(settings.application.log_level, "debug");
}

#[test]
fn out_of_range_line_fails_validation() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
        [gpio]
        line = 32
        line_count = 8
    "#
    )
    .expect("write config");

    let settings = Settings::load_from(file.path()).expect("load");
    assert!(settings.validate().is_err());
}
