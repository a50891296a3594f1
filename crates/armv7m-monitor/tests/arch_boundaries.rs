//! Architecture boundary tests: run with `cargo test -p armv7m-monitor --test arch_boundaries`
// Architecture test file: unwrap/panic are intentional test mechanisms.
#![allow(clippy::unwrap_used, clippy::panic)]
//!
//! Layering rules:
//!   Rule 1: debug-hal must not depend on cortex-m (host-testable HAL)
//!   Rule 2: cortex-m is only pulled in by the `hardware` feature
//!   Rule 3: the default build of the backend never links the hardware module
//!
//! Manifests are embedded with `include_str!`, so a violation fails the build
//! of this test rather than slipping through review.

/// Verify that `debug-hal` has no dependency on cortex-m.
#[test]
fn debug_hal_has_no_cortex_m_dependency() {
    let manifest = include_str!("../../debug-hal/Cargo.toml");
    assert!(
        !manifest.contains("cortex-m"),
        "debug-hal must stay host-buildable: move target code to armv7m-monitor/src/hardware.rs"
    );
}

/// Verify that cortex-m is optional and only enabled by `hardware`.
#[test]
fn cortex_m_is_behind_hardware_feature() {
    let manifest = include_str!("../Cargo.toml");
    let dependency = manifest
        .lines()
        .find(|line| line.starts_with("cortex-m"))
        .unwrap();
    assert!(dependency.contains("optional = true"), "cortex-m must be optional: {dependency}");
    let hardware = manifest
        .split("hardware = [")
        .nth(1)
        .and_then(|rest| rest.split(']').next())
        .unwrap();
    assert!(hardware.contains("\"cortex-m\""), "hardware feature must enable cortex-m");
}

/// The default build must not expose the hardware backend.
#[cfg(not(feature = "hardware"))]
#[test]
fn default_build_has_no_hardware_module() {
    let lib = include_str!("../src/lib.rs");
    assert!(lib.contains("#[cfg(feature = \"hardware\")]\npub mod hardware;"));
}
