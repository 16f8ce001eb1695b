//! In-crate tests for lifecycle orchestration internals.

mod wait;

use std::time::Duration;

use crate::client::StratusClient;
use crate::config::StratusConfig;
use crate::lifecycle::{LifecycleError, MachineLifecycle, patch_from};
use crate::machine::UpdateRequest;

/// Configuration pointing at a port nothing listens on; tests that reach
/// the network are expected not to.
pub(super) fn dummy_config() -> StratusConfig {
    StratusConfig {
        account: String::from("acme"),
        user: String::from("alice"),
        password: String::from("hunter2"),
        group: String::from("default"),
        zone: String::from("york"),
        api_url: String::from("http://127.0.0.1:9"),
        auth_url: String::from("http://127.0.0.1:9"),
    }
}

pub(super) fn fast_lifecycle() -> MachineLifecycle {
    MachineLifecycle::new(StratusClient::new(dummy_config()))
        .with_poll_interval(Duration::from_millis(1))
        .with_wait_timeout(Duration::from_millis(50))
}

#[test]
fn resize_alone_forces_a_power_cycle() {
    let patch = patch_from(&UpdateRequest {
        cores: Some(2),
        memory: Some(8192),
        ..UpdateRequest::default()
    })
    .unwrap_or_else(|err| panic!("resize should build a patch: {err}"));

    assert_eq!(patch.cores, Some(2));
    assert_eq!(patch.memory, Some(8192));
    assert_eq!(patch.power_on, Some(false));
    assert_eq!(patch.autoreboot_on, Some(true));
}

#[test]
fn explicit_power_intent_wins_over_the_resize_rule() {
    let patch = patch_from(&UpdateRequest {
        cores: Some(2),
        memory: Some(8192),
        power_on: Some(true),
        reboot: None,
    })
    .unwrap_or_else(|err| panic!("resize should build a patch: {err}"));

    assert_eq!(patch.power_on, Some(true));
    assert_eq!(patch.autoreboot_on, Some(true));
}

#[test]
fn single_sided_resize_derives_the_other_side() {
    let patch = patch_from(&UpdateRequest {
        memory: Some(8192),
        ..UpdateRequest::default()
    })
    .unwrap_or_else(|err| panic!("memory-only resize should build a patch: {err}"));

    assert_eq!(patch.cores, Some(2));
    assert_eq!(patch.memory, Some(8192));
}

#[test]
fn power_only_updates_touch_no_capacity_fields() {
    let patch = patch_from(&UpdateRequest {
        power_on: Some(true),
        reboot: Some(false),
        ..UpdateRequest::default()
    })
    .unwrap_or_else(|err| panic!("power update should build a patch: {err}"));

    assert_eq!(patch.cores, None);
    assert_eq!(patch.memory, None);
    assert_eq!(patch.power_on, Some(true));
    assert_eq!(patch.autoreboot_on, Some(false));
}

#[test]
fn empty_updates_build_an_empty_patch() {
    let patch = patch_from(&UpdateRequest::default())
        .unwrap_or_else(|err| panic!("empty update should build a patch: {err}"));
    assert_eq!(patch.cores, None);
    assert_eq!(patch.memory, None);
    assert_eq!(patch.power_on, None);
    assert_eq!(patch.autoreboot_on, None);
}

#[test]
fn mismatched_resize_is_rejected_before_submission() {
    let result = patch_from(&UpdateRequest {
        cores: Some(1),
        memory: Some(8192),
        ..UpdateRequest::default()
    });
    assert!(matches!(result, Err(LifecycleError::Capacity(_))));
}
