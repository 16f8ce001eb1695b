//! Tests for the readiness wait loops.

use super::{dummy_config, fast_lifecycle};
use crate::client::StratusClient;
use crate::lifecycle::{LifecycleError, MachineLifecycle};
use crate::machine::{Machine, MachineState, NetworkInterface};

fn state_with_ip(ip: &str, powered: bool) -> MachineState {
    MachineState {
        machine: Machine {
            id: Some(550),
            name: String::from("web1"),
            power_on: Some(powered),
            ..Machine::default()
        },
        discs: Vec::new(),
        network_interfaces: vec![NetworkInterface {
            label: String::from("vlan"),
            ips: vec![ip.to_owned()],
            mac: String::from("fe:ff:ff:ff:ff:01"),
        }],
    }
}

#[tokio::test]
async fn wait_for_ssh_succeeds_when_the_port_listens() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|err| panic!("bind listener: {err}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|err| panic!("listener addr: {err}"));
    tokio::spawn(async move { if let Ok((_stream, _peer)) = listener.accept().await {} });

    let lifecycle = fast_lifecycle().with_ssh_port(addr.port());
    let state = state_with_ip("127.0.0.1", true);
    lifecycle
        .wait_for_ssh("web1", &state)
        .await
        .unwrap_or_else(|err| panic!("ssh should be reachable: {err}"));
}

#[tokio::test]
async fn wait_for_ssh_times_out_when_the_port_is_closed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|err| panic!("bind listener: {err}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|err| panic!("listener addr: {err}"));
    drop(listener);

    let lifecycle = fast_lifecycle().with_ssh_port(addr.port());
    let state = state_with_ip("127.0.0.1", true);
    let err = lifecycle
        .wait_for_ssh("web1", &state)
        .await
        .expect_err("expected timeout");
    assert!(matches!(
        err,
        LifecycleError::Timeout {
            target: "ssh-reachable",
            ..
        }
    ));
}

#[tokio::test]
async fn wait_for_ssh_requires_a_usable_address() {
    let lifecycle = fast_lifecycle();
    let mut state = state_with_ip("not-an-address", true);
    state.network_interfaces = Vec::new();

    let err = lifecycle
        .wait_for_ssh("web1", &state)
        .await
        .expect_err("expected missing address");
    assert!(matches!(err, LifecycleError::MissingAddress { .. }));
}

#[tokio::test]
async fn wait_for_powered_returns_immediately_when_already_powered() {
    // The config points at a dead port, so any poll would fail the test.
    let lifecycle = MachineLifecycle::new(StratusClient::new(dummy_config()));
    let state = state_with_ip("192.0.2.11", true);
    let powered = lifecycle
        .wait_for_powered("web1", state)
        .await
        .unwrap_or_else(|err| panic!("already-powered machine should not poll: {err}"));
    assert_eq!(powered.machine.power_on, Some(true));
}
