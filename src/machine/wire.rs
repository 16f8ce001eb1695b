//! Wire-format types for the machine API.
//!
//! Create and update are asymmetric on the wire: creation wraps the machine
//! in an envelope carrying the root disc, the reimage spec, and optional
//! explicit addresses, while updates send a bare patch object and get a bare
//! machine object back.

use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Machine record as the API reads and writes it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Machine {
    /// Remote-assigned identifier; absent until provisioning has started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Caller-supplied name; immutable after creation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Core count; paired with `memory` by the capacity rule.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub cores: u32,
    /// Memory size in MiB.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub memory: u32,
    /// Whether the machine is (or should be) powered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_on: Option<bool>,
    /// Whether the machine restarts itself after losing power.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoreboot_on: Option<bool>,
    /// Remote-assigned group identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u64>,
    /// Zone the machine lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    /// Distribution the machine was last imaged with. Empty in create
    /// responses; populated once imaging has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_imaged_with: Option<String>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Disc attached to a machine; set once at creation, never resized.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Disc {
    /// Disc label, `root` for the boot disc.
    #[serde(default)]
    pub label: String,
    /// Storage grade the disc is allocated on.
    #[serde(default)]
    pub storage_grade: String,
    /// Disc size in MiB.
    #[serde(default)]
    pub size: u32,
}

/// Network interface as discovered through reads after creation.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct NetworkInterface {
    /// Interface label.
    #[serde(default)]
    pub label: String,
    /// Addresses bound to the interface, mixed families.
    #[serde(default)]
    pub ips: Vec<String>,
    /// Hardware address.
    #[serde(default)]
    pub mac: String,
}

/// Imaging instructions sent at creation; write-only apart from the
/// distribution name, which reads back as `last_imaged_with`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub(crate) struct Reimage {
    pub(crate) distribution: String,
    pub(crate) root_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ssh_public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) firstboot_script: Option<String>,
}

/// Explicit addresses requested at creation; omitted to let the remote side
/// allocate.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub(crate) struct IpSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ipv4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ipv6: Option<String>,
}

/// Creation envelope.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub(crate) struct CreatePayload {
    pub(crate) virtual_machine: Machine,
    pub(crate) discs: Vec<Disc>,
    pub(crate) reimage: Reimage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ips: Option<IpSpec>,
}

/// Patch sent on update; only changed field groups are serialised.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub(crate) struct MachinePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) memory: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) power_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) autoreboot_on: Option<bool>,
}

/// Overview document returned by reads and provisioning polls.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct MachineState {
    /// Machine record.
    #[serde(flatten)]
    pub machine: Machine,
    /// Discs attached to the machine.
    #[serde(default)]
    pub discs: Vec<Disc>,
    /// Interfaces in remote order; the first one is the primary.
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterface>,
}

impl MachineState {
    /// Address the SSH probe targets: the first parseable address on the
    /// primary interface, preferring IPv4 over IPv6.
    #[must_use]
    pub fn primary_address(&self) -> Option<IpAddr> {
        let nic = self.network_interfaces.first()?;
        let mut fallback = None;
        for ip in &nic.ips {
            if let Ok(addr) = IpAddr::from_str(ip) {
                if addr.is_ipv4() {
                    return Some(addr);
                }
                if fallback.is_none() {
                    fallback = Some(addr);
                }
            }
        }
        fallback
    }

    /// First IPv4 address on the primary interface, as reported.
    #[must_use]
    pub fn ipv4(&self) -> Option<String> {
        self.primary_ip(IpAddr::is_ipv4)
    }

    /// First IPv6 address on the primary interface, as reported.
    #[must_use]
    pub fn ipv6(&self) -> Option<String> {
        self.primary_ip(IpAddr::is_ipv6)
    }

    fn primary_ip(&self, family: impl Fn(&IpAddr) -> bool) -> Option<String> {
        let nic = self.network_interfaces.first()?;
        nic.ips
            .iter()
            .find(|ip| IpAddr::from_str(ip).is_ok_and(|addr| family(&addr)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{Disc, Machine, MachinePatch, MachineState, NetworkInterface};

    fn nic(ips: &[&str]) -> NetworkInterface {
        NetworkInterface {
            label: String::from("vlan"),
            ips: ips.iter().map(|ip| (*ip).to_owned()).collect(),
            mac: String::from("fe:ff:ff:ff:ff:01"),
        }
    }

    #[test]
    fn overview_parses_with_embedded_discs_and_interfaces() {
        let body = r#"{
            "id": 550,
            "name": "web1",
            "cores": 2,
            "memory": 8192,
            "power_on": true,
            "autoreboot_on": true,
            "group_id": 19,
            "zone_name": "york",
            "last_imaged_with": "bookworm",
            "discs": [{"label": "root", "storage_grade": "sata", "size": 25600}],
            "network_interfaces": [
                {"label": "vlan", "ips": ["192.0.2.11", "2001:db8::11"], "mac": "fe:ff:ff:ff:ff:01"}
            ]
        }"#;

        let state: MachineState =
            serde_json::from_str(body).unwrap_or_else(|err| panic!("overview should parse: {err}"));
        assert_eq!(state.machine.id, Some(550));
        assert_eq!(state.machine.cores, 2);
        assert_eq!(state.machine.power_on, Some(true));
        assert_eq!(state.discs.first().map(|disc| disc.size), Some(25600));
        assert_eq!(state.ipv4().as_deref(), Some("192.0.2.11"));
        assert_eq!(state.ipv6().as_deref(), Some("2001:db8::11"));
    }

    #[test]
    fn partial_bodies_during_provisioning_still_parse() {
        let state: MachineState = serde_json::from_str(r#"{"name": "web1"}"#)
            .unwrap_or_else(|err| panic!("partial body should parse: {err}"));
        assert_eq!(state.machine.name, "web1");
        assert_eq!(state.machine.id, None);
        assert!(state.network_interfaces.is_empty());
    }

    #[test]
    fn primary_address_prefers_ipv4_on_the_first_interface() {
        let state = MachineState {
            machine: Machine::default(),
            discs: Vec::new(),
            network_interfaces: vec![
                nic(&["2001:db8::11", "192.0.2.11"]),
                nic(&["198.51.100.7"]),
            ],
        };
        assert_eq!(
            state.primary_address().map(|addr| addr.to_string()),
            Some(String::from("192.0.2.11"))
        );
    }

    #[test]
    fn primary_address_falls_back_to_ipv6_and_skips_garbage() {
        let state = MachineState {
            machine: Machine::default(),
            discs: Vec::new(),
            network_interfaces: vec![nic(&["not-an-address", "2001:db8::11"])],
        };
        assert_eq!(
            state.primary_address().map(|addr| addr.to_string()),
            Some(String::from("2001:db8::11"))
        );
        assert_eq!(state.ipv4(), None);
    }

    #[test]
    fn empty_patch_serialises_to_an_empty_object() {
        let rendered = serde_json::to_string(&MachinePatch::default())
            .unwrap_or_else(|err| panic!("patch should serialise: {err}"));
        assert_eq!(rendered, "{}");
    }

    #[test]
    fn disc_round_trips_its_field_names() {
        let disc = Disc {
            label: String::from("root"),
            storage_grade: String::from("sata"),
            size: 25600,
        };
        let rendered = serde_json::to_string(&disc)
            .unwrap_or_else(|err| panic!("disc should serialise: {err}"));
        assert_eq!(
            rendered,
            r#"{"label":"root","storage_grade":"sata","size":25600}"#
        );
    }
}
