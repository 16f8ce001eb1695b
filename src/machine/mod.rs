//! Machine data model: wire payloads, lifecycle requests, and the flat
//! attribute view handed back to callers.

mod request;
mod wire;

pub use request::{
    CreateRequest, CreateRequestBuilder, NO_OS_DISTRIBUTION, RequestError, UpdateRequest,
};
pub(crate) use wire::MachinePatch;
pub use wire::{Disc, Machine, MachineState, NetworkInterface};

/// Flat attribute view of a machine, as exchanged with the schema layer.
///
/// Write-only creation inputs (SSH key material, first-boot script) live on
/// [`CreateRequest`]; this view carries everything the remote side reports
/// plus the computed root password on freshly created machines.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MachineAttrs {
    /// Remote-assigned identifier; the handle for subsequent operations.
    pub id: Option<u64>,
    /// Machine name.
    pub name: String,
    /// Core count.
    pub cores: u32,
    /// Memory size in MiB.
    pub memory: u32,
    /// Whether the machine reports power.
    pub power_on: bool,
    /// Whether the machine restarts itself after losing power.
    pub reboot: bool,
    /// Group the machine was addressed through.
    pub group: String,
    /// Remote-assigned group identifier.
    pub group_id: Option<u64>,
    /// Zone the machine lives in.
    pub zone: String,
    /// Distribution the machine runs, when known.
    pub os: Option<String>,
    /// First IPv4 address on the primary interface.
    pub ipv4: Option<String>,
    /// First IPv6 address on the primary interface.
    pub ipv6: Option<String>,
    /// Root disc size in MiB, when the response carried disc detail.
    pub disc_size: Option<u32>,
    /// Generated root password; only present on the create response, the
    /// remote side never reads it back.
    pub root_password: Option<String>,
}
