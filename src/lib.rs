//! Client library for the Stratus Cloud virtual machine API.
//!
//! The crate exposes the full machine lifecycle (create → wait for
//! provisioning → wait for power → wait for SSH reachability) over an
//! authenticated HTTP client that absorbs the API's known quirks: spurious
//! 401 responses answered by one forced reauthentication, 202-versus-200
//! readiness signalling, and asymmetric create/update payloads.

pub mod capacity;
pub mod client;
pub mod config;
pub mod lifecycle;
pub mod machine;

pub use capacity::{CapacityError, reconcile};
pub use client::{ClientError, StratusClient};
pub use config::{ConfigError, StratusConfig};
pub use lifecycle::{LifecycleError, MachineLifecycle};
pub use machine::{CreateRequest, CreateRequestBuilder, MachineAttrs, RequestError, UpdateRequest};
