//! Machine lifecycle orchestration.
//!
//! Creation reconciles capacity, serialises the remote submission through
//! the client's admission gate, and then drives up to three polling phases:
//! provisioned (the overview endpoint answers 200 instead of 202), powered
//! (the machine reports its power flag), and SSH-reachable (the primary
//! address accepts a TCP connection). Read, update, delete, and exists are
//! single round trips.

mod error;
mod password;
mod wait;

#[cfg(test)]
mod tests;

use std::time::Duration;

use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use crate::capacity::reconcile;
use crate::client::StratusClient;
use crate::machine::{
    CreateRequest, Machine, MachineAttrs, MachinePatch, MachineState, NO_OS_DISTRIBUTION,
    UpdateRequest,
};

pub use error::LifecycleError;

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const WAIT_TIMEOUT: Duration = Duration::from_secs(1200);
const DEFAULT_SSH_PORT: u16 = 22;

/// Drives machine lifecycle operations over a [`StratusClient`].
///
/// Each operation owns its view of the machine it addresses; the only state
/// shared with concurrent operations is the client's session and admission
/// gate.
#[derive(Clone)]
pub struct MachineLifecycle {
    client: StratusClient,
    poll_interval: Duration,
    wait_timeout: Duration,
    ssh_port: u16,
}

impl MachineLifecycle {
    /// Creates a lifecycle driver with the production polling cadence.
    #[must_use]
    pub const fn new(client: StratusClient) -> Self {
        Self {
            client,
            poll_interval: POLL_INTERVAL,
            wait_timeout: WAIT_TIMEOUT,
            ssh_port: DEFAULT_SSH_PORT,
        }
    }

    /// Overrides the polling interval.
    ///
    /// This is primarily used by tests to keep wait scenarios fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the wall-clock deadline bounding each polling loop.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Overrides the port probed for SSH reachability.
    #[must_use]
    pub const fn with_ssh_port(mut self, port: u16) -> Self {
        self.ssh_port = port;
        self
    }

    /// Creates a machine and waits until it is provisioned, powered (when
    /// requested), and SSH-reachable (when imaged with an operating
    /// system). Returns the machine's attributes; the remote-assigned
    /// identifier inside them is the handle for subsequent operations.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Validation`], [`LifecycleError::Capacity`],
    /// or [`LifecycleError::KeyWithoutOs`] before any network call when the
    /// request is contradictory; [`LifecycleError::UnexpectedStatus`] when
    /// the submission is not accepted; and the transport, decode, and
    /// timeout variants from the polling phases.
    pub async fn create(&self, request: &CreateRequest) -> Result<MachineAttrs, LifecycleError> {
        request.validate()?;
        if request.ssh_public_key.is_some() && request.distribution == NO_OS_DISTRIBUTION {
            return Err(LifecycleError::KeyWithoutOs {
                name: request.name.clone(),
            });
        }

        let (cores, memory) = reconcile(request.cores, request.memory)?;
        let root_password = password::generate();
        let config = self.client.config();
        let group = request.group.as_deref().unwrap_or(&config.group);
        let zone = request.zone.as_deref().unwrap_or(&config.zone);
        let payload = request.to_payload(cores, memory, &root_password, zone);
        let body = serde_json::to_string(&payload).map_err(|source| LifecycleError::Encode {
            operation: "create",
            name: request.name.clone(),
            source,
        })?;

        let url = format!(
            "{}/accounts/{}/groups/{}/vm_create",
            config.api_url, config.account, group
        );
        info!(name = %request.name, cores, memory, zone = %zone, "submitting machine create");

        // The gate covers the submission race only; the polls run ungated.
        let submission = {
            let _gate = self.client.admission_gate().await;
            self.client.execute(Method::POST, &url, Some(body)).await
        };
        let response = submission.map_err(|source| LifecycleError::Client {
            operation: "create",
            name: request.name.clone(),
            source,
        })?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            let text = response.text().await.unwrap_or_default();
            return Err(LifecycleError::UnexpectedStatus {
                operation: "create",
                name: request.name.clone(),
                status: status.as_u16(),
                body: text,
            });
        }

        let provisioned = self.wait_for_provisioned(&request.name).await?;
        let state = if request.power_on {
            self.wait_for_powered(&request.name, provisioned).await?
        } else {
            provisioned
        };
        if request.distribution != NO_OS_DISTRIBUTION {
            self.wait_for_ssh(&request.name, &state).await?;
        }

        info!(name = %request.name, id = ?state.machine.id, "machine created");
        Ok(self.attrs_from_state(&state, group, Some(root_password), Some(&request.distribution)))
    }

    /// Fetches the machine's overview and repopulates every tracked field
    /// from it.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::UnexpectedStatus`] for any non-200 answer
    /// and [`LifecycleError::Decode`] when the body does not parse.
    pub async fn read(&self, id: &str) -> Result<MachineAttrs, LifecycleError> {
        let (status, body) = self.fetch_machine("read", id).await?;
        if status != StatusCode::OK {
            return Err(LifecycleError::UnexpectedStatus {
                operation: "read",
                name: id.to_owned(),
                status: status.as_u16(),
                body,
            });
        }
        let state: MachineState =
            serde_json::from_str(&body).map_err(|source| LifecycleError::Decode {
                operation: "read",
                name: id.to_owned(),
                source,
            })?;
        Ok(self.attrs_from_state(&state, &self.client.config().group, None, None))
    }

    /// Submits the changed field groups. Changing capacity implies a power
    /// cycle (power off, auto-reboot on) unless the same update states an
    /// explicit power intent, which always wins.
    ///
    /// The response refreshes machine-level fields only; it carries no disc
    /// or interface detail, so callers wanting the full view follow with
    /// [`Self::read`].
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Capacity`] when the new capacity pairing is
    /// invalid, [`LifecycleError::UnexpectedStatus`] for any non-200 answer,
    /// and [`LifecycleError::Decode`] when the response does not parse.
    pub async fn update(
        &self,
        id: &str,
        request: &UpdateRequest,
    ) -> Result<MachineAttrs, LifecycleError> {
        let patch = patch_from(request)?;
        let body = serde_json::to_string(&patch).map_err(|source| LifecycleError::Encode {
            operation: "update",
            name: id.to_owned(),
            source,
        })?;

        let config = self.client.config();
        let url = format!(
            "{}/accounts/{}/groups/{}/virtual_machines/{}",
            config.api_url, config.account, config.group, id
        );
        debug!(id, patch = ?patch, "submitting machine update");

        let response = self
            .client
            .execute(Method::PUT, &url, Some(body))
            .await
            .map_err(|source| LifecycleError::Client {
                operation: "update",
                name: id.to_owned(),
                source,
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if status != StatusCode::OK {
            return Err(LifecycleError::UnexpectedStatus {
                operation: "update",
                name: id.to_owned(),
                status: status.as_u16(),
                body: text,
            });
        }

        // Update responses carry the bare machine object.
        let machine: Machine =
            serde_json::from_str(&text).map_err(|source| LifecycleError::Decode {
                operation: "update",
                name: id.to_owned(),
                source,
            })?;
        let state = MachineState {
            machine,
            discs: Vec::new(),
            network_interfaces: Vec::new(),
        };
        Ok(self.attrs_from_state(&state, &config.group, None, None))
    }

    /// Purge-deletes the machine. Only a 204 answer is success.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::UnexpectedStatus`] for anything but 204.
    pub async fn delete(&self, id: &str) -> Result<(), LifecycleError> {
        let config = self.client.config();
        let url = format!(
            "{}/accounts/{}/groups/{}/virtual_machines/{}?purge=true",
            config.api_url, config.account, config.group, id
        );

        let response = self
            .client
            .execute(Method::DELETE, &url, None)
            .await
            .map_err(|source| LifecycleError::Client {
                operation: "delete",
                name: id.to_owned(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            let text = response.text().await.unwrap_or_default();
            return Err(LifecycleError::UnexpectedStatus {
                operation: "delete",
                name: id.to_owned(),
                status: status.as_u16(),
                body: text,
            });
        }

        info!(id, "machine deleted");
        Ok(())
    }

    /// Checks whether the machine exists. 200 and 202 both mean "exists"
    /// (a machine mid-provisioning exists); 404 means "absent"; any other
    /// status is an error rather than a silent answer either way.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::UnexpectedStatus`] for ambiguous statuses.
    pub async fn exists(&self, id: &str) -> Result<bool, LifecycleError> {
        let url = format!("{}/virtual_machines/{}", self.client.config().api_url, id);
        let response = self
            .client
            .execute(Method::GET, &url, None)
            .await
            .map_err(|source| LifecycleError::Client {
                operation: "exists",
                name: id.to_owned(),
                source,
            })?;

        match response.status() {
            StatusCode::OK | StatusCode::ACCEPTED => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(LifecycleError::UnexpectedStatus {
                    operation: "exists",
                    name: id.to_owned(),
                    status: status.as_u16(),
                    body: text,
                })
            }
        }
    }

    /// Issues one overview read and returns the status with the raw body.
    async fn fetch_machine(
        &self,
        operation: &'static str,
        name: &str,
    ) -> Result<(StatusCode, String), LifecycleError> {
        let url = format!(
            "{}/virtual_machines/{}?view=overview",
            self.client.config().api_url,
            name
        );
        let response = self
            .client
            .execute(Method::GET, &url, None)
            .await
            .map_err(|source| LifecycleError::Client {
                operation,
                name: name.to_owned(),
                source,
            })?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    fn attrs_from_state(
        &self,
        state: &MachineState,
        group: &str,
        root_password: Option<String>,
        requested_os: Option<&str>,
    ) -> MachineAttrs {
        let machine = &state.machine;
        MachineAttrs {
            id: machine.id,
            name: machine.name.clone(),
            cores: machine.cores,
            memory: machine.memory,
            power_on: machine.power_on.unwrap_or_default(),
            reboot: machine.autoreboot_on.unwrap_or_default(),
            group: group.to_owned(),
            group_id: machine.group_id,
            zone: machine
                .zone_name
                .clone()
                .unwrap_or_else(|| self.client.config().zone.clone()),
            // The distribution stays blank until imaging has run, so fall
            // back to what was requested.
            os: machine
                .last_imaged_with
                .clone()
                .or_else(|| requested_os.map(str::to_owned)),
            ipv4: state.ipv4(),
            ipv6: state.ipv6(),
            disc_size: state.discs.first().map(|disc| disc.size),
            root_password,
        }
    }
}

fn patch_from(request: &UpdateRequest) -> Result<MachinePatch, LifecycleError> {
    let mut patch = MachinePatch::default();

    if request.cores.is_some() || request.memory.is_some() {
        // Both sides travel together so the capacity rule stays checkable;
        // a single-sided request has the other side derived.
        let (cores, memory) = reconcile(
            request.cores.unwrap_or_default(),
            request.memory.unwrap_or_default(),
        )?;
        patch.cores = Some(cores);
        patch.memory = Some(memory);
        // Resizing restarts the machine unless the caller states otherwise.
        patch.power_on = Some(false);
        patch.autoreboot_on = Some(true);
    }

    if let Some(power) = request.power_on {
        patch.power_on = Some(power);
    }
    if let Some(reboot) = request.reboot {
        patch.autoreboot_on = Some(reboot);
    }

    Ok(patch)
}
