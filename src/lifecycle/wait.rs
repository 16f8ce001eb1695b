//! Deadline-bounded polling loops for provisioning, power, and SSH.

use std::io;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::{LifecycleError, MachineLifecycle};
use crate::machine::MachineState;

const SSH_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

impl MachineLifecycle {
    /// Polls the overview endpoint until the API answers 200 instead of
    /// 202. Every body that parses refreshes the local snapshot regardless
    /// of status, so a wait that gives up still logs the best-known state.
    pub(crate) async fn wait_for_provisioned(
        &self,
        name: &str,
    ) -> Result<MachineState, LifecycleError> {
        let deadline = Instant::now() + self.wait_timeout;
        let mut snapshot: Option<MachineState> = None;

        while Instant::now() <= deadline {
            let (status, body) = self.fetch_machine("provision", name).await?;
            match serde_json::from_str::<MachineState>(&body) {
                Ok(state) if status == StatusCode::OK => return Ok(state),
                Ok(state) => snapshot = Some(state),
                Err(source) if status == StatusCode::OK => {
                    return Err(LifecycleError::Decode {
                        operation: "provision",
                        name: name.to_owned(),
                        source,
                    });
                }
                Err(_) => {}
            }
            if status != StatusCode::ACCEPTED {
                return Err(LifecycleError::UnexpectedStatus {
                    operation: "provision",
                    name: name.to_owned(),
                    status: status.as_u16(),
                    body,
                });
            }
            debug!(name, "machine still provisioning");
            sleep(self.poll_interval).await;
        }

        warn!(
            name,
            last_seen_id = ?snapshot.as_ref().and_then(|state| state.machine.id),
            "provisioning wait timed out; the machine may still converge"
        );
        Err(LifecycleError::Timeout {
            target: "provisioned",
            name: name.to_owned(),
            waited: self.wait_timeout,
        })
    }

    /// Polls until the machine reports power. The termination predicate is
    /// the power flag from the last parsed body, not the HTTP status.
    pub(crate) async fn wait_for_powered(
        &self,
        name: &str,
        last: MachineState,
    ) -> Result<MachineState, LifecycleError> {
        if last.machine.power_on.unwrap_or_default() {
            return Ok(last);
        }

        let deadline = Instant::now() + self.wait_timeout;
        let mut snapshot = last;

        while Instant::now() <= deadline {
            sleep(self.poll_interval).await;
            let (status, body) = self.fetch_machine("power", name).await?;
            if let Ok(state) = serde_json::from_str::<MachineState>(&body) {
                snapshot = state;
            }
            if status != StatusCode::OK && status != StatusCode::ACCEPTED {
                return Err(LifecycleError::UnexpectedStatus {
                    operation: "power",
                    name: name.to_owned(),
                    status: status.as_u16(),
                    body,
                });
            }
            if snapshot.machine.power_on.unwrap_or_default() {
                return Ok(snapshot);
            }
            debug!(name, "machine not yet powered");
        }

        Err(LifecycleError::Timeout {
            target: "powered",
            name: name.to_owned(),
            waited: self.wait_timeout,
        })
    }

    /// Probes the primary address until something accepts a TCP connection
    /// on the SSH port, closing the connection as soon as it opens.
    pub(crate) async fn wait_for_ssh(
        &self,
        name: &str,
        state: &MachineState,
    ) -> Result<(), LifecycleError> {
        let Some(address) = state.primary_address() else {
            return Err(LifecycleError::MissingAddress {
                name: name.to_owned(),
            });
        };

        let deadline = Instant::now() + self.wait_timeout;
        while Instant::now() <= deadline {
            match timeout(
                SSH_CONNECT_TIMEOUT,
                TcpStream::connect((address, self.ssh_port)),
            )
            .await
            {
                Ok(Ok(stream)) => {
                    drop(stream);
                    debug!(name, %address, "ssh endpoint accepted a connection");
                    return Ok(());
                }
                // Refused means the machine is up but sshd has not started.
                Ok(Err(err)) if err.kind() == io::ErrorKind::ConnectionRefused => {}
                // First boot is noisy; anything else gets a line but no
                // failure.
                Ok(Err(err)) => debug!(name, %address, error = %err, "ssh probe failed, retrying"),
                Err(_elapsed) => {}
            }
            sleep(self.poll_interval).await;
        }

        Err(LifecycleError::Timeout {
            target: "ssh-reachable",
            name: name.to_owned(),
            waited: self.wait_timeout,
        })
    }
}
