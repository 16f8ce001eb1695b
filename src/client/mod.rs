//! Authenticated HTTP transport for the Stratus Cloud API.
//!
//! One [`StratusClient`] owns a lazily built `reqwest` client, a session
//! token slot, and the admission gate that serialises machine creation.
//! Clones share all three, so concurrent lifecycle operations contend only
//! where the remote API requires it.

mod error;
mod retry;
mod session;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::sleep;
use tracing::warn;

use crate::config::StratusConfig;
use retry::{Disposition, RetryPolicy};

pub use error::ClientError;

/// Absolute timeout for one request lifecycle, nested inside any polling
/// deadline a lifecycle operation runs under.
const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

struct ClientInner {
    config: StratusConfig,
    http: OnceLock<reqwest::Client>,
    session: Mutex<Option<String>>,
    create_gate: Mutex<()>,
}

/// Authenticated HTTP client for one Stratus account.
#[derive(Clone)]
pub struct StratusClient {
    inner: Arc<ClientInner>,
}

impl StratusClient {
    /// Creates a client from configuration. No session is established until
    /// the first request needs one.
    #[must_use]
    pub fn new(config: StratusConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                http: OnceLock::new(),
                session: Mutex::new(None),
                create_gate: Mutex::new(()),
            }),
        }
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &StratusConfig {
        &self.inner.config
    }

    /// Takes the admission gate serialising machine creation submissions.
    ///
    /// The remote IP-allocation subsystem deadlocks under concurrent create
    /// requests, so the gate is held across the submission only and released
    /// before any provisioning poll starts.
    pub(crate) async fn admission_gate(&self) -> MutexGuard<'_, ()> {
        self.inner.create_gate.lock().await
    }

    fn http(&self) -> &reqwest::Client {
        self.inner.http.get_or_init(|| {
            reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new())
        })
    }

    /// Sends a request with the current session token injected, absorbing
    /// the API's spurious-401 quirk with one forced reauthentication.
    ///
    /// The body, when present, must arrive fully serialised so it can be
    /// replayed identically on the retry. Responses with a status in
    /// [200, 500) are handed back unchanged; the caller interprets client
    /// errors for its operation. Anything else is read in full and surfaced
    /// as [`ClientError::RemoteFault`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] on connection-level failure,
    /// [`ClientError::CredentialsRejected`] when a 401 recurs after the
    /// forced reauthentication, and [`ClientError::RemoteFault`] for
    /// faulting statuses.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<Response, ClientError> {
        let policy = RetryPolicy::new();
        let mut token = self.bearer_token().await?;

        for attempt in 0..policy.max_attempts() {
            let mut request = self
                .http()
                .request(method.clone(), url)
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .header(CONTENT_TYPE, "application/json");
            if let Some(buffered) = &body {
                request = request.body(buffered.clone());
            }

            let response = request.send().await?;
            match policy.classify(attempt, response.status()) {
                Disposition::Return => return Ok(response),
                Disposition::Reauthenticate => {
                    warn!(url = %url, "HTTP 401 on a live session, retrying with a fresh one");
                    sleep(policy.reauth_delay()).await;
                    token = self.refresh_token().await?;
                }
                Disposition::RejectCredentials => {
                    return Err(ClientError::CredentialsRejected {
                        status: response.status().as_u16(),
                    });
                }
                Disposition::Fault => {
                    let status = response.status().as_u16();
                    let text = response.text().await.unwrap_or_default();
                    return Err(ClientError::RemoteFault { status, body: text });
                }
            }
        }

        Err(ClientError::Exhausted {
            attempts: policy.max_attempts(),
        })
    }
}
