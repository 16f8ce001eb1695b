//! Session token acquisition against the authentication service.

use reqwest::header::ACCEPT;
use serde::Serialize;
use tracing::debug;

use super::{ClientError, StratusClient};

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl StratusClient {
    /// Returns the current session token, creating one if none is cached.
    ///
    /// The check is repeated under the lock so that a caller blocked behind
    /// a concurrent acquisition reuses the token that acquisition produced.
    pub(crate) async fn bearer_token(&self) -> Result<String, ClientError> {
        let mut slot = self.inner.session.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }
        let token = self.request_session().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Creates a fresh session, replacing whatever token was cached.
    pub(crate) async fn refresh_token(&self) -> Result<String, ClientError> {
        let mut slot = self.inner.session.lock().await;
        let token = self.request_session().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    async fn request_session(&self) -> Result<String, ClientError> {
        let config = self.config();
        let url = format!("{}/session", config.auth_url);
        debug!(url = %url, user = %config.user, "requesting new session");

        let response = self
            .http()
            .post(&url)
            .header(ACCEPT, "text/plain")
            .json(&Credentials {
                username: &config.user,
                password: &config.password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::CredentialsRejected {
                status: status.as_u16(),
            });
        }

        let token = response.text().await?;
        debug!("session established");
        Ok(token)
    }
}
