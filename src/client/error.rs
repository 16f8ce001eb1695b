//! Error taxonomy for the authenticated transport.

use thiserror::Error;

/// Errors raised by the transport layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level failure; surfaced unchanged and never retried.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// The API refused the credentials, either at the authentication
    /// endpoint or by answering 401 again after a forced reauthentication.
    #[error("credentials rejected (HTTP {status})")]
    CredentialsRejected {
        /// Status the rejecting endpoint answered with.
        status: u16,
    },
    /// Terminal response outside the ranges the retry policy hands back to
    /// the caller; carries the response body for diagnostics.
    #[error("remote fault: HTTP {status}: {body}")]
    RemoteFault {
        /// Status code of the faulting response.
        status: u16,
        /// Response body, read in full before the connection was dropped.
        body: String,
    },
    /// Fallback for a retry loop that ran out of attempts without reaching a
    /// terminal outcome. The policy makes every attempt terminal, so seeing
    /// this error indicates a client bug rather than a remote condition.
    #[error("no terminal outcome after {attempts} attempts")]
    Exhausted {
        /// Number of attempts the policy allowed.
        attempts: u32,
    },
}
