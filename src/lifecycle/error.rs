//! Error types for machine lifecycle operations.

use std::time::Duration;

use thiserror::Error;

use crate::capacity::CapacityError;
use crate::client::ClientError;
use crate::machine::RequestError;

/// Errors surfaced by machine lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Raised when a request is missing a required field.
    #[error("invalid machine request: {0}")]
    Validation(String),
    /// Raised when a cores/memory pair violates the capacity rule.
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    /// Raised when an SSH key is supplied for a machine imaged without an
    /// operating system; keys cannot be installed without one.
    #[error("machine {name}: an ssh public key cannot be installed without an operating system")]
    KeyWithoutOs {
        /// Machine name from the rejected request.
        name: String,
    },
    /// Transport, authorization, or remote fault from the client, carrying
    /// the operation it interrupted.
    #[error("{operation} {name}: {source}")]
    Client {
        /// Operation that issued the request.
        operation: &'static str,
        /// Machine name or identifier the operation addressed.
        name: String,
        /// Underlying transport error.
        #[source]
        source: ClientError,
    },
    /// Terminal status outside the set the operation expects.
    #[error("{operation} {name} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        /// Operation that issued the request.
        operation: &'static str,
        /// Machine name or identifier the operation addressed.
        name: String,
        /// Status the remote side answered with.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Raised when a request payload cannot be encoded.
    #[error("could not encode {operation} payload for {name}: {source}")]
    Encode {
        /// Operation whose payload failed to encode.
        operation: &'static str,
        /// Machine name or identifier the operation addressed.
        name: String,
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },
    /// Raised when a successful response body cannot be decoded.
    #[error("could not decode {operation} response for {name}: {source}")]
    Decode {
        /// Operation whose response failed to decode.
        operation: &'static str,
        /// Machine name or identifier the operation addressed.
        name: String,
        /// Underlying deserialisation error.
        #[source]
        source: serde_json::Error,
    },
    /// Raised when a machine exposes no usable address on its primary
    /// interface.
    #[error("machine {name} has no usable address on its primary interface")]
    MissingAddress {
        /// Machine name.
        name: String,
    },
    /// Raised when a polling deadline elapses. The remote side may still
    /// converge after the caller gives up, so this means "final state
    /// unknown", not "failed".
    #[error(
        "timed out after {}s waiting for machine {name} to become {target}; \
         the remote side may still converge",
        waited.as_secs()
    )]
    Timeout {
        /// State that was being waited for.
        target: &'static str,
        /// Machine name.
        name: String,
        /// Deadline that elapsed.
        waited: Duration,
    },
}

impl From<RequestError> for LifecycleError {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::Validation(field) => Self::Validation(field),
        }
    }
}
