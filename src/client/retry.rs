//! Pure retry policy for the transport loop.

use std::time::Duration;

use reqwest::StatusCode;

const MAX_ATTEMPTS: u32 = 3;
const REAUTH_DELAY: Duration = Duration::from_secs(1);

/// Decision for one completed attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Disposition {
    /// Hand the response to the caller. Success and client errors are both
    /// terminal; the caller decides what a 4xx means for its operation.
    Return,
    /// Replace the session and send the buffered request once more.
    Reauthenticate,
    /// The session was already replaced once; the credentials are bad.
    RejectCredentials,
    /// Read the body in full and surface a remote fault.
    Fault,
}

/// Attempt budget and per-status dispositions, kept separate from the I/O
/// loop so the policy can be tested without a server.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct RetryPolicy {
    max_attempts: u32,
    reauth_delay: Duration,
}

impl RetryPolicy {
    pub(crate) const fn new() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            reauth_delay: REAUTH_DELAY,
        }
    }

    pub(crate) const fn max_attempts(self) -> u32 {
        self.max_attempts
    }

    pub(crate) const fn reauth_delay(self) -> Duration {
        self.reauth_delay
    }

    /// Classifies a response received on the given zero-based attempt.
    ///
    /// The API is known to answer 401 spuriously on live sessions; the first
    /// 401 buys one forced reauthentication, a second one is genuine.
    pub(crate) fn classify(self, attempt: u32, status: StatusCode) -> Disposition {
        if status == StatusCode::UNAUTHORIZED {
            return if attempt == 0 {
                Disposition::Reauthenticate
            } else {
                Disposition::RejectCredentials
            };
        }
        if status.is_success() || status.is_redirection() || status.is_client_error() {
            Disposition::Return
        } else {
            Disposition::Fault
        }
    }
}
