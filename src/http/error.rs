//! Outcome taxonomy for a failed call.
//!
//! A failure either definitely left the remote side untouched
//! ([`RequestError::ConfirmedFailure`]) or may have been applied
//! ([`RequestError::UnknownOutcome`]). Callers decide whether a retry is safe
//! from the kind alone.

use thiserror::Error;

use super::response::RawResponse;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised by a [`Transport`](super::Transport) before a complete
/// response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be built or encoded; nothing was sent.
    #[error("could not build request: {0}")]
    Build(#[source] BoxError),

    /// No connection to the server could be established.
    #[error("could not connect: {0}")]
    Connect(#[source] BoxError),

    /// The configured timeout elapsed after the request was sent.
    #[error("request timed out: {0}")]
    Timeout(#[source] BoxError),

    /// The exchange broke off after the request may have reached the server.
    #[error("request interrupted: {0}")]
    Interrupted(#[source] BoxError),
}

impl TransportError {
    /// Whether the server can have observed the request.
    pub fn request_may_have_arrived(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Interrupted(_)
        )
    }
}

/// Why a call did not yield one of the expected responses.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The remote operation definitely did not take effect. Retrying or
    /// compensating is safe.
    #[error("request to {url} failed{}", status_suffix(.response))]
    ConfirmedFailure {
        url: String,
        response: Option<RawResponse>,
        #[source]
        source: Option<TransportError>,
    },

    /// The remote operation may or may not have taken effect. Only retry
    /// idempotent operations.
    #[error("outcome of request to {url} is unknown{}", status_suffix(.response))]
    UnknownOutcome {
        url: String,
        response: Option<RawResponse>,
        #[source]
        source: Option<TransportError>,
    },
}

impl RequestError {
    pub fn url(&self) -> &str {
        match self {
            RequestError::ConfirmedFailure { url, .. } | RequestError::UnknownOutcome { url, .. } => {
                url
            }
        }
    }

    /// The response that triggered the failure, if one was received.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            RequestError::ConfirmedFailure { response, .. }
            | RequestError::UnknownOutcome { response, .. } => response.as_ref(),
        }
    }

    pub fn is_confirmed_failure(&self) -> bool {
        matches!(self, RequestError::ConfirmedFailure { .. })
    }

    pub fn is_unknown_outcome(&self) -> bool {
        matches!(self, RequestError::UnknownOutcome { .. })
    }
}

fn status_suffix(response: &Option<RawResponse>) -> String {
    match response {
        Some(response) => format!(" with HTTP {}", response.status()),
        None => String::new(),
    }
}
