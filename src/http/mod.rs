//! Basic-authenticated JSON calls with outcome classification.
//!
//! [`RequestExecutor`] performs one GET or POST per call and never retries.
//! Every failure comes back as a [`RequestError`] saying whether the remote
//! operation definitely did not happen or might have.

mod config;
mod error;
mod executor;
mod response;
mod transport;

pub use config::{ClientConfig, ConfigError, DEFAULT_TIMEOUT_SECS};
pub use error::{BoxError, RequestError, TransportError};
pub use executor::{DEFAULT_EXPECTED_CODES, RequestExecutor, is_indeterminate_status};
pub use response::RawResponse;
pub use transport::{
    HttpMethod, OutgoingRequest, ReqwestTransport, Transport, classify_transport_error,
    query_pairs,
};

#[cfg(test)]
pub use transport::MockTransport;
