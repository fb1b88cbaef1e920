//! Connection settings shared by every call an executor makes.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Timeout applied when none is configured, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while building a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL {0} cannot be used as a base for endpoints")]
    CannotBeABase(String),
}

/// Base URL, credentials, timeout and fixed headers of a REST API.
///
/// Built once and never mutated afterwards; each [`RequestExecutor`](super::RequestExecutor)
/// owns its own copy.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    user: String,
    password: String,
    timeout: Duration,
    headers: HeaderMap,
}

impl ClientConfig {
    /// Creates a config with the default timeout and JSON headers.
    pub fn new(
        base_url: &str,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::CannotBeABase(base_url.to_string()));
        }

        Ok(Self {
            base_url: parsed,
            user: user.into(),
            password: password.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            headers: json_headers(),
        })
    }

    /// Returns the same config with a different timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Resolves `endpoint` against the base URL.
    ///
    /// Follows URL reference resolution: a base without a trailing slash has
    /// its last segment replaced, and an endpoint starting with `/` replaces
    /// the whole path.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(endpoint)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("user", &self.user)
            .field("password", &"********")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}
