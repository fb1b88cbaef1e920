//! Dispatches a call and decides what its outcome means for the caller.

use log::{debug, error};
use reqwest::StatusCode;
use serde_json::Value;

use super::config::ClientConfig;
use super::error::{RequestError, TransportError};
use super::response::RawResponse;
use super::transport::{HttpMethod, OutgoingRequest, ReqwestTransport, Transport};

/// Status codes accepted when a caller does not name any.
pub const DEFAULT_EXPECTED_CODES: &[u16] = &[200];

/// Sends basic-authenticated JSON requests and classifies every failure as
/// either a confirmed failure or an unknown outcome.
///
/// Holds no state besides its immutable config, so one executor can serve
/// concurrent callers.
pub struct RequestExecutor<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
}

impl RequestExecutor<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let transport = ReqwestTransport::for_config(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> RequestExecutor<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends `params` as the query string of a GET to `endpoint`.
    #[tracing::instrument(skip(self, params))]
    pub async fn get(
        &self,
        endpoint: &str,
        params: &Value,
        expected_codes: Option<&[u16]>,
    ) -> Result<RawResponse, RequestError> {
        self.dispatch(endpoint, params, HttpMethod::Get, expected_codes)
            .await
    }

    /// Sends `body_params` as the JSON body of a POST to `endpoint`.
    #[tracing::instrument(skip(self, body_params))]
    pub async fn post(
        &self,
        endpoint: &str,
        body_params: &Value,
        expected_codes: Option<&[u16]>,
    ) -> Result<RawResponse, RequestError> {
        self.dispatch(endpoint, body_params, HttpMethod::Post, expected_codes)
            .await
    }

    /// Performs one call and classifies its outcome.
    ///
    /// Returns the response untouched when its status is in `expected_codes`
    /// (`None` means [`DEFAULT_EXPECTED_CODES`]). Otherwise returns
    /// [`RequestError::ConfirmedFailure`] for connection failures, 4xx and any
    /// other unexpected status, and [`RequestError::UnknownOutcome`] for
    /// timeouts and 5xx.
    pub async fn dispatch(
        &self,
        endpoint: &str,
        params: &Value,
        method: HttpMethod,
        expected_codes: Option<&[u16]>,
    ) -> Result<RawResponse, RequestError> {
        let url = match self.config.endpoint_url(endpoint) {
            Ok(url) => url,
            Err(e) => {
                let target = format!("{}{}", self.config.base_url(), endpoint);
                error!(
                    "Invalid endpoint for API: url={} request_body={} timeout={:?} error={}",
                    target,
                    params,
                    self.config.timeout(),
                    e
                );
                return Err(RequestError::ConfirmedFailure {
                    url: target,
                    response: None,
                    source: Some(TransportError::Build(Box::new(e))),
                });
            }
        };

        debug!("{} {}...", method, url);

        let request = OutgoingRequest {
            method,
            url: url.clone(),
            params: params.clone(),
            user: self.config.user().to_string(),
            password: self.config.password().to_string(),
            headers: self.config.headers().clone(),
        };

        let url = url.to_string();
        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => return Err(self.transport_failure(url, params, e)),
        };

        let expected = expected_codes.unwrap_or(DEFAULT_EXPECTED_CODES);
        if expected.contains(&response.status().as_u16()) {
            debug!("{} {} returned HTTP {}", method, url, response.status());
            return Ok(response);
        }

        Err(self.status_failure(url, params, response))
    }

    fn transport_failure(&self, url: String, params: &Value, e: TransportError) -> RequestError {
        let message = match e {
            TransportError::Build(_) => "Could not build request to API",
            TransportError::Connect(_) => "Could not connect to API",
            TransportError::Timeout(_) => "Timeout in request to API",
            TransportError::Interrupted(_) => "Request to API interrupted",
        };
        error!(
            "{}: url={} request_body={} timeout={:?} error={}",
            message,
            url,
            params,
            self.config.timeout(),
            e
        );

        if e.request_may_have_arrived() {
            RequestError::UnknownOutcome {
                url,
                response: None,
                source: Some(e),
            }
        } else {
            RequestError::ConfirmedFailure {
                url,
                response: None,
                source: Some(e),
            }
        }
    }

    fn status_failure(&self, url: String, params: &Value, response: RawResponse) -> RequestError {
        let status = response.status();
        let message = if status.is_client_error() {
            "API returned HTTP 4xx error"
        } else if is_indeterminate_status(status) {
            "API returned HTTP 5xx error"
        } else {
            "Unexpected status code in response from API"
        };
        error!(
            "{}: url={} request_body={} timeout={:?} response_status_code={} response_body={}",
            message,
            url,
            params,
            self.config.timeout(),
            status.as_u16(),
            response.text()
        );

        if is_indeterminate_status(status) {
            RequestError::UnknownOutcome {
                url,
                response: Some(response),
                source: None,
            }
        } else {
            RequestError::ConfirmedFailure {
                url,
                response: Some(response),
                source: None,
            }
        }
    }
}

/// Whether an unexpected status leaves the remote effect undetermined.
///
/// Anything from 500 up counts, including non-standard codes above 599.
pub fn is_indeterminate_status(status: StatusCode) -> bool {
    status.as_u16() >= 500
}
