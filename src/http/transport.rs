//! The seam between request classification and the wire.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::fmt;
use url::Url;

use super::config::ClientConfig;
use super::error::TransportError;
use super::response::RawResponse;

/// The two verbs an executor can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Everything needed to put one call on the wire.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub url: Url,
    /// Query parameters for GET, JSON body for POST. `Null` sends neither.
    pub params: Value,
    pub user: String,
    pub password: String,
    pub headers: HeaderMap,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a single exchange and reads the whole response body.
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by a reqwest [`Client`].
///
/// The configured timeout bounds the connect phase and every read separately.
/// There is no overall deadline, so a connect that never completes always
/// surfaces as a connect failure.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn for_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("restcall/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.timeout())
            .read_timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse, TransportError> {
        let builder = match request.method {
            HttpMethod::Get => {
                let pairs = query_pairs(&request.params)?;
                let builder = self.client.get(request.url);
                if pairs.is_empty() {
                    builder
                } else {
                    builder.query(&pairs)
                }
            }
            HttpMethod::Post => {
                let builder = self.client.post(request.url);
                if request.params.is_null() {
                    builder
                } else {
                    builder.json(&request.params)
                }
            }
        };

        let response = builder
            .headers(request.headers)
            .basic_auth(request.user, Some(request.password))
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(classify_transport_error)?;

        Ok(RawResponse::new(status, headers, body.to_vec()))
    }
}

/// Flattens GET parameters into query pairs.
///
/// `Null` parameters and `null` values are skipped, an array repeats its key
/// once per element, strings are sent verbatim and any other value as its
/// JSON text. Parameters that are neither `Null` nor an object are rejected.
pub fn query_pairs(params: &Value) -> Result<Vec<(String, String)>, TransportError> {
    let map = match params {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(TransportError::Build(
                format!("query parameters must be an object, got {}", other).into(),
            ));
        }
    };

    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(item) = query_value(item) {
                        pairs.push((key.clone(), item));
                    }
                }
            }
            other => {
                if let Some(value) = query_value(other) {
                    pairs.push((key.clone(), value));
                }
            }
        }
    }
    Ok(pairs)
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Sorts a reqwest failure by how far the request got.
///
/// Connect failures are checked before timeouts: a timeout while connecting
/// means the server never saw the request.
pub fn classify_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_builder() {
        TransportError::Build(Box::new(error))
    } else if error.is_connect() {
        TransportError::Connect(Box::new(error))
    } else if error.is_timeout() {
        TransportError::Timeout(Box::new(error))
    } else {
        TransportError::Interrupted(Box::new(error))
    }
}

/// Returns the address of a listener whose accept queue is full, so further
/// connection attempts hang in the handshake. The returned values must be
/// kept alive for the duration of the test.
#[cfg(all(test, target_os = "linux"))]
pub(crate) fn saturated_listener() -> (
    std::net::SocketAddr,
    tokio::net::TcpListener,
    Vec<std::net::TcpStream>,
) {
    let socket = tokio::net::TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut held = Vec::new();
    for _ in 0..64 {
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Ok(stream) => held.push(stream),
            Err(_) => break,
        }
    }
    (addr, listener, held)
}
