use anyhow::{Context, Result, bail};
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use std::io::Write;

use crate::http::{RawResponse, RequestError};

pub mod config;

use config::Config;

/// Exit status when the call succeeded with an expected code.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status when the remote operation definitely did not happen.
pub const EXIT_CONFIRMED_FAILURE: u8 = 2;
/// Exit status when the remote operation may have happened.
pub const EXIT_UNKNOWN_OUTCOME: u8 = 3;

#[tracing::instrument(skip(config))]
pub async fn get(
    config: &Config,
    endpoint: &str,
    query: &[(String, String)],
    expected_codes: &[u16],
) -> Result<RawResponse, RequestError> {
    let params = query_params(query);
    config
        .executor
        .get(endpoint, &params, expected(expected_codes))
        .await
}

#[tracing::instrument(skip(config, body))]
pub async fn post(
    config: &Config,
    endpoint: &str,
    body: &Value,
    expected_codes: &[u16],
) -> Result<RawResponse, RequestError> {
    config
        .executor
        .post(endpoint, body, expected(expected_codes))
        .await
}

/// Prints the outcome and returns the matching exit status.
///
/// The body of a successful response goes to `out`; everything else to `err`.
pub fn report<O: Write, E: Write>(
    outcome: &Result<RawResponse, RequestError>,
    out: &mut O,
    err: &mut E,
) -> Result<u8> {
    match outcome {
        Ok(response) => {
            match response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
            {
                Some(content_type) => writeln!(err, "HTTP {} ({})", response.status(), content_type)?,
                None => writeln!(err, "HTTP {}", response.status())?,
            }
            out.write_all(response.body())?;
            if !response.body().ends_with(b"\n") {
                writeln!(out)?;
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            let (kind, code) = if e.is_unknown_outcome() {
                ("unknown outcome", EXIT_UNKNOWN_OUTCOME)
            } else {
                ("confirmed failure", EXIT_CONFIRMED_FAILURE)
            };
            writeln!(err, "{}: {}", kind, e)?;
            if let Some(source) = std::error::Error::source(e) {
                writeln!(err, "  caused by: {}", source)?;
            }
            if let Some(response) = e.response() {
                writeln!(err, "  response status: {}", response.status())?;
                writeln!(err, "  response body: {}", response.text())?;
            }
            Ok(code)
        }
    }
}

/// Parses a `key=value` query pair.
pub fn parse_query_pair(s: &str) -> Result<(String, String)> {
    let Some((key, value)) = s.split_once('=') else {
        bail!("Invalid query parameter {:?}; expected key=value", s);
    };
    if key.is_empty() {
        bail!("Invalid query parameter {:?}; key is empty", s);
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parses a JSON request body given on the command line.
pub fn parse_body(s: &str) -> Result<Value> {
    serde_json::from_str(s).with_context(|| format!("Request body is not valid JSON: {}", s))
}

fn query_params(query: &[(String, String)]) -> Value {
    if query.is_empty() {
        return Value::Null;
    }
    let map: Map<String, Value> = query
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

fn expected(codes: &[u16]) -> Option<&[u16]> {
    if codes.is_empty() { None } else { Some(codes) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ClientConfig, RequestExecutor};
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;
    use serde_json::json;

    #[test]
    fn test_parse_query_pair() {
        assert_eq!(
            parse_query_pair("postId=1").unwrap(),
            ("postId".to_string(), "1".to_string())
        );
        assert_eq!(
            parse_query_pair("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_query_pair("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_query_pair("novalue").is_err());
        assert!(parse_query_pair("=1").is_err());
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(
            parse_body(r#"{"title": "foo"}"#).unwrap(),
            json!({"title": "foo"})
        );
        assert!(parse_body("{title").is_err());
    }

    #[test]
    fn test_query_params() {
        assert_eq!(query_params(&[]), Value::Null);
        assert_eq!(
            query_params(&[("postId".to_string(), "1".to_string())]),
            json!({"postId": "1"})
        );
    }

    #[test]
    fn test_expected_defaults_when_empty() {
        assert_eq!(expected(&[]), None);
        assert_eq!(expected(&[201]), Some(&[201][..]));
    }

    #[test]
    fn test_report_success_writes_body() {
        let outcome = Ok(RawResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            r#"{"id":1}"#,
        ));
        let mut out = Vec::new();
        let mut err = Vec::new();

        let code = report(&outcome, &mut out, &mut err).unwrap();

        assert_eq!(code, EXIT_SUCCESS);
        assert_eq!(String::from_utf8(out).unwrap(), "{\"id\":1}\n");
        assert!(String::from_utf8(err).unwrap().contains("200"));
    }

    #[test]
    fn test_report_success_shows_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        let outcome = Ok(RawResponse::new(StatusCode::CREATED, headers, "{}"));
        let mut out = Vec::new();
        let mut err = Vec::new();

        report(&outcome, &mut out, &mut err).unwrap();

        assert_eq!(
            String::from_utf8(err).unwrap(),
            "HTTP 201 Created (application/json)\n"
        );
    }

    #[test]
    fn test_report_confirmed_failure() {
        let outcome = Err(RequestError::ConfirmedFailure {
            url: "https://api.example.com/posts".to_string(),
            response: Some(RawResponse::new(
                StatusCode::NOT_FOUND,
                HeaderMap::new(),
                "missing",
            )),
            source: None,
        });
        let mut out = Vec::new();
        let mut err = Vec::new();

        let code = report(&outcome, &mut out, &mut err).unwrap();

        assert_eq!(code, EXIT_CONFIRMED_FAILURE);
        assert!(out.is_empty());
        let err = String::from_utf8(err).unwrap();
        assert!(err.contains("confirmed failure"));
        assert!(err.contains("https://api.example.com/posts"));
        assert!(err.contains("missing"));
    }

    #[test]
    fn test_report_unknown_outcome() {
        let outcome = Err(RequestError::UnknownOutcome {
            url: "https://api.example.com/posts".to_string(),
            response: None,
            source: Some(crate::http::TransportError::Timeout("elapsed".into())),
        });
        let mut out = Vec::new();
        let mut err = Vec::new();

        let code = report(&outcome, &mut out, &mut err).unwrap();

        assert_eq!(code, EXIT_UNKNOWN_OUTCOME);
        let err = String::from_utf8(err).unwrap();
        assert!(err.contains("unknown outcome"));
        assert!(err.contains("caused by"));
    }

    #[tokio::test]
    async fn test_get_sends_query_pairs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/comments")
            .match_query(mockito::Matcher::UrlEncoded(
                "postId".into(),
                "1".into(),
            ))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client_config = ClientConfig::new(&server.url(), "u", "p").unwrap();
        let config = Config {
            executor: RequestExecutor::new(client_config).unwrap(),
        };

        let result = get(
            &config,
            "/comments",
            &[("postId".to_string(), "1".to_string())],
            &[],
        )
        .await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_post_uses_expected_codes() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/posts")
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let client_config = ClientConfig::new(&server.url(), "u", "p").unwrap();
        let config = Config {
            executor: RequestExecutor::new(client_config).unwrap(),
        };

        let body = json!({"title": "foo", "body": "bar"});
        assert!(post(&config, "/posts", &body, &[201]).await.is_ok());
        let err = post(&config, "/posts", &body, &[]).await.unwrap_err();
        assert!(err.is_confirmed_failure());
    }
}
