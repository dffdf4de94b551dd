//! Default [`Transport`] backed by `reqwest`.
//!
//! Parameters are URL-encoded the way most form-style JSON APIs expect:
//! - GET, HEAD and DELETE append them to the query string
//! - every other method sends them as an `application/x-www-form-urlencoded` body
//! - nested objects become `key[sub]=v`, arrays become `key[]=v`
//! - booleans are sent as `1` / `0`

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;

use super::endpoint::{HttpMethod, Params};
use super::transport::{Transport, TransportError, TransportRequest};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tunables for the underlying HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
        }
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport over a default `reqwest::Client`.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Creates a transport with a configured client.
    pub fn with_options(options: &HttpOptions) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().timeout(options.timeout);
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Network(format!("HTTP client setup failed: {e}")))?;
        Ok(Self { client })
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

/// Renders a scalar for a query string or form body.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn push_components(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (nested, v) in sorted(map) {
                push_components(format!("{key}[{nested}]"), v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                push_components(format!("{key}[]"), v, out);
            }
        }
        scalar => out.push((key, scalar_string(scalar))),
    }
}

fn sorted(params: &Params) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = params.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Flattens parameters into `(key, value)` pairs for URL encoding, keys sorted.
pub fn encode_parameters(params: &Params) -> Vec<(String, String)> {
    let mut out = Vec::with_capacity(params.len());
    for (key, value) in sorted(params) {
        push_components(key.clone(), value, &mut out);
    }
    out
}

/// Converts descriptor headers, rejecting names or values HTTP can't carry.
fn header_map(headers: &Params) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidHeader(format!("{name}: {e}")))?;
        let header_value = HeaderValue::from_str(&scalar_string(value))
            .map_err(|e| TransportError::InvalidHeader(format!("{name}: {e}")))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Decodes a successful response body. Responses that carry no content
/// (204, 205, HEAD, or simply an empty body) decode to `null`.
fn decode_body(method: HttpMethod, status: StatusCode, body: &[u8]) -> Result<Value, TransportError> {
    if method == HttpMethod::Head
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::RESET_CONTENT
        || body.is_empty()
    {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| {
        warn!("Response serialization failed: {}", e);
        TransportError::Decode(e.to_string())
    })
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::InvalidUrl(e.to_string())
    } else if e.is_timeout() {
        TransportError::Network(format!("request timed out: {e}"))
    } else {
        TransportError::Network(e.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn perform(&self, request: TransportRequest<'_>) -> Result<Value, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url);

        if let Some(headers) = request.headers {
            let headers = header_map(headers).map_err(|e| {
                warn!("Rejected headers for {}: {}", request.url, e);
                e
            })?;
            builder = builder.headers(headers);
        }

        if let Some(params) = request.parameters {
            let pairs = encode_parameters(params);
            builder = if request.method.encodes_in_url() {
                builder.query(&pairs)
            } else {
                builder.form(&pairs)
            };
        }

        info!("{} {} via {}", request.method, request.url, self.name());

        let response = builder.send().await.map_err(|e| {
            let err = classify(e);
            warn!("Transport failure for {}: {}", request.url, err);
            err
        })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let status = status.as_u16();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Response validation failed: {} - {}", status, err_body);
            return Err(TransportError::Status {
                status,
                message: err_body,
            });
        }

        let body = response.bytes().await.map_err(|e| {
            warn!("Failed to read response body: {}", e);
            TransportError::Network(e.to_string())
        })?;
        debug!("Response body: {} bytes", body.len());

        decode_body(request.method, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_encode_scalars() {
        let pairs = encode_parameters(&params(json!({
            "alt": "json",
            "kbps": 128,
            "flag": true,
            "off": false,
        })));
        assert_eq!(
            pairs,
            vec![
                ("alt".to_string(), "json".to_string()),
                ("flag".to_string(), "1".to_string()),
                ("kbps".to_string(), "128".to_string()),
                ("off".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_encode_nested_and_arrays() {
        let pairs = encode_parameters(&params(json!({
            "filter": {"kind": "song", "year": 2017},
            "ids": [1, 2],
        })));
        assert_eq!(
            pairs,
            vec![
                ("filter[kind]".to_string(), "song".to_string()),
                ("filter[year]".to_string(), "2017".to_string()),
                ("ids[]".to_string(), "1".to_string()),
                ("ids[]".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_null_encodes_as_empty() {
        let pairs = encode_parameters(&params(json!({"cursor": null})));
        assert_eq!(pairs, vec![("cursor".to_string(), String::new())]);
    }

    #[test]
    fn test_contentless_responses_decode_to_null() {
        assert_eq!(
            decode_body(HttpMethod::Delete, StatusCode::NO_CONTENT, b""),
            Ok(Value::Null)
        );
        assert_eq!(
            decode_body(HttpMethod::Post, StatusCode::RESET_CONTENT, b""),
            Ok(Value::Null)
        );
        assert_eq!(decode_body(HttpMethod::Head, StatusCode::OK, b""), Ok(Value::Null));
        assert_eq!(decode_body(HttpMethod::Get, StatusCode::OK, b""), Ok(Value::Null));
    }

    #[test]
    fn test_body_must_be_json() {
        assert_eq!(
            decode_body(HttpMethod::Get, StatusCode::OK, br#"{"k": 1}"#),
            Ok(json!({"k": 1}))
        );
        assert!(matches!(
            decode_body(HttpMethod::Get, StatusCode::OK, b"<html>"),
            Err(TransportError::Decode(_))
        ));
    }

    #[test]
    fn test_bad_headers_are_rejected() {
        let map = header_map(&params(json!({"X-Count": 3, "X-Flag": true}))).unwrap();
        assert_eq!(map.get("x-count").unwrap(), "3");
        assert_eq!(map.get("x-flag").unwrap(), "1");

        assert!(matches!(
            header_map(&params(json!({"Bad Name": "v"}))),
            Err(TransportError::InvalidHeader(_))
        ));
        assert!(matches!(
            header_map(&params(json!({"X-Line": "a\nb"}))),
            Err(TransportError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_with_options_builds_client() {
        let options = HttpOptions {
            timeout: Duration::from_secs(2),
            user_agent: Some("keyfetch-test".to_string()),
        };
        assert!(HttpTransport::with_options(&options).is_ok());
    }
}
