use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::endpoint::{HttpMethod, Params};

/// Transport-level failures. Variants mirror where in the exchange things
/// went wrong, not how the caller should react.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The endpoint produced no URL, or one the client rejected.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// A descriptor header name or value HTTP can't carry.
    #[error("invalid header {0}")]
    InvalidHeader(String),
    /// Network-level failure (timeout, DNS, connection refused).
    #[error("network error: {0}")]
    Network(String),
    /// Server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// Body could not be decoded as JSON.
    #[error("response decode error: {0}")]
    Decode(String),
    /// No async runtime available to run the exchange on.
    #[error("no async runtime: {0}")]
    Runtime(String),
}

/// Everything a transport needs for one exchange.
#[derive(Debug, Clone, Copy)]
pub struct TransportRequest<'a> {
    pub url: &'a str,
    pub method: HttpMethod,
    pub headers: Option<&'a Params>,
    pub parameters: Option<&'a Params>,
}

/// Performs a single HTTP exchange and hands back the decoded JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the name of the transport, for logs.
    fn name(&self) -> &str;

    async fn perform(&self, request: TransportRequest<'_>) -> Result<Value, TransportError>;
}
