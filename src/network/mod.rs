//! # Network
//!
//! Describes API calls, sends them through a pluggable transport, and turns
//! the responses into typed results.
//!
//! ## Modules
//!
//! - [`endpoint`]: the `Endpoint` trait, `HttpMethod`, and a free-form `ApiDescriptor`
//! - [`endpoints`]: concrete endpoint families
//! - [`key_path`]: dotted-path lookup into decoded JSON
//! - [`pipeline`]: `FetchError`, `FetchResult`, and the `Pipeline` operators
//! - [`transport`]: the `Transport` boundary
//! - [`http`]: the default `reqwest` transport
//! - [`dispatcher`]: `Dispatcher`, `Decoder`, and `CancelHandle`

pub mod dispatcher;
pub mod endpoint;
pub mod endpoints;
pub mod http;
pub mod key_path;
pub mod pipeline;
pub mod transport;

pub use dispatcher::{parse_result, CancelHandle, Decoder, Dispatcher, JsonDecoder};
pub use endpoint::{ApiDescriptor, Endpoint, HttpMethod, Params};
pub use endpoints::{DouBanApi, DouBanEndpoint, DouBanSettings};
pub use http::{HttpOptions, HttpTransport};
pub use key_path::value_for_key_path;
pub use pipeline::{FetchError, FetchResult, Pipeline};
pub use transport::{Transport, TransportError, TransportRequest};
