//! keyfetch library exports

pub mod config;
pub mod models;
pub mod network;

#[cfg(test)]
pub mod test_support;

pub use network::{
    ApiDescriptor, CancelHandle, Decoder, Dispatcher, Endpoint, FetchError, FetchResult,
    HttpMethod, JsonDecoder, Pipeline, Transport, TransportError,
};
