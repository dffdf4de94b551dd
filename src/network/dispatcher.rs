//! # Typed Dispatcher
//!
//! Ties the pieces together for a single call:
//!
//! ```text
//! Endpoint ─▶ url() ──none──▶ completion(Err(InvalidUrl))        (synchronous, no handle)
//!               │
//!               ▼
//!         Transport::perform  (spawned task, CancelHandle returned immediately)
//!               │
//!               ▼
//!         parse_result(key_path) ─▶ Decoder ─▶ completion(Ok(T) | Err(cause))
//! ```
//!
//! The dispatcher owns nothing mutable. Clones share the same transport and
//! can be handed to any number of concurrent callers.

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use uuid::Uuid;

use super::endpoint::{Endpoint, HttpMethod, Params};
use super::http::HttpTransport;
use super::key_path::value_for_key_path;
use super::pipeline::{FetchError, FetchResult, Pipeline};
use super::transport::{Transport, TransportError, TransportRequest};

// ============================================================================
// Decoding
// ============================================================================

/// Turns an extracted JSON value into a typed model, or nothing if the shape
/// doesn't fit.
pub trait Decoder<T> {
    fn decode(&self, value: &Value) -> Option<T>;
}

impl<T, F> Decoder<T> for F
where
    F: Fn(&Value) -> Option<T>,
{
    fn decode(&self, value: &Value) -> Option<T> {
        self(value)
    }
}

/// Decodes any `serde` model.
pub struct JsonDecoder<T>(PhantomData<fn() -> T>);

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Decoder<T> for JsonDecoder<T> {
    fn decode(&self, value: &Value) -> Option<T> {
        match T::deserialize(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!("Decoding {} failed: {}", type_name::<T>(), e);
                None
            }
        }
    }
}

/// Decodes every element of a JSON array, or nothing if any element fails.
fn decode_all<T, D: Decoder<T>>(decoder: &D, value: &Value) -> Option<Vec<T>> {
    value
        .as_array()?
        .iter()
        .map(|item| decoder.decode(item))
        .collect()
}

// ============================================================================
// Cancellation
// ============================================================================

const PENDING: u8 = 0;
const RESOLVED: u8 = 1;
const CANCELLED: u8 = 2;

/// Returned by a dispatch that actually started an exchange. Dropping it
/// does not cancel anything.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    request_id: Uuid,
    state: Arc<AtomicU8>,
    exchange: AbortHandle,
    delivery: AbortHandle,
}

impl CancelHandle {
    /// Abandons the exchange. Returns `true` if this call guaranteed the
    /// completion will never run, `false` if the transport had already
    /// resolved or the request was cancelled before.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            self.exchange.abort();
            self.delivery.abort();
            info!("[{}] Request cancelled", self.request_id);
        } else {
            debug!("[{}] Cancel ignored, request already settled", self.request_id);
        }
        cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// True once the background work has stopped, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.exchange.is_finished() && self.delivery.is_finished()
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

// ============================================================================
// Pipeline stages
// ============================================================================

/// Narrows a raw response to the sub-tree at `key_path`. An empty key path
/// passes the raw value through.
pub fn parse_result(result: FetchResult<Value>, key_path: &str) -> FetchResult<Value> {
    if key_path.is_empty() {
        return result;
    }
    result.flat_map_optional_or(
        |root| value_for_key_path(&root, key_path).cloned(),
        || FetchError::Extraction {
            path: key_path.to_string(),
        },
    )
}

fn invalid_url<E: Endpoint + ?Sized>(endpoint: &E) -> FetchError {
    FetchError::Transport(TransportError::InvalidUrl(format!("{endpoint:?}")))
}

/// Owned copy of what the transport needs, so it can move into a task.
struct Exchange {
    url: String,
    method: HttpMethod,
    headers: Option<Params>,
    parameters: Option<Params>,
}

impl Exchange {
    fn from_endpoint<E: Endpoint + ?Sized>(endpoint: &E, method: HttpMethod) -> Option<Self> {
        Some(Self {
            url: endpoint.url()?,
            method,
            headers: endpoint.headers(),
            parameters: endpoint.parameters(),
        })
    }

    async fn perform(&self, transport: &dyn Transport) -> FetchResult<Value> {
        transport
            .perform(TransportRequest {
                url: &self.url,
                method: self.method,
                headers: self.headers.as_ref(),
                parameters: self.parameters.as_ref(),
            })
            .await
            .map_err(FetchError::from)
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Process-wide dispatcher over a default [`HttpTransport`].
    pub fn shared() -> &'static Dispatcher {
        static SHARED: OnceLock<Dispatcher> = OnceLock::new();
        SHARED.get_or_init(|| Dispatcher::new(Arc::new(HttpTransport::new())))
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Runs the whole exchange and extraction in the caller's task.
    pub async fn fetch<E>(&self, endpoint: &E, method: HttpMethod, key_path: &str) -> FetchResult<Value>
    where
        E: Endpoint + ?Sized,
    {
        let Some(exchange) = Exchange::from_endpoint(endpoint, method) else {
            warn!("URL invalid: {:?}", endpoint);
            return Err(invalid_url(endpoint));
        };
        let raw = exchange.perform(self.transport.as_ref()).await;
        parse_result(raw, key_path)
    }

    /// Starts an exchange and hands the value at `key_path` to `completion`.
    ///
    /// Returns `None` when no exchange was started; the completion has then
    /// already been called with the failure. A transport that panics settles
    /// the request with [`FetchError::Unknown`]. Panics inside the decoder or
    /// the completion itself are not caught.
    pub fn fetch_data<E, F>(
        &self,
        endpoint: &E,
        method: HttpMethod,
        key_path: &str,
        completion: F,
    ) -> Option<CancelHandle>
    where
        E: Endpoint + ?Sized,
        F: FnOnce(FetchResult<Value>) + Send + 'static,
    {
        let request_id = Uuid::new_v4();

        let Some(exchange) = Exchange::from_endpoint(endpoint, method) else {
            warn!("[{}] URL invalid: {:?}", request_id, endpoint);
            completion(Err(invalid_url(endpoint)));
            return None;
        };

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("[{}] No runtime to run {} on: {}", request_id, exchange.url, e);
                completion(Err(TransportError::Runtime(e.to_string()).into()));
                return None;
            }
        };

        info!(
            "[{}] Dispatching {} {} (key path '{}') via {}",
            request_id,
            method,
            exchange.url,
            key_path,
            self.transport.name()
        );

        let transport = Arc::clone(&self.transport);
        let key_path = key_path.to_string();
        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);

        let exchange_task = runtime.spawn(async move { exchange.perform(transport.as_ref()).await });
        let exchange_abort = exchange_task.abort_handle();

        // Watches the exchange so a panicking transport still settles the request.
        let delivery = runtime.spawn(async move {
            let raw = match exchange_task.await {
                Ok(raw) => raw,
                Err(e) if e.is_cancelled() => {
                    debug!("[{}] Exchange aborted", request_id);
                    return;
                }
                Err(e) => {
                    warn!("[{}] Transport failed abnormally: {}", request_id, e);
                    Err(FetchError::Unknown(e.to_string()))
                }
            };

            if task_state
                .compare_exchange(PENDING, RESOLVED, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                debug!("[{}] Response arrived after cancel, dropping it", request_id);
                return;
            }

            let result = parse_result(raw, &key_path);
            result
                .on_success(|_| debug!("[{}] Delivering value", request_id))
                .on_failure(|e| warn!("[{}] Delivering failure: {}", request_id, e));
            completion(result);
        });

        Some(CancelHandle {
            request_id,
            state,
            exchange: exchange_abort,
            delivery: delivery.abort_handle(),
        })
    }

    /// Like [`fetch_data`](Self::fetch_data), then decodes the extracted
    /// value into a single `T`.
    pub fn fetch_json<T, E, D, F>(
        &self,
        endpoint: &E,
        method: HttpMethod,
        key_path: &str,
        decoder: D,
        completion: F,
    ) -> Option<CancelHandle>
    where
        T: Send + 'static,
        E: Endpoint + ?Sized,
        D: Decoder<T> + Send + 'static,
        F: FnOnce(FetchResult<T>) + Send + 'static,
    {
        self.fetch_data(endpoint, method, key_path, move |result| {
            completion(result.flat_map_optional_or(
                |value| decoder.decode(&value),
                || FetchError::Transform(format!("could not decode {}", type_name::<T>())),
            ))
        })
    }

    /// Like [`fetch_json`](Self::fetch_json), but expects an array and decodes
    /// every element. One bad element fails the whole call.
    pub fn fetch_json_array<T, E, D, F>(
        &self,
        endpoint: &E,
        method: HttpMethod,
        key_path: &str,
        decoder: D,
        completion: F,
    ) -> Option<CancelHandle>
    where
        T: Send + 'static,
        E: Endpoint + ?Sized,
        D: Decoder<T> + Send + 'static,
        F: FnOnce(FetchResult<Vec<T>>) + Send + 'static,
    {
        self.fetch_data(endpoint, method, key_path, move |result| {
            completion(result.flat_map_optional_or(
                |value| decode_all(&decoder, &value),
                || FetchError::Transform(format!("could not decode [{}]", type_name::<T>())),
            ))
        })
    }
}
