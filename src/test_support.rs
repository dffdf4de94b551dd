//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::network::{FetchResult, Transport, TransportError, TransportRequest};

/// Answers every request with the same canned result.
pub struct StaticTransport {
    response: Result<Value, TransportError>,
    calls: AtomicUsize,
}

impl StaticTransport {
    pub fn ok(value: Value) -> Self {
        Self {
            response: Ok(value),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn err(error: TransportError) -> Self {
        Self {
            response: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StaticTransport {
    fn name(&self) -> &str {
        "static"
    }

    async fn perform(&self, _request: TransportRequest<'_>) -> Result<Value, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// Holds every request open until the test calls `release()`.
pub struct GatedTransport {
    response: Value,
    started: Notify,
    gate: Notify,
}

impl GatedTransport {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            started: Notify::new(),
            gate: Notify::new(),
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub async fn wait_for_start(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl Transport for GatedTransport {
    fn name(&self) -> &str {
        "gated"
    }

    async fn perform(&self, _request: TransportRequest<'_>) -> Result<Value, TransportError> {
        self.started.notify_one();
        self.gate.notified().await;
        Ok(self.response.clone())
    }
}

/// Panics on every request.
pub struct PanickingTransport;

#[async_trait]
impl Transport for PanickingTransport {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn perform(&self, _request: TransportRequest<'_>) -> Result<Value, TransportError> {
        panic!("transport blew up");
    }
}

#[derive(Default)]
struct Recorded {
    calls: usize,
    last: Option<FetchResult<Value>>,
}

/// Records what a completion was called with, and how often.
#[derive(Clone, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Recorded>>,
    called: Arc<Notify>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completion(&self) -> impl FnOnce(FetchResult<Value>) + Send + 'static {
        let recorder = self.clone();
        move |result| {
            {
                let mut inner = recorder.inner.lock().unwrap();
                inner.calls += 1;
                inner.last = Some(result);
            }
            recorder.called.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().calls
    }

    pub fn take(&self) -> Option<FetchResult<Value>> {
        self.inner.lock().unwrap().last.take()
    }

    pub async fn wait_for_call(&self) {
        self.called.notified().await;
    }
}
