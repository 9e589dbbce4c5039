//! In-memory admin core for tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::Value;

use crate::error::Result;
use crate::events::{EventCallback, EventEmitter, Unsubscribe};
use crate::protocol::{AdminEvent, AdminSubscription};
use crate::transport::{AdminCore, HttpClient};

/// A request captured by [`MockAdmin`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Mock admin core for testing.
///
/// Returns queued responses in order and records every request and
/// subscription. With nothing queued, requests resolve to `Value::Null`.
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct MockAdmin {
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    responses: Mutex<VecDeque<Result<Value>>>,
    request_log: Mutex<Vec<RecordedRequest>>,
    subscriptions: Mutex<Vec<AdminSubscription>>,
    emitter: EventEmitter,
}

impl MockAdmin {
    /// Create a mock with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response body.
    pub fn push_response(&self, body: Value) {
        self.state.responses.lock().push_back(Ok(body));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: crate::Error) {
        self.state.responses.lock().push_back(Err(error));
    }

    /// Get all requests made so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.request_log.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.state.request_log.lock().len()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.request_log.lock().last().cloned()
    }

    /// Get all subscription messages sent so far.
    pub fn subscriptions(&self) -> Vec<AdminSubscription> {
        self.state.subscriptions.lock().clone()
    }

    /// Simulate delivery of an event envelope.
    pub fn emit_event(&self, event: &AdminEvent) -> usize {
        self.state.emitter.dispatch(event)
    }

    /// The listener registry.
    pub fn events(&self) -> &EventEmitter {
        &self.state.emitter
    }
}

#[async_trait]
impl HttpClient for MockState {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        self.request_log.lock().push(RecordedRequest {
            method,
            path: path.to_string(),
            body,
        });
        self.responses.lock().pop_front().unwrap_or(Ok(Value::Null))
    }
}

impl AdminCore for MockAdmin {
    fn http_client(&self) -> &dyn HttpClient {
        self.state.as_ref()
    }

    fn subscribe(&self, subscription: AdminSubscription) -> Result<()> {
        self.state.subscriptions.lock().push(subscription);
        Ok(())
    }

    fn on(&self, event: &str, callback: EventCallback) -> Unsubscribe {
        self.state.emitter.on(event, callback)
    }
}

impl std::fmt::Debug for MockAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAdmin")
            .field("requests", &self.request_count())
            .field("subscriptions", &self.state.subscriptions.lock().len())
            .finish()
    }
}
