//! # Test Doubles
//!
//! Utilities for testing the request layer, the cart actor and the tracker
//! without a backend or a real store.
//!
//! - [`MockTransport`]: a [`Transport`] that answers from a queue of scripted
//!   expectations and records every request it sees.
//! - [`FailingStore`]: a [`KeyValueStore`] whose every operation fails.
//!
//! # Example
//! ```ignore
//! let mock = MockTransport::new();
//! mock.expect_request().return_status(401, json!({}));
//! mock.expect_request().hang();
//!
//! let api = ApiClient::new(&config, Arc::new(mock.clone()), store);
//! // ...
//! assert_eq!(mock.call_count(), 1);
//! mock.verify(); // ensures all expectations were consumed
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::storage::{KeyValueStore, StorageError};
use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// What the mock does with one request.
#[derive(Debug, Clone)]
enum Expectation {
    Respond {
        response: TransportResponse,
        delay: Duration,
    },
    Fail(TransportError),
    /// Never answers.
    Hang,
}

#[derive(Debug, Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    requests: Vec<TransportRequest>,
}

/// A scripted transport with expectation tracking.
///
/// Expectations are consumed in order, one per request. A request arriving
/// with nothing queued panics, so tests fail loudly on unexpected traffic.
/// Clones share the same script and history.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the answer for the next request.
    pub fn expect_request(&self) -> RequestExpectationBuilder {
        RequestExpectationBuilder {
            state: self.state.clone(),
            delay: Duration::ZERO,
        }
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let expectation = {
            let mut state = self.state.lock().unwrap();
            let next = state.expectations.pop_front();
            state.requests.push(request.clone());
            next
        };

        match expectation {
            Some(Expectation::Respond { response, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(response)
            }
            Some(Expectation::Fail(e)) => Err(e),
            Some(Expectation::Hang) => std::future::pending().await,
            None => panic!(
                "Unexpected request: {} {}",
                request.method, request.url
            ),
        }
    }
}

/// Builder for one scripted answer.
pub struct RequestExpectationBuilder {
    state: Arc<Mutex<MockState>>,
    delay: Duration,
}

impl RequestExpectationBuilder {
    /// Delays the scripted response.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answers 200 with `body`.
    pub fn return_ok(self, body: Value) {
        self.return_status(200, body);
    }

    /// Answers `status` with `body`.
    pub fn return_status(self, status: u16, body: Value) {
        let response = TransportResponse::json(status, &body);
        self.push_response(response);
    }

    /// Answers `status` with a raw, possibly non-JSON body.
    pub fn return_raw(self, status: u16, body: &str) {
        self.push_response(TransportResponse::new(status, body));
    }

    pub fn fail_unreachable(self, reason: &str) {
        self.push(Expectation::Fail(TransportError::Unreachable(reason.to_string())));
    }

    /// Never answers, so the caller's attempt timeout fires.
    pub fn hang(self) {
        self.push(Expectation::Hang);
    }

    fn push_response(self, response: TransportResponse) {
        let delay = self.delay;
        self.push(Expectation::Respond { response, delay });
    }

    fn push(self, expectation: Expectation) {
        self.state.lock().unwrap().expectations.push_back(expectation);
    }
}

/// A store whose every operation fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Backend("store unavailable".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("store unavailable".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("store unavailable".into()))
    }
}
