//! In-process stand-in for the backend, used for demos and tests.
//!
//! No network I/O happens here. Every response is canned or derived from the
//! injected [`Clock`], after an artificial latency. Order ids are the creation
//! time in milliseconds, so an order's status is a pure function of its id and
//! the current time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{Method, Transport, TransportError, TransportRequest, TransportResponse};
use crate::clock::Clock;
use crate::model::{MenuItem, OrderRecord, OrderStatus};

const QUEUED_FOR_MS: u64 = 8_000;
const IN_PROGRESS_UNTIL_MS: u64 = 16_000;
const READY_UNTIL_MS: u64 = 24_000;

/// Failure the simulator can be told to produce on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedFailure {
    /// Never answer; the request layer's attempt timeout fires.
    Timeout,
    /// Answer 401.
    Unauthorized,
    /// Answer 500.
    ServerError,
}

/// Status and ETA of a simulated order at `now_ms`.
///
/// Returns `None` when `order_id` does not encode a creation time.
pub fn simulated_progress(order_id: &str, now_ms: u64) -> Option<OrderRecord> {
    let created_at: u64 = order_id.parse().ok()?;
    let age = now_ms.saturating_sub(created_at);
    let (status, eta_minutes) = if age < QUEUED_FOR_MS {
        (OrderStatus::Queued, 12)
    } else if age < IN_PROGRESS_UNTIL_MS {
        (OrderStatus::InProgress, 8)
    } else if age < READY_UNTIL_MS {
        (OrderStatus::Ready, 0)
    } else {
        (OrderStatus::Completed, 0)
    };
    Some(OrderRecord {
        order_id: order_id.to_string(),
        status,
        eta_minutes,
        created_at: Some(created_at),
    })
}

/// The fixed menu served in simulated mode.
pub fn simulated_menu() -> Vec<MenuItem> {
    let item = |id: &str, name: &str, price, available| MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        price,
        available,
    };
    vec![
        item("1", "Chicken Burger", 120, true),
        item("2", "Beef Burger", 150, true),
        item("3", "French Fries", 60, false),
        item("4", "Water", 20, true),
    ]
}

#[derive(Clone)]
pub struct Simulator {
    clock: Arc<dyn Clock>,
    latency: Duration,
    failure: Option<SimulatedFailure>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("latency", &self.latency)
            .field("failure", &self.failure)
            .finish()
    }
}

impl Simulator {
    pub fn new(clock: Arc<dyn Clock>, latency: Duration) -> Self {
        Self {
            clock,
            latency,
            failure: None,
        }
    }

    pub fn with_failure(mut self, failure: Option<SimulatedFailure>) -> Self {
        self.failure = failure;
        self
    }

    fn route(&self, request: &TransportRequest) -> TransportResponse {
        let segments: Vec<&str> = request
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match (request.method, segments.as_slice()) {
            (Method::Post, ["login"]) => self.login(request.body.as_ref()),
            (Method::Get, ["menu"]) => {
                TransportResponse::json(200, &json!({ "items": simulated_menu() }))
            }
            (Method::Post, ["orders"]) => self.create_order(request.body.as_ref()),
            (Method::Get, ["orders", id]) => match simulated_progress(id, self.clock.now_ms()) {
                Some(record) => TransportResponse::json(200, &json!(record)),
                None => not_found(),
            },
            _ => not_found(),
        }
    }

    fn login(&self, body: Option<&Value>) -> TransportResponse {
        let student_id = body
            .and_then(|b| b.get("student_id"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty());
        match student_id {
            Some(student_id) => TransportResponse::json(
                200,
                &json!({
                    "access_token": "mock-token",
                    "user": { "student_id": student_id, "name": "Mock User" },
                }),
            ),
            None => TransportResponse::json(400, &json!({ "message": "student_id is required" })),
        }
    }

    fn create_order(&self, body: Option<&Value>) -> TransportResponse {
        let has_items = body
            .and_then(|b| b.get("items"))
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty());
        if !has_items {
            return TransportResponse::json(400, &json!({ "message": "Order has no items" }));
        }
        let now = self.clock.now_ms();
        let record = OrderRecord {
            order_id: now.to_string(),
            status: OrderStatus::Queued,
            eta_minutes: 12,
            created_at: Some(now),
        };
        TransportResponse::json(201, &json!(record))
    }
}

fn not_found() -> TransportResponse {
    TransportResponse::json(404, &json!({ "message": "Not found" }))
}

#[async_trait]
impl Transport for Simulator {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        tokio::time::sleep(self.latency).await;
        debug!(
            method = %request.method,
            path = %request.path,
            failure = ?self.failure,
            "Simulated request"
        );
        match self.failure {
            Some(SimulatedFailure::Timeout) => std::future::pending().await,
            Some(SimulatedFailure::Unauthorized) => Ok(TransportResponse::json(
                401,
                &json!({ "message": "Unauthorized" }),
            )),
            Some(SimulatedFailure::ServerError) => Ok(TransportResponse::json(
                500,
                &json!({ "message": "Simulated server error" }),
            )),
            None => Ok(self.route(&request)),
        }
    }
}
