//! Orders as seen by the client.
//!
//! The backend owns the [`OrderRecord`]; the client only ever observes a
//! read-only projection of it and never predicts status locally.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Queued,
    InProgress,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// The statuses shown on the progress timeline, in order.
    pub const TIMELINE: [OrderStatus; 4] = [
        OrderStatus::Queued,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ];

    /// No further change or polling happens once an order reaches one of these.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Ready | OrderStatus::Completed | OrderStatus::Cancelled
        )
    }

    /// Position on [`Self::TIMELINE`]; `None` for `Cancelled`.
    pub fn timeline_index(self) -> Option<usize> {
        Self::TIMELINE.iter().position(|s| *s == self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Queued => "QUEUED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{id, qty}` entry of an order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub qty: u32,
}

/// Body of `POST /orders`. A snapshot of the cart, never a live view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderItem>,
}

impl OrderRequest {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Server-held order state, as returned by `POST /orders` and `GET /orders/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub status: OrderStatus,
    pub eta_minutes: u32,
    /// Creation time in milliseconds since the Unix epoch, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Queued.is_terminal());
        assert!(!OrderStatus::InProgress.is_terminal());
        assert!(OrderStatus::Ready.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        let record: OrderRecord = serde_json::from_str(
            r#"{"order_id":"42","status":"IN_PROGRESS","eta_minutes":8}"#,
        )
        .unwrap();
        assert_eq!(record.status, OrderStatus::InProgress);
        assert_eq!(record.created_at, None);
        assert_eq!(
            serde_json::to_value(OrderStatus::Cancelled).unwrap(),
            serde_json::json!("CANCELLED")
        );
    }

    #[test]
    fn test_timeline_index() {
        assert_eq!(OrderStatus::Queued.timeline_index(), Some(0));
        assert_eq!(OrderStatus::Completed.timeline_index(), Some(3));
        assert_eq!(OrderStatus::Cancelled.timeline_index(), None);
    }
}
