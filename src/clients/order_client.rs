use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{ApiClient, ApiError, RequestConfig};
use crate::model::{MenuItem, MenuResponse, OrderRecord, OrderRequest, OrderStatus};
use crate::tracker::StatusSource;

/// Client for the menu and order endpoints.
#[derive(Clone, Debug)]
pub struct OrderClient {
    api: ApiClient,
}

/// `POST /orders` answers; some backends only return the id.
#[derive(Debug, Deserialize)]
struct CreatedOrder {
    order_id: String,
    #[serde(default = "initial_status")]
    status: OrderStatus,
    #[serde(default)]
    eta_minutes: u32,
    #[serde(default)]
    created_at: Option<u64>,
}

fn initial_status() -> OrderStatus {
    OrderStatus::Queued
}

impl From<CreatedOrder> for OrderRecord {
    fn from(o: CreatedOrder) -> Self {
        OrderRecord {
            order_id: o.order_id,
            status: o.status,
            eta_minutes: o.eta_minutes,
            created_at: o.created_at,
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(payload: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(payload)
        .map_err(|e| ApiError::UnexpectedPayload(format!("{what}: {e}")))
}

impl OrderClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[instrument(skip(self))]
    pub async fn menu(&self) -> Result<Vec<MenuItem>, ApiError> {
        let payload = self
            .api
            .send(RequestConfig::get("/menu").with_retries(self.api.retry_budget()))
            .await?;
        let items = decode::<MenuResponse>(payload, "menu")?.into_items();
        debug!(items = items.len(), "Menu loaded");
        Ok(items)
    }

    /// Submits `order`. Not retried: a retry after a lost response could
    /// place the order twice.
    #[instrument(skip(self, order), fields(items = order.items.len()))]
    pub async fn create_order(&self, order: &OrderRequest) -> Result<OrderRecord, ApiError> {
        if order.is_empty() {
            return Err(ApiError::Validation("Your cart is empty.".to_string()));
        }
        if let Some(item) = order.items.iter().find(|i| i.qty == 0) {
            return Err(ApiError::Validation(format!(
                "Item {} has no quantity.",
                item.id
            )));
        }
        let body = serde_json::to_value(order)
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let payload = self
            .api
            .send(RequestConfig::post("/orders", body).authenticated())
            .await?;
        let record: OrderRecord = decode::<CreatedOrder>(payload, "order")?.into();
        info!(order_id = %record.order_id, status = %record.status, "Order placed");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn order(&self, order_id: &str) -> Result<OrderRecord, ApiError> {
        let payload = self
            .api
            .send(
                RequestConfig::get(format!("/orders/{order_id}"))
                    .authenticated()
                    .with_retries(self.api.retry_budget()),
            )
            .await?;
        decode(payload, "order status")
    }
}

#[async_trait]
impl StatusSource for OrderClient {
    async fn fetch_status(&self, order_id: &str) -> Result<OrderRecord, ApiError> {
        self.order(order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, ApiMode};
    use crate::model::OrderItem;
    use crate::storage::MemoryStore;
    use crate::testing::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn client(mock: &MockTransport) -> OrderClient {
        let config = ApiConfig {
            mode: ApiMode::Real,
            retry_budget: 0,
            ..ApiConfig::default()
        };
        OrderClient::new(ApiClient::new(
            &config,
            Arc::new(mock.clone()),
            Arc::new(MemoryStore::new()),
        ))
    }

    #[tokio::test]
    async fn test_empty_order_never_hits_the_network() {
        let mock = MockTransport::new();
        let err = client(&mock)
            .create_order(&OrderRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_create_order_accepts_id_only_answers() {
        let mock = MockTransport::new();
        mock.expect_request().return_ok(json!({ "order_id": "ord-7" }));

        let order = OrderRequest {
            items: vec![OrderItem {
                id: "1".into(),
                qty: 2,
            }],
        };
        let record = client(&mock).create_order(&order).await.unwrap();
        assert_eq!(record.order_id, "ord-7");
        assert_eq!(record.status, OrderStatus::Queued);

        let sent = &mock.requests()[0];
        assert_eq!(sent.body, Some(json!({ "items": [{ "id": "1", "qty": 2 }] })));
    }

    #[tokio::test]
    async fn test_menu_accepts_both_shapes() {
        let mock = MockTransport::new();
        let item = json!({ "id": "4", "name": "Water", "price": 20, "available": true });
        mock.expect_request().return_ok(json!({ "items": [item.clone()] }));
        mock.expect_request().return_ok(json!([item]));

        let orders = client(&mock);
        assert_eq!(orders.menu().await.unwrap().len(), 1);
        assert_eq!(orders.menu().await.unwrap()[0].name, "Water");
    }

    #[tokio::test]
    async fn test_status_payload_missing_fields() {
        let mock = MockTransport::new();
        mock.expect_request().return_raw(200, "garbage");

        let err = client(&mock).order("42").await.unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedPayload(_)));
        assert_eq!(mock.requests()[0].path, "/orders/42");
    }
}
