//! The request layer.
//!
//! [`ApiClient::send`] turns one logical request ("send method M to path P,
//! optionally authenticated, with up to N retries") into a single
//! result-or-failure. Each attempt is bounded by the configured timeout;
//! dropping the attempt future on timeout cancels the underlying request.
//!
//! Retry policy: timeouts, unreachable networks and 5xx answers are retried
//! after a fixed backoff while budget remains. 401 and other 4xx answers are
//! surfaced immediately.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::ApiError;
use crate::clock::Clock;
use crate::config::{ApiConfig, ApiMode, SimulationConfig};
use crate::storage::KeyValueStore;
use crate::transport::{
    HttpTransport, Method, Simulator, Transport, TransportRequest, TransportResponse,
};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "sc_token";

/// One logical request. Built per call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub requires_auth: bool,
    /// Additional attempts allowed after the first.
    pub retry_budget: u32,
}

impl RequestConfig {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            requires_auth: false,
            retry_budget: 0,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn with_retries(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn KeyValueStore>,
    mode: ApiMode,
    base_url: String,
    path_prefix: Option<String>,
    timeout: Duration,
    backoff: Duration,
    retry_budget: u32,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("mode", &self.mode)
            .field("base_url", &self.base_url)
            .field("path_prefix", &self.path_prefix)
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds a client over an explicit transport.
    pub fn new(
        config: &ApiConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            transport,
            store,
            mode: config.mode,
            base_url: config.base_url.clone(),
            path_prefix: config.path_prefix.clone(),
            timeout: config.timeout(),
            backoff: config.backoff(),
            retry_budget: config.retry_budget,
        }
    }

    /// Builds a client whose transport is chosen by `config.mode`.
    pub fn from_config(
        config: &ApiConfig,
        simulation: &SimulationConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let transport: Arc<dyn Transport> = match config.mode {
            ApiMode::Simulated => Arc::new(
                Simulator::new(clock, simulation.latency()).with_failure(simulation.failure),
            ),
            ApiMode::Real => Arc::new(HttpTransport::new()),
        };
        Self::new(config, transport, store)
    }

    pub fn mode(&self) -> ApiMode {
        self.mode
    }

    /// Default retry budget for the typed endpoint wrappers.
    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    /// `base_url` + `path_prefix` + `path`, with exactly one `/` between segments.
    pub fn resolve_url(&self, path: &str) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        let prefix = self.path_prefix.as_deref().unwrap_or_default();
        for part in prefix.split('/').chain(path.split('/')) {
            if !part.is_empty() {
                url.push('/');
                url.push_str(part);
            }
        }
        if url.is_empty() {
            url.push('/');
        }
        url
    }

    /// Sends `request`, retrying per the module's policy.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: RequestConfig) -> Result<Value, ApiError> {
        let url = self.resolve_url(&request.path);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.attempt(&request, &url).await {
                Ok(payload) => {
                    debug!(attempt, "Request ok");
                    return Ok(payload);
                }
                Err(e) if e.is_retryable() && attempt <= request.retry_budget => {
                    warn!(
                        attempt,
                        error = %e,
                        backoff_ms = self.backoff.as_millis() as u64,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Request failed");
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(&self, request: &RequestConfig, url: &str) -> Result<Value, ApiError> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if request.body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if request.requires_auth {
            if let Some(token) = self.bearer_token().await {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }

        let outgoing = TransportRequest {
            method: request.method,
            url: url.to_string(),
            path: request.path.clone(),
            headers,
            body: request.body.clone(),
        };

        let response = tokio::time::timeout(self.timeout, self.transport.send(outgoing))
            .await
            .map_err(|_| ApiError::Timeout)??;
        interpret(response)
    }

    /// The stored token, if any. A storage failure counts as "no token".
    async fn bearer_token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Could not read bearer token, sending unauthenticated");
                None
            }
        }
    }
}

/// Maps a completed exchange to a payload or an error.
fn interpret(response: TransportResponse) -> Result<Value, ApiError> {
    let parsed = if response.body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<Value>(&response.body) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(status = response.status, error = %e, "Unparseable response body");
                None
            }
        }
    };

    match response.status {
        401 => Err(ApiError::Unauthorized),
        status if status >= 400 => Err(ApiError::ServerRejected {
            status,
            message: parsed.as_ref().and_then(error_message),
        }),
        _ => Ok(parsed.unwrap_or_else(|| Value::Object(Map::new()))),
    }
}

fn error_message(body: &Value) -> Option<String> {
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::{FailingStore, MockTransport};
    use serde_json::json;

    fn config() -> ApiConfig {
        ApiConfig {
            mode: ApiMode::Real,
            base_url: "http://localhost:8002/".to_string(),
            path_prefix: None,
            timeout_ms: 1_000,
            backoff_ms: 200,
            retry_budget: 1,
        }
    }

    fn client(transport: &MockTransport) -> ApiClient {
        ApiClient::new(&config(), Arc::new(transport.clone()), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_resolve_url_trims_duplicate_slashes() {
        let mock = MockTransport::new();
        let mut cfg = config();
        cfg.path_prefix = Some("/api/".to_string());
        let api = ApiClient::new(&cfg, Arc::new(mock), Arc::new(MemoryStore::new()));
        assert_eq!(api.resolve_url("/orders/42"), "http://localhost:8002/api/orders/42");
        assert_eq!(api.resolve_url("//menu"), "http://localhost:8002/api/menu");

        cfg.base_url = String::new();
        cfg.path_prefix = None;
        let api = ApiClient::new(
            &cfg,
            Arc::new(MockTransport::new()),
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(api.resolve_url("orders"), "/orders");
        assert_eq!(api.resolve_url(""), "/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_is_never_retried() {
        let mock = MockTransport::new();
        mock.expect_request().return_status(401, json!({ "message": "nope" }));

        let err = client(&mock)
            .send(RequestConfig::get("/menu").with_retries(3))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Unauthorized);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_with_budget_one_makes_two_attempts() {
        let mock = MockTransport::new();
        mock.expect_request().hang();
        mock.expect_request().hang();

        let err = client(&mock)
            .send(RequestConfig::get("/menu").with_retries(1))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Timeout);
        assert_eq!(mock.call_count(), 2);
        mock.verify();
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_server_error() {
        let mock = MockTransport::new();
        mock.expect_request().return_status(503, json!({}));
        mock.expect_request().return_ok(json!({ "items": [] }));

        let started = tokio::time::Instant::now();
        let payload = client(&mock)
            .send(RequestConfig::get("/menu").with_retries(2))
            .await
            .unwrap();
        assert_eq!(payload, json!({ "items": [] }));
        assert_eq!(mock.call_count(), 2);
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_keep_their_class_after_exhaustion() {
        let mock = MockTransport::new();
        mock.expect_request().fail_unreachable("connection refused");
        mock.expect_request().fail_unreachable("connection refused");
        let err = client(&mock)
            .send(RequestConfig::get("/menu").with_retries(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NetworkUnreachable(_)));

        let mock = MockTransport::new();
        mock.expect_request().return_status(422, json!({ "error": "bad qty" }));
        let err = client(&mock)
            .send(RequestConfig::get("/menu").with_retries(5))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::ServerRejected {
                status: 422,
                message: Some("bad qty".into())
            }
        );
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_empty_payload() {
        let mock = MockTransport::new();
        mock.expect_request().return_raw(200, "<html>oops</html>");
        mock.expect_request().return_raw(204, "");
        mock.expect_request().return_raw(500, "<html>down</html>");

        let api = client(&mock);
        assert_eq!(api.send(RequestConfig::get("/a")).await.unwrap(), json!({}));
        assert_eq!(api.send(RequestConfig::get("/b")).await.unwrap(), json!({}));
        assert_eq!(
            api.send(RequestConfig::get("/c")).await.unwrap_err(),
            ApiError::ServerRejected {
                status: 500,
                message: None
            }
        );
    }

    #[tokio::test]
    async fn test_bearer_token_attached_when_present() {
        let mock = MockTransport::new();
        mock.expect_request().return_ok(json!({}));
        mock.expect_request().return_ok(json!({}));
        mock.expect_request().return_ok(json!({}));

        let store = MemoryStore::new();
        let api = ApiClient::new(&config(), Arc::new(mock.clone()), Arc::new(store.clone()));

        api.send(RequestConfig::get("/orders/1").authenticated()).await.unwrap();
        store.set(TOKEN_KEY, "abc").await.unwrap();
        api.send(RequestConfig::get("/orders/1").authenticated()).await.unwrap();
        api.send(RequestConfig::get("/menu")).await.unwrap();

        let seen = mock.requests();
        assert_eq!(seen[0].header("Authorization"), None);
        assert_eq!(seen[1].header("authorization"), Some("Bearer abc"));
        assert_eq!(seen[2].header("Authorization"), None);
        assert_eq!(seen[1].url, "http://localhost:8002/orders/1");
    }

    #[tokio::test]
    async fn test_token_read_failure_sends_unauthenticated() {
        let mock = MockTransport::new();
        mock.expect_request().return_ok(json!({}));
        let api = ApiClient::new(&config(), Arc::new(mock.clone()), Arc::new(FailingStore));

        api.send(RequestConfig::post("/orders", json!({ "items": [] })).authenticated())
            .await
            .unwrap();
        let seen = mock.requests();
        assert_eq!(seen[0].header("Authorization"), None);
        assert_eq!(seen[0].header("Content-Type"), Some("application/json"));
    }
}
