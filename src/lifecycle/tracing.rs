//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter for the
//! whole process. Module paths are hidden (`with_target(false)`); spans carry
//! the context instead:
//!
//! - **Requests**: `send{method=GET path=/orders/1700000000000}` with the
//!   attempt number on retries
//! - **Cart**: one span per mutation, with a `warn` when a write fails
//! - **Tracking**: `order_tracking{order_id=...}` around every fetch of one tracker
//!
//! `RUST_LOG` wins over the configured level:
//!
//! ```bash
//! # Configured level (log_level in the config file, default "info")
//! cargo run
//!
//! # Every request attempt and cart write
//! RUST_LOG=debug cargo run
//!
//! # Only the request layer
//! RUST_LOG=order_sync::clients=trace cargo run
//! ```
//!
//! With `RUST_LOG=debug` a tracked order reads like:
//!
//! ```text
//! INFO  order_tracking: Tracking started interval_ms=3000
//! DEBUG order_tracking: Fetching status seq=1 in_flight=0
//! INFO  order_tracking: Status updated status=QUEUED eta_minutes=12
//! DEBUG order_tracking: Fetching status seq=4 in_flight=0
//! INFO  order_tracking: Status updated status=IN_PROGRESS eta_minutes=8
//! INFO  order_tracking: Tracking stopped status=Some(Completed) alive=true
//! ```

use tracing_subscriber::EnvFilter;

/// Initializes the global subscriber. Call once, before anything logs.
pub fn setup_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
