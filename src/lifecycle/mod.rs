//! # Application Lifecycle
//!
//! Wiring, startup and shutdown of the ordering client.
//!
//! [`OrderApp`] plays the part of the UI root: it builds one store and one request
//! layer, spawns the cart actor on top of them and hands out the clients the
//! screens call. Startup hydrates the cart from the store; shutdown flushes any
//! cart writes still in flight and waits for the actor task to finish.
//!
//! ```rust,ignore
//! setup_tracing(&config.log_level);
//! let store = OrderApp::store_from_config(&config);
//! let app = OrderApp::start(&config, store, Arc::new(SystemClock)).await;
//! // ...
//! app.shutdown().await?;
//! ```

mod app;
pub mod tracing;

pub use app::OrderApp;

use crate::cart_actor::CartError;
use crate::clients::{ApiError, SessionError};
use thiserror::Error;

/// Errors surfaced by [`OrderApp`] operations.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Cart unavailable: {0}")]
    Cart(#[from] CartError),

    #[error("{0} is unavailable")]
    Unavailable(String),

    #[error("Task failed: {0}")]
    Task(String),
}

impl AppError {
    /// Whether the user has to sign in again before retrying.
    pub fn requires_reauth(&self) -> bool {
        match self {
            AppError::Api(e) => e.requires_reauth(),
            AppError::Session(SessionError::Api(e)) => e.requires_reauth(),
            _ => false,
        }
    }
}
