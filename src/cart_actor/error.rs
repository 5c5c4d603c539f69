//! Error types for the cart actor.

use thiserror::Error;

/// The cart actor could not be reached.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    #[error("Cart actor closed")]
    ActorClosed,
    #[error("Cart actor dropped response channel")]
    ActorDropped,
}
