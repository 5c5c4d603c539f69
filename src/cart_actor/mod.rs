//! The cart engine's persistence wrapper: an actor owning [`CartState`](crate::model::CartState).

pub mod actor;
pub mod client;
pub mod error;
mod writer;

pub use actor::*;
pub use client::*;
pub use error::*;

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::storage::KeyValueStore;

/// Creates a new cart actor and its client.
pub fn new(store: Arc<dyn KeyValueStore>) -> (CartActor, CartClient) {
    let (sender, receiver) = mpsc::channel(32);
    (CartActor::new(receiver, store), CartClient::new(sender))
}

/// Creates a cart actor, spawns it, and returns its client.
pub fn spawn(store: Arc<dyn KeyValueStore>) -> (CartClient, tokio::task::JoinHandle<()>) {
    let (actor, client) = new(store);
    (client, tokio::spawn(actor.run()))
}
