//! # Cart Actor
//!
//! The task that owns the cart.
//!
//! ## Concurrency Model
//! The actor processes [`CartRequest`]s one at a time from its channel, so it
//! is the single writer of [`CartState`]. Every mutation is computed from the
//! latest in-memory lines, never from a snapshot the caller holds.
//!
//! ## Persistence
//! After each mutation the resulting lines go to a single background writer
//! task. Writes are best effort: a failure is logged and dropped, and the
//! in-memory state stays authoritative. The stored copy may lag but always
//! ends up at the latest lines. [`CartRequest::Flush`] waits
//! until it has.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::writer::SnapshotWriter;
use crate::cart::{self, snapshot};
use crate::model::{CartItem, CartLine, CartState, OrderRequest};
use crate::storage::KeyValueStore;

/// One-shot reply channel.
pub type Response<T> = oneshot::Sender<T>;

/// A change to the cart's lines.
#[derive(Debug, Clone, PartialEq)]
pub enum CartCommand {
    Add(CartItem),
    Increase(String),
    Decrease(String),
    Clear,
    /// Takes the quantities of a placed order out of the cart.
    RemoveOrdered(OrderRequest),
}

impl CartCommand {
    fn apply(self, lines: &[CartLine]) -> Vec<CartLine> {
        match self {
            CartCommand::Add(item) => cart::upsert(lines, item),
            CartCommand::Increase(id) => cart::increase(lines, &id),
            CartCommand::Decrease(id) => cart::decrease(lines, &id),
            CartCommand::Clear => cart::clear(),
            CartCommand::RemoveOrdered(order) => cart::subtract(lines, &order),
        }
    }
}

/// Messages understood by the [`CartActor`].
#[derive(Debug)]
pub enum CartRequest {
    Mutate {
        command: CartCommand,
        respond_to: Response<Vec<CartLine>>,
    },
    Get {
        respond_to: Response<CartState>,
    },
    Hydrate {
        respond_to: Response<Vec<CartLine>>,
    },
    Flush {
        respond_to: Response<()>,
    },
}

pub struct CartActor {
    receiver: mpsc::Receiver<CartRequest>,
    store: Arc<dyn KeyValueStore>,
    state: CartState,
    /// Set by the first mutation; a later hydrate must not clobber it.
    mutated: bool,
}

impl CartActor {
    pub fn new(receiver: mpsc::Receiver<CartRequest>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            receiver,
            store,
            state: CartState::default(),
            mutated: false,
        }
    }

    /// Runs the actor's event loop until every client is dropped.
    pub async fn run(mut self) {
        info!("Cart actor started");
        let mut writer = SnapshotWriter::spawn(self.store.clone());

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CartRequest::Mutate {
                    command,
                    respond_to,
                } => {
                    debug!(?command, "Mutate");
                    self.state.lines = command.apply(&self.state.lines);
                    self.mutated = true;
                    writer.submit(self.state.lines.clone());
                    let _ = respond_to.send(self.state.lines.clone());
                }
                CartRequest::Get { respond_to } => {
                    let _ = respond_to.send(self.state.clone());
                }
                CartRequest::Hydrate { respond_to } => {
                    self.hydrate().await;
                    let _ = respond_to.send(self.state.lines.clone());
                }
                CartRequest::Flush { respond_to } => {
                    writer.flush().await;
                    let _ = respond_to.send(());
                }
            }
        }

        writer.shutdown().await;
        info!(lines = self.state.lines.len(), "Cart actor shutdown");
    }

    async fn hydrate(&mut self) {
        if self.state.hydrated {
            debug!("Already hydrated");
            return;
        }
        self.state.hydrated = true;
        if self.mutated {
            info!(
                lines = self.state.lines.len(),
                "Cart changed before hydrate, keeping in-memory lines"
            );
            return;
        }

        let restored = match self.store.get(snapshot::CART_KEY).await {
            Ok(Some(raw)) => snapshot::decode(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Could not read stored cart, starting empty");
                Vec::new()
            }
        };
        info!(lines = restored.len(), "Cart hydrated");
        self.state.lines = restored;
    }
}
