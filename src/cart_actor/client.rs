use tokio::sync::{mpsc, oneshot};
use tracing::instrument;

use super::{CartCommand, CartError, CartRequest};
use crate::cart;
use crate::model::{CartItem, CartLine, CartState, OrderRequest};

/// Handle to the cart actor: what the presentation layer calls.
///
/// Mutations return the lines as they are after the change. Calls only fail if
/// the actor task is gone.
#[derive(Clone, Debug)]
pub struct CartClient {
    sender: mpsc::Sender<CartRequest>,
}

impl CartClient {
    pub fn new(sender: mpsc::Sender<CartRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> CartRequest,
    ) -> Result<T, CartError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CartError::ActorClosed)?;
        response.await.map_err(|_| CartError::ActorDropped)
    }

    async fn mutate(&self, command: CartCommand) -> Result<Vec<CartLine>, CartError> {
        self.request(|respond_to| CartRequest::Mutate {
            command,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, item))]
    pub async fn add(&self, item: impl Into<CartItem>) -> Result<Vec<CartLine>, CartError> {
        self.mutate(CartCommand::Add(item.into())).await
    }

    #[instrument(skip(self))]
    pub async fn inc(&self, id: &str) -> Result<Vec<CartLine>, CartError> {
        self.mutate(CartCommand::Increase(id.to_string())).await
    }

    #[instrument(skip(self))]
    pub async fn dec(&self, id: &str) -> Result<Vec<CartLine>, CartError> {
        self.mutate(CartCommand::Decrease(id.to_string())).await
    }

    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Vec<CartLine>, CartError> {
        self.mutate(CartCommand::Clear).await
    }

    /// Removes what `order` covers, keeping anything added since it was taken.
    #[instrument(skip(self, order))]
    pub async fn remove_ordered(&self, order: &OrderRequest) -> Result<Vec<CartLine>, CartError> {
        self.mutate(CartCommand::RemoveOrdered(order.clone())).await
    }

    pub async fn state(&self) -> Result<CartState, CartError> {
        self.request(|respond_to| CartRequest::Get { respond_to }).await
    }

    pub async fn lines(&self) -> Result<Vec<CartLine>, CartError> {
        Ok(self.state().await?.lines)
    }

    pub async fn total(&self) -> Result<u64, CartError> {
        Ok(cart::total(&self.lines().await?))
    }

    /// Snapshot of the current lines as a `POST /orders` body.
    pub async fn order_request(&self) -> Result<OrderRequest, CartError> {
        Ok(cart::to_order_request(&self.lines().await?))
    }

    /// Loads the persisted cart. Never fails on bad or missing data.
    #[instrument(skip(self))]
    pub async fn hydrate(&self) -> Result<Vec<CartLine>, CartError> {
        self.request(|respond_to| CartRequest::Hydrate { respond_to })
            .await
    }

    /// Waits until every write issued so far has finished.
    pub async fn flush(&self) -> Result<(), CartError> {
        self.request(|respond_to| CartRequest::Flush { respond_to })
            .await
    }
}
