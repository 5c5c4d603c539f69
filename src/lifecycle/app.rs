use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use super::AppError;
use crate::cart_actor::{self, CartClient};
use crate::clients::{ApiClient, OrderClient, SessionClient};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::model::{CartLine, MenuItem, OrderRecord, UserProfile};
use crate::notify::Notifier;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::tracker::{OrderTracker, TrackerConfig};
use crate::transport::Transport;

/// The application root.
///
/// `OrderApp` is what a UI root would own:
/// - **Wiring**: one store, one request layer, the cart actor and the clients
///   built on them
/// - **Notices**: the [`Notifier`] the presentation layer subscribes to
/// - **Lifecycle**: hydrating the cart at startup and flushing it at shutdown
///
/// # Example
///
/// ```ignore
/// let app = OrderApp::start(&config, store, clock).await;
/// app.session.login("s100", "secret").await?;
/// let menu = app.orders.menu().await?;
/// app.add_to_cart(&menu[0]).await?;
/// let order = app.place_order().await?;
/// let tracker = app.track(&order.order_id);
/// tracker.wait_terminal().await;
/// app.shutdown().await?;
/// ```
pub struct OrderApp {
    /// The cart, owned by a single actor task.
    pub cart: CartClient,

    /// Menu and order endpoints.
    pub orders: Arc<OrderClient>,

    /// Sign-in state.
    pub session: SessionClient,

    /// Publish/subscribe channel for user-facing notices.
    pub notifier: Notifier,

    tracker_config: TrackerConfig,

    /// Task handles for running actors (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl OrderApp {
    /// Wires the app with the transport selected by `config.api.mode`.
    ///
    /// The cart is not hydrated yet; see [`OrderApp::start`].
    pub fn new(config: &AppConfig, store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let api = ApiClient::from_config(&config.api, &config.simulation, store.clone(), clock);
        Self::wire(config, store, api)
    }

    /// Wires the app over an explicit transport.
    pub fn with_transport(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let api = ApiClient::new(&config.api, transport, store.clone());
        Self::wire(config, store, api)
    }

    /// Creates the app and hydrates the cart before returning.
    pub async fn start(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let app = Self::new(config, store, clock);
        app.hydrate().await;
        app
    }

    fn wire(config: &AppConfig, store: Arc<dyn KeyValueStore>, api: ApiClient) -> Self {
        let (cart, cart_handle) = cart_actor::spawn(store.clone());
        info!(mode = ?api.mode(), "Order app wired");
        Self {
            cart,
            orders: Arc::new(OrderClient::new(api.clone())),
            session: SessionClient::new(api, store),
            notifier: Notifier::default(),
            tracker_config: TrackerConfig {
                interval: config.poll_interval(),
            },
            handles: vec![cart_handle],
        }
    }

    /// The store selected by `config.storage`.
    pub fn store_from_config(config: &AppConfig) -> Arc<dyn KeyValueStore> {
        match &config.storage.dir {
            Some(dir) => Arc::new(FileStore::new(dir)),
            None => Arc::new(MemoryStore::new()),
        }
    }

    /// Restores the persisted cart. Never fails; a broken snapshot means an empty cart.
    pub async fn hydrate(&self) -> Vec<CartLine> {
        match self.cart.hydrate().await {
            Ok(lines) => lines,
            Err(e) => {
                error!(error = %e, "Cart hydrate failed");
                Vec::new()
            }
        }
    }

    /// Adds one unit of a menu item to the cart.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn add_to_cart(&self, item: &MenuItem) -> Result<Vec<CartLine>, AppError> {
        if !item.available {
            self.notifier.error(format!("{} is unavailable", item.name));
            return Err(AppError::Unavailable(item.name.clone()));
        }
        let lines = self.cart.add(item).await?;
        self.notifier.info(format!("Added {}", item.name));
        Ok(lines)
    }

    /// Submits the current cart.
    ///
    /// Once the order is accepted, the submitted quantities leave the cart;
    /// lines added while the request was in flight stay.
    #[instrument(skip(self))]
    pub async fn place_order(&self) -> Result<OrderRecord, AppError> {
        let request = self.cart.order_request().await?;
        match self.orders.create_order(&request).await {
            Ok(record) => {
                self.cart.remove_ordered(&request).await?;
                self.notifier.info("Order placed");
                Ok(record)
            }
            Err(e) => {
                warn!(error = %e, "Order placement failed");
                self.notifier.error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Starts polling `order_id`. Dropping the tracker stops it.
    pub fn track(&self, order_id: &str) -> OrderTracker {
        OrderTracker::start(self.orders.clone(), order_id, self.tracker_config)
    }

    pub async fn login(&self, student_id: &str, password: &str) -> Result<UserProfile, AppError> {
        let user = self.session.login(student_id, password).await?;
        self.notifier.info(format!("Welcome, {}", user.name));
        Ok(user)
    }

    /// Signs out and empties the cart.
    pub async fn logout(&self) -> Result<(), AppError> {
        let cleared = self.cart.clear().await;
        self.session.logout().await?;
        cleared?;
        Ok(())
    }

    /// Flushes pending cart writes and waits for the cart actor to stop.
    pub async fn shutdown(self) -> Result<(), AppError> {
        info!("Shutting down...");
        if let Err(e) = self.cart.flush().await {
            warn!(error = %e, "Could not flush cart before shutdown");
        }

        // Dropping the last client closes the actor's channel.
        drop(self.cart);
        drop(self.session);
        drop(self.orders);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Actor task failed");
                return Err(AppError::Task(e.to_string()));
            }
        }

        info!("Shutdown complete.");
        Ok(())
    }
}
