//! # order-sync demo
//!
//! Walks one order through the client end to end:
//! 1. Signs in and loads the menu.
//! 2. Fills the cart (persisted to the configured store).
//! 3. Places the order and tracks it until it is ready, completed or cancelled.
//!
//! Runs against the in-process simulator unless `--mode real` (or
//! `ORDER_SYNC_API_MODE=real`) points it at a backend.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use order_sync::clock::SystemClock;
use order_sync::config::{ApiMode, AppConfig};
use order_sync::lifecycle::tracing::setup_tracing;
use order_sync::lifecycle::OrderApp;

#[derive(Parser, Debug)]
#[command(name = "order-sync", about = "Canteen ordering client demo")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "ORDER_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// simulated or real
    #[arg(long, env = "ORDER_SYNC_API_MODE")]
    mode: Option<ApiMode>,

    /// Backend base address (real mode)
    #[arg(long, env = "ORDER_SYNC_API_BASE_URL")]
    base_url: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,

    #[arg(long, default_value = "s100")]
    student_id: String,

    #[arg(long, default_value = "password")]
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.api.mode = mode;
    }
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    config.validate()?;

    setup_tracing(&config.log_level);
    info!(mode = ?config.api.mode, "Starting order-sync");

    let store = OrderApp::store_from_config(&config);
    let app = OrderApp::start(&config, store, Arc::new(SystemClock)).await;

    let user = app
        .login(&args.student_id, &args.password)
        .instrument(tracing::info_span!("login"))
        .await?;
    info!(student_id = %user.student_id, name = %user.name, "Signed in");

    let menu = app.orders.menu().await?;
    info!(items = menu.len(), "Menu loaded");

    for item in menu.iter().filter(|item| item.available).take(2) {
        app.add_to_cart(item).await?;
    }
    if let Some(first) = menu.iter().find(|item| item.available) {
        app.cart.inc(&first.id).await?;
    }
    info!(total = app.cart.total().await?, "Cart ready");

    let order = app
        .place_order()
        .instrument(tracing::info_span!("place_order"))
        .await?;
    info!(order_id = %order.order_id, status = %order.status, "Order placed");

    let tracker = app.track(&order.order_id);
    let mut updates = tracker.subscribe();
    let finished = loop {
        if updates.changed().await.is_err() {
            break None;
        }
        let state = updates.borrow_and_update().clone();
        if let Some(error) = &state.error {
            warn!(error = %error, "Tracking error");
            if state.reauth_required {
                break None;
            }
        }
        if state.is_terminal() {
            break Some(state);
        }
    };
    tracker.dispose();

    let outcome = match finished {
        Some(state) => state,
        None => bail!("tracking of order {} stopped early", order.order_id),
    };
    info!(status = ?outcome.status, "Order finished");

    app.shutdown().await?;
    Ok(())
}
