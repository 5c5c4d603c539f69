use std::sync::Arc;

use order_sync::cart::snapshot::CART_KEY;
use order_sync::clients::{TOKEN_KEY, USER_KEY};
use order_sync::clock::ManualClock;
use order_sync::config::AppConfig;
use order_sync::lifecycle::OrderApp;
use order_sync::model::{CartItem, MenuItem};
use order_sync::storage::{FileStore, KeyValueStore};
use order_sync::testing::FailingStore;

const T0: u64 = 1_700_000_000_000;

fn config_in(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.dir = Some(dir.to_path_buf());
    config
}

async fn start(config: &AppConfig) -> OrderApp {
    let store = OrderApp::store_from_config(config);
    OrderApp::start(config, store, Arc::new(ManualClock::new(T0))).await
}

/// The cart survives an app restart through the file store.
#[tokio::test]
async fn test_cart_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let app = start(&config).await;
    app.cart.add(CartItem::new("1", "Chicken Burger", 120)).await.unwrap();
    app.cart.add(CartItem::new("4", "Water", 20)).await.unwrap();
    app.cart.inc("1").await.unwrap();
    app.cart.dec("4").await.unwrap();
    let before = app.cart.lines().await.unwrap();
    app.shutdown().await.unwrap();

    let app = start(&config).await;
    let after = app.cart.lines().await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].qty, 2);
    assert_eq!(app.cart.total().await.unwrap(), 240);
    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    FileStore::new(dir.path())
        .set(CART_KEY, "{ not json")
        .await
        .unwrap();

    let app = start(&config_in(dir.path())).await;
    assert!(app.cart.lines().await.unwrap().is_empty());

    // The next mutation replaces the broken snapshot.
    app.cart.add(CartItem::new("2", "Beef Burger", 150)).await.unwrap();
    app.shutdown().await.unwrap();

    let app = start(&config_in(dir.path())).await;
    assert_eq!(app.cart.lines().await.unwrap().len(), 1);
    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_logout_clears_session_and_cart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let store = FileStore::new(dir.path());

    let app = start(&config).await;
    app.login("s100", "secret").await.unwrap();
    assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("mock-token"));
    app.add_to_cart(&MenuItem {
        id: "1".into(),
        name: "Chicken Burger".into(),
        price: 120,
        available: true,
    })
    .await
    .unwrap();

    app.logout().await.unwrap();
    assert!(app.session.current_user().await.is_none());
    assert!(app.cart.lines().await.unwrap().is_empty());
    app.shutdown().await.unwrap();

    assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(USER_KEY).await.unwrap(), None);
    assert_eq!(store.get(CART_KEY).await.unwrap().as_deref(), Some("[]"));
}

/// A broken store never blocks the cart.
#[tokio::test]
async fn test_cart_works_without_storage() {
    let app = OrderApp::start(
        &AppConfig::default(),
        Arc::new(FailingStore),
        Arc::new(ManualClock::new(T0)),
    )
    .await;

    app.cart.add(CartItem::new("1", "Chicken Burger", 120)).await.unwrap();
    let lines = app.cart.add(CartItem::new("1", "Chicken Burger", 120)).await.unwrap();
    assert_eq!(lines[0].qty, 2);
    app.cart.flush().await.unwrap();
    assert_eq!(app.cart.total().await.unwrap(), 240);
    app.shutdown().await.unwrap();
}
