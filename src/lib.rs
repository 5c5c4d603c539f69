//! # order-sync
//!
//! > **The client-side core of a canteen ordering app.**
//!
//! Browse a menu, keep a cart that survives restarts, place an order and follow
//! it to completion. Everything here is UI-agnostic: a presentation layer owns an
//! [`OrderApp`](lifecycle::OrderApp), calls its clients and renders the state it
//! publishes.
//!
//! ## 🏗️ Design
//!
//! ### 1. One Writer per Piece of State
//! The cart lives inside a single actor task ([`cart_actor`]). Every mutation is
//! a message, so concurrent callers can never interleave a read-modify-write.
//! Each change is persisted fire-and-forget: a failed write is logged and the
//! in-memory cart stays authoritative.
//!
//! ### 2. Failures Are Values
//! The request layer never panics and never throws away the failure class.
//! [`ApiError`](clients::ApiError) tells a timeout from an unreachable backend,
//! a rejected session (401) and a server rejection. Only transient classes are
//! retried.
//!
//! ### 3. Swappable Seams
//! Transport ([`transport::Transport`]), storage ([`storage::KeyValueStore`])
//! and time ([`clock::Clock`]) are traits. The same client code runs against
//! the real backend or the in-process simulator, and tests substitute all three.
//!
//! ### 4. Observability
//! `tracing` spans wrap each request, cart mutation and tracker. See the
//! [`lifecycle::tracing`] module.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. Data ([`model`], [`cart`])
//! Wire types for the menu, orders and sessions, plus the pure cart functions
//! (upsert, increase, decrease, total) and the persisted snapshot format.
//!
//! ### 2. State ([`cart_actor`], [`tracker`])
//! - **Cart**: [`CartClient`](cart_actor::CartClient) is the handle the screens call.
//! - **Tracking**: [`OrderTracker`](tracker::OrderTracker) polls one order until
//!   it is ready for pickup, completed or cancelled, publishing a
//!   [`TrackingState`](tracker::TrackingState) on every change.
//!
//! ### 3. Requests ([`clients`], [`transport`])
//! [`ApiClient`](clients::ApiClient) adds base URL, bearer token, timeout and retry
//! to every call. [`OrderClient`](clients::OrderClient) and
//! [`SessionClient`](clients::SessionClient) are the typed endpoints.
//!
//! ### 4. Wiring ([`lifecycle`], [`config`], [`notify`])
//! [`OrderApp`](lifecycle::OrderApp) builds everything from an
//! [`AppConfig`](config::AppConfig) and shuts it down cleanly.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Simulated backend, info logs
//! cargo run
//!
//! # A real backend
//! ORDER_SYNC_API_MODE=real ORDER_SYNC_API_BASE_URL=http://localhost:8002 cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```
//!
//! See [`testing`] for the scripted transport used throughout the tests.

pub mod cart;
pub mod cart_actor;
pub mod clients;
pub mod clock;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod storage;
pub mod testing;
pub mod tracker;
pub mod transport;
