//! # Order Tracking
//!
//! Polls one order's status until it reaches a terminal state.
//!
//! [`OrderTracker::start`] spawns a single task that fetches immediately and
//! then once per interval. Ticks spawn their fetch instead of awaiting it, so
//! a slow fetch never delays the next tick; results older than the newest
//! applied one are dropped. Reaching a terminal status ends the task, which
//! aborts any fetch still in flight.
//!
//! Disposal clears a liveness flag captured when the task started and aborts
//! the task. Nothing resolving afterwards can touch the state.

pub mod state;

pub use state::TrackingState;

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn, Instrument};

use crate::clients::ApiError;
use crate::model::{OrderRecord, OrderStatus};

/// Where the tracker gets an order's current state from.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    async fn fetch_status(&self, order_id: &str) -> Result<OrderRecord, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Time between scheduled fetches.
    pub interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
        }
    }
}

/// Handle to a running tracker. Dropping it disposes the tracker.
#[derive(Debug)]
pub struct OrderTracker {
    order_id: String,
    state: watch::Receiver<TrackingState>,
    retry: mpsc::Sender<()>,
    alive: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl OrderTracker {
    /// Starts tracking `order_id`. Must be called inside a Tokio runtime.
    pub fn start<S: StatusSource>(
        source: Arc<S>,
        order_id: impl Into<String>,
        config: TrackerConfig,
    ) -> Self {
        let order_id = order_id.into();
        let (state_tx, state_rx) = watch::channel(TrackingState::new(order_id.clone()));
        let (retry_tx, retry_rx) = mpsc::channel(1);
        let alive = Arc::new(AtomicBool::new(true));

        let poller = Poller {
            source,
            order_id: order_id.clone(),
            interval: config.interval,
            state: state_tx,
            alive: alive.clone(),
            issued: 0,
            applied: 0,
        };
        let span = tracing::info_span!("order_tracking", order_id = %order_id);
        let task = tokio::spawn(poller.run(retry_rx).instrument(span));

        Self {
            order_id,
            state: state_rx,
            retry: retry_tx,
            alive,
            task,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// The current state.
    pub fn state(&self) -> TrackingState {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> Option<OrderStatus> {
        self.state.borrow().status
    }

    pub fn eta_minutes(&self) -> Option<u32> {
        self.state.borrow().eta_minutes
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// A receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        self.state.clone()
    }

    /// Requests an out-of-schedule fetch. Returns `false` once the tracker has
    /// stopped (terminal or disposed).
    pub fn retry_now(&self) -> bool {
        if !self.is_active() {
            return false;
        }
        match self.retry.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }

    /// Whether polling is still running.
    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    /// Waits for a terminal state. Returns `None` if the tracker stopped first.
    pub async fn wait_terminal(&self) -> Option<TrackingState> {
        let mut rx = self.state.clone();
        let state = rx.wait_for(TrackingState::is_terminal).await.ok()?;
        Some(state.clone())
    }

    /// Stops polling. Results resolving after this are ignored.
    pub fn dispose(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            debug!(order_id = %self.order_id, "Tracker disposed");
        }
        self.task.abort();
    }
}

impl Drop for OrderTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

type FetchResult = (u64, Result<OrderRecord, ApiError>);

struct Poller<S> {
    source: Arc<S>,
    order_id: String,
    interval: Duration,
    state: watch::Sender<TrackingState>,
    alive: Arc<AtomicBool>,
    /// Sequence number of the last fetch issued.
    issued: u64,
    /// Sequence number of the last successful fetch applied.
    applied: u64,
}

impl<S: StatusSource> Poller<S> {
    async fn run(mut self, mut retry: mpsc::Receiver<()>) {
        info!(interval_ms = self.interval.as_millis() as u64, "Tracking started");
        let mut fetches: JoinSet<FetchResult> = JoinSet::new();
        self.issue(&mut fetches);

        let period = self.interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.issue(&mut fetches),
                Some(()) = retry.recv() => {
                    debug!("Manual retry");
                    self.issue(&mut fetches);
                }
                Some(joined) = fetches.join_next() => {
                    if !self.alive.load(Ordering::SeqCst) {
                        break;
                    }
                    match joined {
                        Ok((seq, result)) => {
                            if self.apply(seq, result) {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "Status fetch task failed"),
                    }
                }
            }
        }

        fetches.abort_all();
        let state = self.state.borrow();
        info!(
            status = ?state.status,
            alive = self.alive.load(Ordering::SeqCst),
            "Tracking stopped"
        );
    }

    fn issue(&mut self, fetches: &mut JoinSet<FetchResult>) {
        self.issued += 1;
        let seq = self.issued;
        let source = self.source.clone();
        let order_id = self.order_id.clone();
        debug!(seq, in_flight = fetches.len(), "Fetching status");
        fetches.spawn(
            async move { (seq, source.fetch_status(&order_id).await) }.in_current_span(),
        );
    }

    /// Applies one fetch outcome. Returns `true` once the order is terminal.
    fn apply(&mut self, seq: u64, result: Result<OrderRecord, ApiError>) -> bool {
        if seq < self.applied {
            debug!(seq, applied = self.applied, "Dropping stale result");
            return false;
        }
        match result {
            Ok(record) => {
                self.applied = seq;
                let changed = self.state.send_if_modified(|s| s.apply_record(&record));
                if changed {
                    info!(
                        status = %record.status,
                        eta_minutes = record.eta_minutes,
                        "Status updated"
                    );
                }
                record.status.is_terminal()
            }
            Err(e) => {
                warn!(seq, error = %e, "Status fetch failed");
                self.state.send_if_modified(|s| s.apply_error(&e));
                false
            }
        }
    }
}
