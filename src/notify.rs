//! Short user-facing notices ("Added to cart", "Order placed").
//!
//! A publish/subscribe channel owned by the application root. Publishers hold
//! a cheap [`Notifier`] clone; the presentation layer subscribes and decides
//! how to render. Publishing with no subscriber is not an error.

use std::time::Duration;
use tokio::sync::broadcast;
use tracing::trace;

/// How long a notice stays on screen unless the subscriber decides otherwise.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(1400);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NoticeLevel::Error, message.into());
    }

    fn publish(&self, level: NoticeLevel, message: String) {
        let notice = Notice {
            level,
            message,
            ttl: DEFAULT_NOTICE_TTL,
        };
        let delivered = self.sender.send(notice).unwrap_or(0);
        trace!(delivered, "Notice published");
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(16)
    }
}
