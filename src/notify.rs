//! Fire-and-forget notification dispatch.
//!
//! Notifications are queued on a bounded channel and drained by a background
//! task. Delivery is best-effort: a full queue or a failed delivery is
//! logged and dropped, and can never block or roll back the financial
//! transition that produced it.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing::{info, warn};

use crate::model::UserId;

/// A message for the external notification channel.
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: UserId,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(recipient: UserId, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivery backend for the external push/WebSocket channel.
pub trait Notifier: Send + Sync {
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that only logs; stands in for the real delivery channel.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            recipient = notification.recipient,
            title = %notification.title,
            message = %notification.message,
            "notification delivered"
        );
        Ok(())
    }
}

/// Sending half of the notification queue.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    queue: mpsc::Sender<Notification>,
}

/// Create an unwired dispatcher and its queue, for callers that drive the
/// drain loop themselves.
pub fn channel(capacity: usize) -> (Dispatcher, mpsc::Receiver<Notification>) {
    let (queue, rx) = mpsc::channel(capacity);
    (Dispatcher { queue }, rx)
}

/// Drain the queue into a notifier until all senders are gone. Delivery
/// failures are logged and swallowed.
pub async fn run(rx: mpsc::Receiver<Notification>, notifier: impl Notifier) {
    let mut stream = ReceiverStream::new(rx);
    while let Some(notification) = stream.next().await {
        if let Err(e) = notifier.deliver(&notification) {
            warn!(recipient = notification.recipient, "{e}");
        }
    }
}

impl Dispatcher {
    /// Spawn the drain task on the current runtime and return the sender.
    pub fn spawn(notifier: impl Notifier + 'static) -> Self {
        let (dispatcher, rx) = channel(64);
        tokio::spawn(run(rx, notifier));
        dispatcher
    }

    /// Queue a notification without waiting. Dropped with a warning if the
    /// queue is full or the drain task is gone.
    pub fn dispatch(&self, notification: Notification) {
        if let Err(e) = self.queue.try_send(notification) {
            warn!("notification dropped: {e}");
        }
    }
}
