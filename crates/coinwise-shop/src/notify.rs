//! # Notifications
//!
//! The speech seam. The session renders a phrase and hands it over; it
//! never waits for, inspects, or retries delivery.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  session ──notify("還差 5 元")──► LatestUtterance ──► speaker task      │
//! │                                       │                                 │
//! │  A new utterance replaces one the speaker has not picked up yet.       │
//! │  Nothing is queued.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::watch;

/// Fire-and-forget speech output.
pub trait Notifier: Send + Sync {
    /// Speaks `text`, cancelling anything still pending.
    fn notify(&self, text: &str);
}

/// Notifier that drops everything.
pub struct NoOpNotifier;

impl Notifier for NoOpNotifier {
    fn notify(&self, _text: &str) {}
}

// =============================================================================
// Latest Utterance
// =============================================================================

/// Single-slot notifier backed by a watch channel.
///
/// ## Example
/// ```rust
/// use coinwise_shop::notify::{LatestUtterance, Notifier};
///
/// let speaker = LatestUtterance::new();
/// let mut rx = speaker.subscribe();
/// speaker.notify("45元");
/// speaker.notify("50元");
/// // Only the newest utterance is waiting
/// assert_eq!(rx.try_take().as_deref(), Some("50元"));
/// assert_eq!(rx.try_take(), None);
/// ```
pub struct LatestUtterance {
    tx: watch::Sender<Option<String>>,
}

impl LatestUtterance {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        LatestUtterance { tx }
    }

    /// A receiver that only sees utterances sent after this call.
    pub fn subscribe(&self) -> UtteranceReceiver {
        UtteranceReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for LatestUtterance {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for LatestUtterance {
    fn notify(&self, text: &str) {
        // send_replace stores the value even with no receiver attached
        self.tx.send_replace(Some(text.to_string()));
    }
}

/// Consumer side of [`LatestUtterance`].
pub struct UtteranceReceiver {
    rx: watch::Receiver<Option<String>>,
}

impl UtteranceReceiver {
    /// Waits for the next utterance. Returns `None` once the notifier is gone.
    pub async fn next(&mut self) -> Option<String> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(text) = self.rx.borrow_and_update().clone() {
                return Some(text);
            }
        }
    }

    /// Takes the pending utterance without waiting.
    pub fn try_take(&mut self) -> Option<String> {
        match self.rx.has_changed() {
            Ok(true) => self.rx.borrow_and_update().clone(),
            _ => None,
        }
    }
}
