//! User-facing notifications
//!
//! `Notifier` and `Navigator` are the hooks the front end injects. The
//! dispatcher never talks to a `Notifier` directly; it goes through
//! `DebouncedNotifier`, which drops a message identical to the one shown
//! within the last window so a burst of failing requests produces one toast.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Displays error messages to the user
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Moves the user to another entry point (the login screen on auto-logout)
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

#[derive(Debug)]
struct LastShown {
    message: String,
    at: Instant,
}

/// Suppresses duplicate error messages within a fixed window
pub struct DebouncedNotifier {
    notifier: Option<Arc<dyn Notifier>>,
    window: Duration,
    last: Mutex<Option<LastShown>>,
}

impl DebouncedNotifier {
    pub fn new(notifier: Option<Arc<dyn Notifier>>, window: Duration) -> Self {
        Self {
            notifier,
            window,
            last: Mutex::new(None),
        }
    }

    /// Show `message` unless it was already shown within the window.
    /// Returns whether the message was displayed.
    pub fn show(&self, message: &str) -> bool {
        let now = Instant::now();
        {
            let mut last = self.last.lock();
            if let Some(prev) = last.as_ref() {
                if prev.message == message && now.duration_since(prev.at) < self.window {
                    tracing::debug!("Suppressed duplicate notification: {}", message);
                    return false;
                }
            }
            *last = Some(LastShown {
                message: message.to_string(),
                at: now,
            });
        }

        match &self.notifier {
            Some(notifier) => notifier.error(message),
            None => tracing::warn!("{}", message),
        }
        true
    }
}

impl std::fmt::Debug for DebouncedNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedNotifier")
            .field("has_notifier", &self.notifier.is_some())
            .field("window", &self.window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::RecordingNotifier;

    fn debouncer(notifier: &Arc<RecordingNotifier>) -> DebouncedNotifier {
        DebouncedNotifier::new(Some(notifier.clone()), Duration::from_millis(5000))
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_within_window_is_suppressed() {
        let notifier = Arc::new(RecordingNotifier::default());
        let debounce = debouncer(&notifier);

        assert!(debounce.show("X"));
        tokio::time::advance(Duration::from_millis(4999)).await;
        assert!(!debounce.show("X"));
        assert_eq!(notifier.messages(), vec!["X"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shown_again_after_window() {
        let notifier = Arc::new(RecordingNotifier::default());
        let debounce = debouncer(&notifier);

        assert!(debounce.show("X"));
        assert!(!debounce.show("X"));
        tokio::time::advance(Duration::from_millis(5001)).await;
        assert!(debounce.show("X"));
        assert_eq!(notifier.messages(), vec!["X", "X"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_message_is_shown_immediately() {
        let notifier = Arc::new(RecordingNotifier::default());
        let debounce = debouncer(&notifier);

        assert!(debounce.show("X"));
        assert!(debounce.show("Y"));
        // "X" is no longer the last message, so it shows again
        assert!(debounce.show("X"));
        assert_eq!(notifier.messages(), vec!["X", "Y", "X"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppressed_call_does_not_extend_window() {
        let notifier = Arc::new(RecordingNotifier::default());
        let debounce = debouncer(&notifier);

        assert!(debounce.show("X"));
        tokio::time::advance(Duration::from_millis(3000)).await;
        assert!(!debounce.show("X"));
        tokio::time::advance(Duration::from_millis(2001)).await;
        assert!(debounce.show("X"));
    }

    #[tokio::test]
    async fn test_missing_notifier_degrades_to_log() {
        let debounce = DebouncedNotifier::new(None, Duration::from_millis(5000));
        assert!(debounce.show("nobody is listening"));
        assert!(!debounce.show("nobody is listening"));
    }
}
