//! Forced session teardown

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::notify::{DebouncedNotifier, Navigator};
use crate::store::SessionStore;

/// Shown when a hard auth failure carries no description
pub const SESSION_EXPIRED_MESSAGE: &str = "세션이 만료되었습니다. 다시 로그인해주세요.";

/// Ends the session: notify, wait, wipe storage, navigate to login
pub struct AutoLogout {
    store: Arc<SessionStore>,
    notifier: Arc<DebouncedNotifier>,
    navigator: Option<Arc<dyn Navigator>>,
    login_route: String,
    delay: Duration,
    in_progress: AtomicBool,
}

impl AutoLogout {
    pub fn new(
        store: Arc<SessionStore>,
        notifier: Arc<DebouncedNotifier>,
        navigator: Option<Arc<dyn Navigator>>,
        login_route: impl Into<String>,
        delay: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            navigator,
            login_route: login_route.into(),
            delay,
            in_progress: AtomicBool::new(false),
        }
    }

    /// Tear the session down.
    ///
    /// Returns `false` when another teardown was already running; that call
    /// owns the notification and the redirect.
    pub async fn trigger(&self, description: Option<&str>) -> bool {
        let Some(_guard) = InProgress::acquire(&self.in_progress) else {
            tracing::debug!("Logout already in progress");
            return false;
        };

        let message = description.unwrap_or(SESSION_EXPIRED_MESSAGE);
        tracing::info!("Ending session: {}", message);
        self.notifier.show(message);

        tokio::time::sleep(self.delay).await;

        if let Err(e) = self.store.clear_session() {
            tracing::warn!("Failed to clear session storage: {}", e);
        }
        match &self.navigator {
            Some(navigator) => navigator.navigate(&self.login_route),
            None => tracing::info!("Session ended; continue at {}", self.login_route),
        }
        true
    }
}

/// Holds the teardown slot; released on drop, including when the trigger
/// future is cancelled mid-delay
struct InProgress<'a>(&'a AtomicBool);

impl<'a> InProgress<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for AutoLogout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoLogout")
            .field("login_route", &self.login_route)
            .field("delay", &self.delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SESSION_KEYS;
    use crate::tests::mocks::{RecordingNavigator, RecordingNotifier};
    use crate::tests::utils::test_helpers::seeded_store;

    fn build(
        store: Arc<SessionStore>,
    ) -> (AutoLogout, Arc<RecordingNotifier>, Arc<RecordingNavigator>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let debounce = Arc::new(DebouncedNotifier::new(
            Some(notifier.clone()),
            Duration::from_millis(5000),
        ));
        let logout = AutoLogout::new(
            store,
            debounce,
            Some(navigator.clone()),
            "/login",
            Duration::from_millis(1000),
        );
        (logout, notifier, navigator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_clears_every_key_and_navigates() {
        let store = seeded_store();
        let (logout, notifier, navigator) = build(store.clone());

        assert!(logout.trigger(Some("invalid token")).await);

        for key in SESSION_KEYS {
            assert!(!store.contains(key), "{} should be cleared", key);
        }
        assert_eq!(notifier.messages(), vec!["invalid token"]);
        assert_eq!(navigator.routes(), vec!["/login"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_precedes_teardown_by_delay() {
        let store = seeded_store();
        let (logout, notifier, navigator) = build(store.clone());
        let logout = Arc::new(logout);

        let task = tokio::spawn({
            let logout = logout.clone();
            async move { logout.trigger(None).await }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(notifier.messages(), vec![SESSION_EXPIRED_MESSAGE]);
        assert!(store.access_token().is_some());
        assert!(navigator.routes().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(task.await.unwrap());
        assert!(store.access_token().is_none());
        assert_eq!(navigator.routes(), vec!["/login"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_triggers_coalesce() {
        let store = seeded_store();
        let (logout, notifier, navigator) = build(store);

        let (first, second) = tokio::join!(logout.trigger(Some("a")), logout.trigger(Some("b")));
        assert!(first);
        assert!(!second);
        assert_eq!(notifier.messages(), vec!["a"]);
        assert_eq!(navigator.routes(), vec!["/login"]);

        // A later failure starts a fresh teardown
        assert!(logout.trigger(Some("c")).await);
        assert_eq!(navigator.routes().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_trigger_does_not_block_later_logout() {
        let store = seeded_store();
        let (logout, notifier, navigator) = build(store.clone());

        let cut_short =
            tokio::time::timeout(Duration::from_millis(500), logout.trigger(Some("a"))).await;
        assert!(cut_short.is_err());
        assert!(store.access_token().is_some());
        assert!(navigator.routes().is_empty());

        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(logout.trigger(Some("b")).await);
        assert_eq!(notifier.messages(), vec!["a", "b"]);
        assert_eq!(navigator.routes(), vec!["/login"]);
        assert!(store.access_token().is_none());
    }
}
