//! Exit-time autosave around a [`SessionStore`].
//!
//! The host process registers [`AutosaveController::flush_and_close`] as its
//! shutdown hook. The hook may fire more than once (for example a Ctrl-C
//! arriving while the normal exit path runs); only the first call saves.

use super::naming::auto_save_name;
use super::store::SessionStore;
use crate::config::AutosaveConfig;
use crate::error::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// Lifecycle wrapper that saves the active session on exit.
pub struct AutosaveController {
    store: Mutex<SessionStore>,
    enabled: AtomicBool,
    closed: AtomicBool,
}

impl AutosaveController {
    /// Wraps `store` using the enable flag from `config`.
    pub fn new(store: SessionStore, config: &AutosaveConfig) -> Self {
        Self {
            store: Mutex::new(store),
            enabled: AtomicBool::new(config.enabled),
            closed: AtomicBool::new(false),
        }
    }

    /// Locks the wrapped store for foreground use.
    pub async fn store(&self) -> MutexGuard<'_, SessionStore> {
        self.store.lock().await
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!(
            "Autosave {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Flips the enable flag and returns the new value.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        tracing::info!(
            "Autosave {}",
            if enabled { "enabled" } else { "disabled" }
        );
        enabled
    }

    /// True once `flush_and_close` has run.
    pub fn has_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Saves the session one last time if autosave applies.
    ///
    /// A save happens when autosave is enabled, the history is non-empty and
    /// the session has unsaved changes. The session keeps its current name,
    /// or gets `auto_save_<unixTimestamp>` if it never had one.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(path))`: Session written
    /// - `Ok(None)`: Nothing to do, or another call already ran
    /// - `Err(_)`: The save failed
    pub async fn flush_and_close(&self) -> Result<Option<PathBuf>> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Exit save already ran, skipping");
            return Ok(None);
        }

        if !self.is_enabled() {
            tracing::debug!("Autosave disabled, not saving on exit");
            return Ok(None);
        }

        let mut store = self.store.lock().await;
        if store.is_empty() || !store.needs_save() {
            return Ok(None);
        }

        let name = store
            .session_name()
            .map(str::to_string)
            .unwrap_or_else(|| auto_save_name(Utc::now().timestamp()));

        tracing::info!("Autosaving session '{}' on exit", name);
        store.save(&name).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::MessageRole;
    use crate::session::store::SaveState;
    use crate::session::test_support::MockSessionRepository;
    use std::sync::Arc;

    fn make_controller(enabled: bool) -> (AutosaveController, Arc<MockSessionRepository>) {
        let repo = Arc::new(MockSessionRepository::new());
        let store = SessionStore::new(repo.clone());
        (
            AutosaveController::new(store, &AutosaveConfig { enabled }),
            repo,
        )
    }

    #[tokio::test]
    async fn test_exit_save_uses_generated_name() {
        let (controller, repo) = make_controller(true);
        controller
            .store()
            .await
            .add_message(MessageRole::User, "remember this");

        let path = controller.flush_and_close().await.unwrap().unwrap();

        assert!(path.to_string_lossy().starts_with("auto_save_"));
        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.store().await.state(), SaveState::Idle);
    }

    #[tokio::test]
    async fn test_exit_save_reuses_session_name() {
        let (controller, repo) = make_controller(true);
        {
            let mut store = controller.store().await;
            store.add_message(MessageRole::User, "one");
            store.save("daily").await.unwrap();
            store.add_message(MessageRole::Assistant, "two");
        }

        controller.flush_and_close().await.unwrap();

        assert_eq!(repo.sessions.lock().unwrap()["daily"].len(), 2);
        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exit_save_runs_once() {
        let (controller, repo) = make_controller(true);
        controller
            .store()
            .await
            .add_message(MessageRole::User, "only once");

        let first = controller.flush_and_close().await.unwrap();
        controller
            .store()
            .await
            .add_message(MessageRole::User, "late message");
        let second = controller.flush_and_close().await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert!(controller.has_closed());
        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overlapping_exit_signals_save_once() {
        let (controller, repo) = make_controller(true);
        controller
            .store()
            .await
            .add_message(MessageRole::User, "racing");

        let (a, b) = tokio::join!(controller.flush_and_close(), controller.flush_and_close());

        assert_eq!(
            [a.unwrap(), b.unwrap()].iter().filter(|r| r.is_some()).count(),
            1
        );
        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_or_clean_sessions_are_not_saved() {
        let (controller, repo) = make_controller(false);
        controller
            .store()
            .await
            .add_message(MessageRole::User, "not saved");
        assert!(controller.flush_and_close().await.unwrap().is_none());
        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 0);

        let (controller, repo) = make_controller(true);
        assert!(controller.flush_and_close().await.unwrap().is_none());
        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_clean_loaded_session_is_not_resaved() {
        let (controller, repo) = make_controller(true);
        {
            let mut store = controller.store().await;
            store.add_message(MessageRole::User, "saved already");
            store.save("kept").await.unwrap();
        }

        assert!(controller.flush_and_close().await.unwrap().is_none());
        assert_eq!(repo.save_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_toggle() {
        let (controller, _repo) = make_controller(true);
        assert!(!controller.toggle());
        assert!(!controller.is_enabled());
        assert!(controller.toggle());
        controller.set_enabled(false);
        assert!(!controller.is_enabled());
    }
}
