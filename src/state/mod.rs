pub mod directory;
pub mod router;
pub mod session;
pub mod tally;

use crate::config::ServerConfig;
use crate::store::{InMemoryPollStore, PollStore};
use crate::types::PollRecord;
use std::sync::Arc;
use tokio::sync::RwLock;

pub use directory::{Directory, DirectoryError, KickOutcome};
pub use router::{Delivery, Router};
pub use session::{AnswerOutcome, ClosedQuestion, IgnoreReason, OpenOutcome, Session};
pub use tally::Tally;

/// Shared state for the single live poll session.
///
/// Built once at startup and handed to every connection as `Arc<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub session: Arc<RwLock<Session>>,
    pub directory: Arc<RwLock<Directory>>,
    /// Outbound channels of all live connections
    pub router: Router,
    pub store: Arc<dyn PollStore>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn PollStore>) -> Self {
        Self {
            config,
            session: Arc::new(RwLock::new(Session::new())),
            directory: Arc::new(RwLock::new(Directory::new())),
            router: Router::new(),
            store,
        }
    }

    /// Save a poll record in the background; failures are logged and never
    /// reach the live session.
    pub(crate) fn persist_poll(&self, record: PollRecord) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let id = record.id.clone();
            match store.save(record).await {
                Ok(()) => tracing::debug!("Saved poll {}", id),
                Err(e) => tracing::error!("Failed to save poll {}: {}", id, e),
            }
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default(), Arc::new(InMemoryPollStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_state_is_idle_and_empty() {
        let state = AppState::default();

        assert!(!state.session.read().await.is_open());
        assert!(state.directory.read().await.participants().is_empty());
        assert_eq!(state.router.connection_count().await, 0);
        assert!(state.store.list_all().await.unwrap().is_empty());
    }
}
