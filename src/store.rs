//! Persistence for past polls.
//!
//! The live session never waits on the store: saves run on a spawned task and
//! failures are only logged. History is read back through `GET /previous-polls`.

use crate::types::PollRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Poll store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Poll store data error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait PollStore: Send + Sync {
    async fn save(&self, record: PollRecord) -> Result<(), StoreError>;
    async fn list_all(&self) -> Result<Vec<PollRecord>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryPollStore {
    polls: Arc<RwLock<Vec<PollRecord>>>,
}

impl InMemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PollStore for InMemoryPollStore {
    async fn save(&self, record: PollRecord) -> Result<(), StoreError> {
        self.polls.write().await.push(record);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PollRecord>, StoreError> {
        Ok(self.polls.read().await.clone())
    }
}

/// Keeps all polls as a JSON array in a single file
#[derive(Debug)]
pub struct JsonFilePollStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFilePollStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<PollRecord>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PollStore for JsonFilePollStore {
    async fn save(&self, record: PollRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut polls = self.read_all().await?;
        polls.push(record);
        let json = serde_json::to_vec_pretty(&polls)?;

        // Write next to the target, then swap it in
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PollRecord>, StoreError> {
        self.read_all().await
    }
}
