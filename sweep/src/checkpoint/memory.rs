use std::sync::Arc;

use tokio::sync::Mutex;

use crate::checkpoint::CheckpointStore;
use crate::error::SweepResult;
use crate::types::ItemKey;

#[derive(Debug, Default)]
struct Inner {
    current: Option<ItemKey>,
    writes: Vec<ItemKey>,
}

/// In-memory checkpoint store keeping the history of every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `key`, as left behind by an earlier run.
    pub fn with_checkpoint(key: impl Into<ItemKey>) -> Self {
        let inner = Inner {
            current: Some(key.into()),
            writes: Vec::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub async fn current(&self) -> Option<ItemKey> {
        let inner = self.inner.lock().await;
        inner.current.clone()
    }

    /// Returns every key written so far, oldest first.
    pub async fn writes(&self) -> Vec<ItemKey> {
        let inner = self.inner.lock().await;
        inner.writes.clone()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    async fn read(&self) -> SweepResult<Option<ItemKey>> {
        Ok(self.current().await)
    }

    async fn write(&self, key: &ItemKey) -> SweepResult<()> {
        let mut inner = self.inner.lock().await;
        inner.current = Some(key.clone());
        inner.writes.push(key.clone());

        Ok(())
    }
}
