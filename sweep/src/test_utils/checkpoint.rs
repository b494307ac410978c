use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::checkpoint::CheckpointStore;
use crate::error::{ErrorKind, SweepResult};
use crate::types::ItemKey;
use crate::{bail, sweep_error};

/// Checkpoint store whose writes always fail.
///
/// Reads return the checkpoint it was created with, or fail when built with
/// [`FailingCheckpointStore::unreadable`].
#[derive(Debug, Clone)]
pub struct FailingCheckpointStore {
    checkpoint: Option<ItemKey>,
    fail_reads: bool,
    write_attempts: Arc<AtomicUsize>,
}

impl FailingCheckpointStore {
    pub fn new(checkpoint: Option<ItemKey>) -> Self {
        Self {
            checkpoint,
            fail_reads: false,
            write_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unreadable() -> Self {
        Self {
            fail_reads: true,
            ..Self::new(None)
        }
    }

    /// Returns how many writes were attempted.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

impl CheckpointStore for FailingCheckpointStore {
    async fn read(&self) -> SweepResult<Option<ItemKey>> {
        if self.fail_reads {
            bail!(
                ErrorKind::CheckpointReadFailed,
                "Injected checkpoint read failure"
            );
        }

        Ok(self.checkpoint.clone())
    }

    async fn write(&self, key: &ItemKey) -> SweepResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);

        Err(sweep_error!(
            ErrorKind::CheckpointWriteFailed,
            "Injected checkpoint write failure",
            format!("key: '{key}'")
        ))
    }
}
