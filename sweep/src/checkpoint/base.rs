use std::future::Future;

use crate::error::SweepResult;
use crate::types::ItemKey;

/// Trait for storing and retrieving the checkpoint of a sweep.
///
/// A checkpoint is a single key naming the last item known to have been enqueued. It is read
/// once at startup and overwritten wholesale on every write.
pub trait CheckpointStore {
    /// Returns the stored checkpoint, or `None` if the sweep has to start from the beginning.
    fn read(&self) -> impl Future<Output = SweepResult<Option<ItemKey>>> + Send;

    /// Replaces the stored checkpoint with `key`.
    fn write(&self, key: &ItemKey) -> impl Future<Output = SweepResult<()>> + Send;
}
