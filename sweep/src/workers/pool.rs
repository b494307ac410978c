use tracing::info;

use crate::collection::Collection;
use crate::concurrency::group::CancellationGroup;
use crate::concurrency::queue::WorkQueueRx;
use crate::workers::base::WorkerType;
use crate::workers::mutation::MutationWorker;

/// Fixed-size pool of [`MutationWorker`]s sharing one work queue.
///
/// The size never changes during a run.
#[derive(Debug, Clone, Copy)]
pub struct MutationWorkerPool {
    size: u16,
}

impl MutationWorkerPool {
    pub fn new(size: u16) -> Self {
        Self { size }
    }

    /// Spawns every worker of the pool into `group`.
    pub fn spawn<C>(&self, group: &mut CancellationGroup, collection: &C, queue_rx: &WorkQueueRx)
    where
        C: Collection + Clone + Send + Sync + 'static,
    {
        for worker_id in 0..self.size {
            let worker = MutationWorker::new(
                worker_id,
                collection.clone(),
                queue_rx.clone(),
                group.shutdown_tx().subscribe(),
            );

            group.spawn(WorkerType::Mutation { worker_id }, worker.run());
        }

        info!(workers = self.size, "spawned mutation worker pool");
    }
}
