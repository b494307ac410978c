use metrics::counter;
use tracing::{debug, error};

use crate::collection::Collection;
use crate::concurrency::queue::WorkQueueRx;
use crate::concurrency::shutdown::{ShutdownResult, ShutdownRx};
use crate::error::{ErrorKind, SweepError, SweepResult};
use crate::failpoints::{WORKER_BEFORE_MUTATE, sweep_fail_point};
use crate::metrics::{
    ERROR_KIND_LABEL, SWEEP_MUTATION_FAILURES_TOTAL, SWEEP_MUTATIONS_TOTAL, WORKER_ID_LABEL,
};
use crate::sweep_error;
use crate::types::ItemKey;

/// A task draining the work queue and applying the mutation to every key it receives.
///
/// Every received key is attempted once. The worker never retries: the first failed mutation
/// ends the worker and, through the cancellation group, the whole pipeline.
#[derive(Debug)]
pub struct MutationWorker<C> {
    worker_id: u16,
    collection: C,
    queue_rx: WorkQueueRx,
    shutdown_rx: ShutdownRx,
}

impl<C> MutationWorker<C>
where
    C: Collection + Send + Sync + 'static,
{
    pub fn new(
        worker_id: u16,
        collection: C,
        queue_rx: WorkQueueRx,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            worker_id,
            collection,
            queue_rx,
            shutdown_rx,
        }
    }

    /// Runs until the queue is closed and drained, the signal is raised or a mutation fails.
    pub async fn run(mut self) -> SweepResult<()> {
        debug!(worker_id = self.worker_id, "starting mutation worker");

        loop {
            let key = match self.queue_rx.recv(&mut self.shutdown_rx).await {
                ShutdownResult::Ok(Some(key)) => key,
                ShutdownResult::Ok(None) => {
                    debug!(worker_id = self.worker_id, "work queue closed, stopping worker");
                    return Ok(());
                }
                ShutdownResult::Shutdown(()) => return Err(self.cancelled(None)),
            };

            if self.shutdown_rx.is_shutdown() {
                return Err(self.cancelled(Some(&key)));
            }

            sweep_fail_point(WORKER_BEFORE_MUTATE)?;

            let result = tokio::select! {
                biased;

                // Dropping the in-flight call cancels it.
                _ = self.shutdown_rx.wait_for_shutdown() => {
                    return Err(self.cancelled(Some(&key)));
                }

                result = self.collection.mutate(&key) => result,
            };

            if let Err(err) = result {
                return Err(self.mutation_failed(&key, err));
            }

            counter!(SWEEP_MUTATIONS_TOTAL, WORKER_ID_LABEL => self.worker_id.to_string())
                .increment(1);
        }
    }

    fn cancelled(&self, key: Option<&ItemKey>) -> SweepError {
        debug!(worker_id = self.worker_id, "mutation worker cancelled");

        match key {
            Some(key) => sweep_error!(
                ErrorKind::Cancelled,
                "Mutation worker was cancelled",
                format!("key '{key}' was received but not mutated")
            ),
            None => sweep_error!(ErrorKind::Cancelled, "Mutation worker was cancelled"),
        }
    }

    fn mutation_failed(&self, key: &ItemKey, err: SweepError) -> SweepError {
        error!(worker_id = self.worker_id, %key, error = %err, "mutation failed");
        counter!(
            SWEEP_MUTATION_FAILURES_TOTAL,
            ERROR_KIND_LABEL => format!("{:?}", err.kind())
        )
        .increment(1);

        if err.kind() == ErrorKind::MutationFailed {
            return err;
        }

        sweep_error!(
            ErrorKind::MutationFailed,
            "Mutation failed",
            format!("key: '{key}'"),
            source: err
        )
    }
}
