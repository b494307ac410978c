use metrics::counter;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::checkpoint::CheckpointStore;
use crate::collection::Collection;
use crate::concurrency::queue::WorkQueueTx;
use crate::concurrency::shutdown::{ShutdownResult, ShutdownRx};
use crate::error::SweepResult;
use crate::failpoints::{PRODUCER_BEFORE_ENQUEUE, sweep_fail_point};
use crate::metrics::SWEEP_ITEMS_ENQUEUED_TOTAL;
use crate::progress::ProgressReporter;
use crate::source::ItemSource;
use crate::types::ProgressSnapshot;

/// The single task listing the collection and feeding the work queue.
///
/// It is the only writer of the processed counter and, through its [`ProgressReporter`], of the
/// checkpoint. Both are updated right after a key is accepted by the queue.
#[derive(Debug)]
pub struct ProducerWorker<C, S> {
    source: ItemSource<C>,
    queue_tx: WorkQueueTx,
    reporter: ProgressReporter<S>,
    progress_tx: watch::Sender<ProgressSnapshot>,
    shutdown_rx: ShutdownRx,
}

impl<C, S> ProducerWorker<C, S>
where
    C: Collection + Send + Sync + 'static,
    S: CheckpointStore + Send + Sync + 'static,
{
    pub fn new(
        source: ItemSource<C>,
        queue_tx: WorkQueueTx,
        reporter: ProgressReporter<S>,
        progress_tx: watch::Sender<ProgressSnapshot>,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            source,
            queue_tx,
            reporter,
            progress_tx,
            shutdown_rx,
        }
    }

    /// Runs until the collection is exhausted, the signal is raised or an error occurs.
    ///
    /// Stopping because of the cancellation signal is not an error for the producer. The work
    /// queue is closed when this returns, in every case.
    pub async fn run(mut self) -> SweepResult<()> {
        info!("starting producer");

        let started_at = Instant::now();
        let mut snapshot = self.progress_tx.borrow().clone();

        while !self.source.is_exhausted() {
            let page = tokio::select! {
                biased;

                _ = self.shutdown_rx.wait_for_shutdown() => {
                    info!(processed = snapshot.processed, "producer stopped while listing");
                    return Ok(());
                }

                page = self.source.next_page() => page?,
            };

            for key in page.items {
                sweep_fail_point(PRODUCER_BEFORE_ENQUEUE)?;

                if let ShutdownResult::Shutdown(key) =
                    self.queue_tx.send(key.clone(), &mut self.shutdown_rx).await
                {
                    info!(
                        processed = snapshot.processed,
                        %key,
                        "producer stopped while enqueueing"
                    );
                    return Ok(());
                }

                snapshot.processed += 1;
                snapshot.last_enqueued = Some(key);
                snapshot.elapsed = started_at.elapsed();
                counter!(SWEEP_ITEMS_ENQUEUED_TOTAL).increment(1);

                self.progress_tx.send_replace(snapshot.clone());
                self.reporter.observe(&snapshot).await;
            }

            debug!(processed = snapshot.processed, "page enqueued");
        }

        info!(
            processed = snapshot.processed,
            "producer listed the whole collection, closing the work queue"
        );

        Ok(())
    }
}
