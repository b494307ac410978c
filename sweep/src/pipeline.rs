use std::sync::Arc;

use sweep_config::shared::PipelineConfig;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::collection::Collection;
use crate::concurrency::group::CancellationGroup;
use crate::concurrency::queue::work_queue;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::error::{ErrorKind, SweepResult};
use crate::progress::ProgressReporter;
use crate::source::ItemSource;
use crate::types::{ProgressSnapshot, RunSummary};
use crate::workers::base::WorkerType;
use crate::workers::pool::MutationWorkerPool;
use crate::workers::producer::ProducerWorker;
use crate::{bail, sweep_error};

#[derive(Debug)]
enum PipelineState {
    NotStarted,
    Started {
        group: CancellationGroup,
        started_at: Instant,
    },
}

/// A sweep over every item of a [`Collection`].
///
/// The pipeline wires one producer and a pool of mutation workers through a bounded queue and
/// supervises them with a cancellation group. Its lifecycle mirrors a task's: [`Pipeline::start`]
/// spawns everything, [`Pipeline::wait`] joins it, and [`Pipeline::shutdown`] (or any
/// [`ShutdownTx`] obtained from [`Pipeline::shutdown_tx`]) cancels it.
#[derive(Debug)]
pub struct Pipeline<C, S> {
    config: Arc<PipelineConfig>,
    collection: C,
    checkpoint_store: S,
    state: PipelineState,
    shutdown_tx: ShutdownTx,
    progress_tx: watch::Sender<ProgressSnapshot>,
}

impl<C, S> Pipeline<C, S>
where
    C: Collection + Clone + Send + Sync + 'static,
    S: CheckpointStore + Clone + Send + Sync + 'static,
{
    pub fn new(config: PipelineConfig, collection: C, checkpoint_store: S) -> Self {
        // The receiver is not kept, every task subscribes through the sender.
        let (shutdown_tx, _) = create_shutdown_channel();
        let (progress_tx, _) = watch::channel(ProgressSnapshot::default());

        Self {
            config: Arc::new(config),
            collection,
            checkpoint_store,
            state: PipelineState::NotStarted,
            shutdown_tx,
            progress_tx,
        }
    }

    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Returns a receiver of the producer's progress.
    ///
    /// The last published snapshot stays readable after the pipeline finished, also when it
    /// failed.
    pub fn progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress_tx.subscribe()
    }

    /// Reads the checkpoint and spawns the producer and the mutation workers.
    pub async fn start(&mut self) -> SweepResult<()> {
        if matches!(self.state, PipelineState::Started { .. }) {
            bail!(ErrorKind::InvalidState, "The pipeline was already started");
        }

        self.config.validate().map_err(|err| {
            sweep_error!(
                ErrorKind::ConfigError,
                "Invalid pipeline configuration",
                source: err
            )
        })?;

        let checkpoint = self.checkpoint_store.read().await?;
        match &checkpoint {
            Some(key) => info!(%key, "resuming sweep after checkpoint"),
            None => info!("no checkpoint found, sweeping from the beginning"),
        }

        info!(
            max_workers = self.config.max_workers,
            queue_capacity = self.config.queue_capacity,
            "starting pipeline"
        );

        let started_at = Instant::now();
        let (queue_tx, queue_rx) = work_queue(self.config.queue_capacity);
        let mut group = CancellationGroup::new(self.shutdown_tx.clone());

        // Workers are spawned first, so that the first enqueued key finds a receiver.
        MutationWorkerPool::new(self.config.max_workers).spawn(
            &mut group,
            &self.collection,
            &queue_rx,
        );
        // The producer's sender is the only one, so the queue closes when the producer exits.
        drop(queue_rx);

        let producer = ProducerWorker::new(
            ItemSource::new(self.collection.clone(), checkpoint),
            queue_tx,
            ProgressReporter::new(self.checkpoint_store.clone(), self.config.report_interval()),
            self.progress_tx.clone(),
            self.shutdown_tx.subscribe(),
        );
        group.spawn(WorkerType::Producer, producer.run());

        self.state = PipelineState::Started { group, started_at };

        Ok(())
    }

    /// Waits for every task to exit.
    ///
    /// On success the last enqueued key is persisted as the final checkpoint. On failure the first
    /// error of the run is returned and the checkpoint is left as the last periodic report wrote
    /// it, so keys that were queued but never mutated are listed again on resume.
    pub async fn wait(self) -> SweepResult<RunSummary> {
        let PipelineState::Started { group, started_at } = self.state else {
            bail!(ErrorKind::InvalidState, "The pipeline was not started");
        };

        let result = group.wait().await;
        let snapshot = self.progress_tx.borrow().clone();

        if let Err(err) = result {
            info!(
                processed = snapshot.processed,
                error_kind = ?err.kind(),
                "pipeline terminated with an error"
            );

            return Err(err);
        }

        if let Some(key) = &snapshot.last_enqueued {
            match self.checkpoint_store.write(key).await {
                Ok(()) => info!(%key, "final checkpoint persisted"),
                Err(err) => warn!(%key, error = %err, "failed to persist final checkpoint"),
            }
        }

        let summary = RunSummary {
            elapsed: started_at.elapsed(),
            ..RunSummary::from(snapshot)
        };
        info!(
            processed = summary.processed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "pipeline completed"
        );

        Ok(summary)
    }

    /// Raises the cancellation signal.
    pub fn shutdown(&self) {
        info!("trying to shut down the pipeline");

        if self.shutdown_tx.shutdown() {
            info!("shut down signal successfully sent to all tasks");
        } else {
            info!("shut down signal was already raised");
        }
    }

    pub async fn shutdown_and_wait(self) -> SweepResult<RunSummary> {
        self.shutdown();
        self.wait().await
    }
}
