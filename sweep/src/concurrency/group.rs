use std::sync::{Arc, OnceLock};

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::concurrency::shutdown::ShutdownTx;
use crate::error::{ErrorKind, SweepError, SweepResult};
use crate::sweep_error;
use crate::workers::base::WorkerType;

/// Supervises the producer and the mutation workers as a single unit.
///
/// The first error reported by any task is recorded and the shared cancellation signal is raised,
/// so every other task stops at its next suspension point. [`CancellationGroup::wait`] returns
/// that first error once every task has exited.
#[derive(Debug)]
pub struct CancellationGroup {
    join_set: JoinSet<(WorkerType, SweepResult<()>)>,
    first_error: Arc<OnceLock<SweepError>>,
    shutdown_tx: ShutdownTx,
}

impl CancellationGroup {
    pub fn new(shutdown_tx: ShutdownTx) -> Self {
        Self {
            join_set: JoinSet::new(),
            first_error: Arc::new(OnceLock::new()),
            shutdown_tx,
        }
    }

    /// Spawns `future` as a member of the group.
    pub fn spawn<F>(&mut self, worker_type: WorkerType, future: F)
    where
        F: Future<Output = SweepResult<()>> + Send + 'static,
    {
        let first_error = self.first_error.clone();
        let shutdown_tx = self.shutdown_tx.clone();

        self.join_set.spawn(async move {
            let result = future.await;
            if let Err(err) = &result {
                // The error is recorded before the signal is raised so that cancellations caused
                // by this failure can never take its place.
                record_failure(&first_error, &shutdown_tx, err.clone());
            }

            (worker_type, result)
        });

        debug!(%worker_type, "spawned task in cancellation group");
    }

    /// Returns the signal shared by every task of the group.
    pub fn shutdown_tx(&self) -> &ShutdownTx {
        &self.shutdown_tx
    }

    /// Returns the number of tasks that have not been joined yet.
    pub fn len(&self) -> usize {
        self.join_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.join_set.is_empty()
    }

    /// Waits for every task to exit and returns the first recorded error, if any.
    pub async fn wait(mut self) -> SweepResult<()> {
        while let Some(result) = self.join_set.join_next().await {
            match result {
                Ok((worker_type, Ok(()))) => {
                    debug!(%worker_type, "task completed");
                }
                Ok((worker_type, Err(err))) => {
                    if err.kind().is_cancellation() {
                        debug!(%worker_type, "task stopped after cancellation");
                    } else {
                        error!(%worker_type, error = %err, "task failed");
                    }
                }
                Err(join_err) => {
                    if join_err.is_panic() {
                        error!(error = %join_err, "task panicked");

                        let err = sweep_error!(
                            ErrorKind::TaskPanic,
                            "A pipeline task panicked",
                            join_err
                        );
                        record_failure(&self.first_error, &self.shutdown_tx, err);
                    } else {
                        debug!("task was aborted");
                    }
                }
            }
        }

        match self.first_error.get() {
            Some(err) => Err(err.clone()),
            None => {
                info!("all pipeline tasks completed");
                Ok(())
            }
        }
    }
}

fn record_failure(first_error: &OnceLock<SweepError>, shutdown_tx: &ShutdownTx, err: SweepError) {
    let _ = first_error.set(err);
    if shutdown_tx.shutdown() {
        info!("cancellation signal raised after a task failure");
    }
}
