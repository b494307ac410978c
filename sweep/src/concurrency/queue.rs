use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::concurrency::shutdown::{ShutdownResult, ShutdownRx};
use crate::types::ItemKey;

/// Creates the bounded queue carrying keys from the producer to the mutation workers.
///
/// # Panics
///
/// Panics if `capacity` is zero, which configuration validation rules out.
pub fn work_queue(capacity: usize) -> (WorkQueueTx, WorkQueueRx) {
    let (tx, rx) = mpsc::channel(capacity);

    (
        WorkQueueTx { tx },
        WorkQueueRx {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Single writer side of the work queue, owned by the producer.
///
/// Dropping it closes the queue: workers drain what is left and then observe the closure.
#[derive(Debug)]
pub struct WorkQueueTx {
    tx: mpsc::Sender<ItemKey>,
}

impl WorkQueueTx {
    /// Hands `key` to the workers, waiting for a free slot.
    ///
    /// Returns the key back as [`ShutdownResult::Shutdown`] when the cancellation signal is
    /// raised before a slot frees up or when no worker is left to receive it.
    pub async fn send(
        &self,
        key: ItemKey,
        shutdown_rx: &mut ShutdownRx,
    ) -> ShutdownResult<(), ItemKey> {
        if shutdown_rx.is_shutdown() {
            return ShutdownResult::Shutdown(key);
        }

        tokio::select! {
            biased;

            _ = shutdown_rx.wait_for_shutdown() => ShutdownResult::Shutdown(key),

            permit = self.tx.reserve() => match permit {
                Ok(permit) => {
                    permit.send(key);
                    ShutdownResult::Ok(())
                }
                Err(_) => ShutdownResult::Shutdown(key),
            },
        }
    }
}

/// Shared reader side of the work queue.
///
/// Every worker holds a clone; a key is delivered to exactly one of them.
#[derive(Debug, Clone)]
pub struct WorkQueueRx {
    rx: Arc<Mutex<mpsc::Receiver<ItemKey>>>,
}

impl WorkQueueRx {
    /// Receives the next key, or `None` once the queue is closed and drained.
    pub async fn recv(&self, shutdown_rx: &mut ShutdownRx) -> ShutdownResult<Option<ItemKey>, ()> {
        tokio::select! {
            biased;

            _ = shutdown_rx.wait_for_shutdown() => ShutdownResult::Shutdown(()),

            key = async { self.rx.lock().await.recv().await } => ShutdownResult::Ok(key),
        }
    }
}
