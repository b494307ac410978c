//! Periodic throughput reporting and checkpointing, driven by the producer.

use std::time::Duration;

use metrics::{counter, gauge};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::checkpoint::CheckpointStore;
use crate::metrics::{
    ERROR_KIND_LABEL, SWEEP_CHECKPOINT_WRITE_FAILURES_TOTAL, SWEEP_CHECKPOINT_WRITES_TOTAL,
    SWEEP_KEYS_PER_SECOND,
};
use crate::types::ProgressSnapshot;

/// Reports progress at most once per interval.
///
/// The reporter has no timer task of its own: the producer calls [`ProgressReporter::observe`]
/// after every enqueue and a report happens only when the interval has elapsed since the
/// previous one. Every checkpoint it writes therefore names a key that was already enqueued.
#[derive(Debug)]
pub struct ProgressReporter<S> {
    store: S,
    interval: Duration,
    next_report_at: Instant,
}

impl<S> ProgressReporter<S>
where
    S: CheckpointStore,
{
    /// Creates a reporter whose first report is due one `interval` from now.
    pub fn new(store: S, interval: Duration) -> Self {
        Self {
            store,
            interval,
            next_report_at: Instant::now() + interval,
        }
    }

    /// Reports `snapshot` if a report is due.
    ///
    /// Returns `true` if a report happened. Failing to persist the checkpoint is logged and
    /// counted but never returned, since the next report overwrites it anyway.
    pub async fn observe(&mut self, snapshot: &ProgressSnapshot) -> bool {
        let now = Instant::now();
        if now < self.next_report_at {
            return false;
        }
        self.next_report_at = now + self.interval;

        let keys_per_second = snapshot.keys_per_second();
        info!(
            processed = snapshot.processed,
            keys_per_second = keys_per_second.round(),
            "sweep progress"
        );
        gauge!(SWEEP_KEYS_PER_SECOND).set(keys_per_second);

        let Some(key) = &snapshot.last_enqueued else {
            return true;
        };

        match self.store.write(key).await {
            Ok(()) => {
                counter!(SWEEP_CHECKPOINT_WRITES_TOTAL).increment(1);
            }
            Err(err) => {
                warn!(%key, error = %err, "failed to persist checkpoint");
                counter!(
                    SWEEP_CHECKPOINT_WRITE_FAILURES_TOTAL,
                    ERROR_KIND_LABEL => format!("{:?}", err.kind())
                )
                .increment(1);
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::memory::MemoryCheckpointStore;
    use crate::test_utils::checkpoint::FailingCheckpointStore;
    use crate::types::ItemKey;

    fn snapshot(processed: u64, key: &str, elapsed: Duration) -> ProgressSnapshot {
        ProgressSnapshot {
            processed,
            last_enqueued: Some(ItemKey::from(key)),
            elapsed,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_at_most_once_per_interval() {
        let store = MemoryCheckpointStore::new();
        let mut reporter = ProgressReporter::new(store.clone(), Duration::from_secs(60));

        assert!(!reporter.observe(&snapshot(1, "a", Duration::ZERO)).await);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(reporter.observe(&snapshot(2, "b", Duration::from_secs(60))).await);
        assert!(!reporter.observe(&snapshot(3, "c", Duration::from_secs(60))).await);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!reporter.observe(&snapshot(4, "d", Duration::from_secs(90))).await);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(reporter.observe(&snapshot(5, "e", Duration::from_secs(120))).await);

        assert_eq!(
            store.writes().await,
            vec![ItemKey::from("b"), ItemKey::from("e")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoint_failures_are_not_fatal() {
        let store = FailingCheckpointStore::new(None);
        let mut reporter = ProgressReporter::new(store.clone(), Duration::from_secs(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(reporter.observe(&snapshot(1, "a", Duration::from_secs(1))).await);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(reporter.observe(&snapshot(2, "b", Duration::from_secs(2))).await);

        assert_eq!(store.write_attempts(), 2);
    }
}
