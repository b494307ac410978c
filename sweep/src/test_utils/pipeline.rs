use std::time::Duration;

use sweep_config::shared::PipelineConfig;

use crate::checkpoint::CheckpointStore;
use crate::collection::Collection;
use crate::pipeline::Pipeline;

/// Returns a pipeline configuration with the given concurrency and an hourly report interval.
///
/// The long interval keeps periodic checkpoints out of tests that do not care about them.
pub fn test_pipeline_config(max_workers: u16, queue_capacity: usize) -> PipelineConfig {
    PipelineConfig {
        max_workers,
        queue_capacity,
        report_interval_ms: Duration::from_secs(3600).as_millis() as u64,
    }
}

/// Creates a pipeline over `collection` with [`test_pipeline_config`].
pub fn create_pipeline<C, S>(
    collection: C,
    checkpoint_store: S,
    max_workers: u16,
    queue_capacity: usize,
) -> Pipeline<C, S>
where
    C: Collection + Clone + Send + Sync + 'static,
    S: CheckpointStore + Clone + Send + Sync + 'static,
{
    Pipeline::new(
        test_pipeline_config(max_workers, queue_capacity),
        collection,
        checkpoint_store,
    )
}
