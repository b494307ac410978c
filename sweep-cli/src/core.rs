use sweep::checkpoint::CheckpointStore;
use sweep::checkpoint::file::FileCheckpointStore;
use sweep::collection::Collection;
use sweep::collection::s3::S3Collection;
use sweep::pipeline::Pipeline;
use sweep_config::shared::SweeperConfig;
use tracing::{error, info};

/// Sweeps the configured bucket until every object was processed, a failure or Ctrl+C.
pub async fn start_sweep(config: SweeperConfig) -> anyhow::Result<()> {
    let collection = S3Collection::new(&config.collection).await;
    let checkpoint_store = FileCheckpointStore::new(config.checkpoint.path.clone());

    info!(
        bucket = %config.collection.bucket,
        state = %config.checkpoint.path.display(),
        "starting sweep"
    );

    let pipeline = Pipeline::new(config.pipeline.clone(), collection, checkpoint_store);
    run_pipeline(pipeline).await
}

/// Runs `pipeline` to completion and prints the number of processed keys, also on failure.
async fn run_pipeline<C, S>(mut pipeline: Pipeline<C, S>) -> anyhow::Result<()>
where
    C: Collection + Clone + Send + Sync + 'static,
    S: CheckpointStore + Clone + Send + Sync + 'static,
{
    let progress = pipeline.progress();

    if let Err(err) = pipeline.start().await {
        println!("keys processed: 0");
        return Err(err.into());
    }

    // Spawn a task to listen for Ctrl+C and trigger shutdown.
    let shutdown_tx = pipeline.shutdown_tx();
    let shutdown_handle = tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl+c");
            return;
        }

        info!("ctrl+c received, shutting down sweep");
        shutdown_tx.shutdown();
    });

    let result = pipeline.wait().await;

    // The listener is no longer needed once the pipeline finished on its own.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    println!("keys processed: {}", progress.borrow().processed);

    result?;

    Ok(())
}
