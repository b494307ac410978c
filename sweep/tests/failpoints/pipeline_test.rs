use sweep::checkpoint::memory::MemoryCheckpointStore;
use sweep::collection::memory::MemoryCollection;
use sweep::error::ErrorKind;
use sweep::failpoints::{PRODUCER_BEFORE_ENQUEUE, WORKER_BEFORE_MUTATE};
use sweep::test_utils::failpoints::SweepFailScenario;
use sweep::test_utils::keys::generate_keys;
use sweep::test_utils::pipeline::create_pipeline;
use sweep_telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn producer_failure_before_enqueue_stops_the_pipeline() {
    init_test_tracing();
    let _scenario = SweepFailScenario::setup(&[(PRODUCER_BEFORE_ENQUEUE, "3*off->return")]);

    let collection = MemoryCollection::with_page_size(generate_keys(20), 5);
    let store = MemoryCheckpointStore::new();

    let mut pipeline = create_pipeline(collection.clone(), store.clone(), 2, 1);
    let progress = pipeline.progress();
    pipeline.start().await.unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FailpointTriggered);
    assert_eq!(progress.borrow().processed, 3);
    assert!(collection.mutations().await.len() <= 3);
    assert!(store.writes().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn worker_failure_before_mutate_never_reaches_the_collection() {
    init_test_tracing();
    let _scenario = SweepFailScenario::setup(&[(WORKER_BEFORE_MUTATE, "return(injected)")]);

    let collection = MemoryCollection::with_page_size(generate_keys(20), 5);

    let mut pipeline = create_pipeline(collection.clone(), MemoryCheckpointStore::new(), 4, 1);
    pipeline.start().await.unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FailpointTriggered);
    assert!(err.detail().unwrap().contains("injected"));
    assert!(collection.mutations().await.is_empty());
}
