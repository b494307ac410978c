use std::collections::HashSet;

use sweep::checkpoint::file::FileCheckpointStore;
use sweep::checkpoint::memory::MemoryCheckpointStore;
use sweep::collection::memory::MemoryCollection;
use sweep::collection::{PageRequest, RawEntry};
use sweep::error::ErrorKind;
use sweep::pipeline::Pipeline;
use sweep::test_utils::checkpoint::FailingCheckpointStore;
use sweep::test_utils::collection::{FaultConfig, FaultyCollection};
use sweep::test_utils::keys::generate_keys;
use sweep::test_utils::pipeline::{create_pipeline, test_pipeline_config};
use sweep::types::ItemKey;
use sweep_telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn two_pages_with_two_workers_end_with_the_last_key_checkpointed() {
    init_test_tracing();
    let collection = MemoryCollection::with_page_size(["a", "b", "c"], 2);
    let store = MemoryCheckpointStore::new();

    let mut pipeline = create_pipeline(collection.clone(), store.clone(), 2, 1);
    pipeline.start().await.unwrap();
    let summary = pipeline.wait().await.unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.last_key, Some(ItemKey::from("c")));
    assert_eq!(store.current().await, Some(ItemKey::from("c")));

    let requests = collection.list_requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], PageRequest::default());
    assert_eq!(requests[1].continuation_token.as_deref(), Some("b"));
}

#[tokio::test(flavor = "multi_thread")]
async fn every_key_is_mutated_exactly_once() {
    init_test_tracing();
    let keys = generate_keys(500);
    let collection = MemoryCollection::with_page_size(keys.clone(), 37);

    let mut pipeline = create_pipeline(collection.clone(), MemoryCheckpointStore::new(), 8, 4);
    pipeline.start().await.unwrap();
    let summary = pipeline.wait().await.unwrap();

    assert_eq!(summary.processed, 500);

    let counts = collection.mutation_counts().await;
    assert_eq!(counts.len(), 500);
    for key in keys {
        assert_eq!(counts.get(&ItemKey::from(key.as_str())), Some(&1), "key {key}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn resuming_only_sweeps_keys_after_the_checkpoint() {
    init_test_tracing();
    let keys = generate_keys(100);
    let collection = MemoryCollection::with_page_size(keys.clone(), 10);
    let store = MemoryCheckpointStore::with_checkpoint("key-00049");

    let mut pipeline = create_pipeline(collection.clone(), store.clone(), 4, 1);
    pipeline.start().await.unwrap();
    let summary = pipeline.wait().await.unwrap();

    assert_eq!(summary.processed, 50);
    assert_eq!(
        collection.list_requests().await[0].start_after,
        Some(ItemKey::from("key-00049"))
    );

    let mutated: HashSet<_> = collection.mutations().await.into_iter().collect();
    let expected: HashSet<_> = keys[50..]
        .iter()
        .map(|key| ItemKey::from(key.as_str()))
        .collect();
    assert_eq!(mutated, expected);
    assert_eq!(store.current().await, Some(ItemKey::from("key-00099")));
}

#[tokio::test(flavor = "multi_thread")]
async fn resuming_from_a_checkpoint_file_skips_the_finished_run() {
    init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = FileCheckpointStore::new(dir.path().join("lastkey.txt"));

    let first_run = MemoryCollection::new(["a", "b", "c"]);
    let mut pipeline = create_pipeline(first_run, store.clone(), 2, 1);
    pipeline.start().await.unwrap();
    pipeline.wait().await.unwrap();

    let second_run = MemoryCollection::new(["a", "b", "c", "d e"]);
    let mut pipeline = create_pipeline(second_run.clone(), store.clone(), 2, 1);
    pipeline.start().await.unwrap();
    let summary = pipeline.wait().await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(second_run.mutations().await, vec![ItemKey::from("d e")]);
    assert_eq!(
        std::fs::read_to_string(store.path()).unwrap(),
        "d e".to_string()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn mutation_failure_cancels_the_pipeline_with_bounded_enqueueing() {
    init_test_tracing();
    let max_workers = 3;
    let queue_capacity = 2;
    let memory = MemoryCollection::with_page_size(generate_keys(100), 10);
    let collection = FaultyCollection::wrap(
        memory.clone(),
        FaultConfig {
            fail_mutation_on: Some(ItemKey::from("key-00000")),
            hang_mutations: true,
            ..FaultConfig::default()
        },
    );
    let store = MemoryCheckpointStore::new();

    let mut pipeline = create_pipeline(collection.clone(), store.clone(), max_workers, queue_capacity);
    let progress = pipeline.progress();
    pipeline.start().await.unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MutationFailed);
    assert!(err.detail().unwrap().contains("key-00000"));

    let processed = progress.borrow().processed;
    assert!(processed >= 1);
    assert!(processed <= (queue_capacity + max_workers as usize) as u64);

    // Only keys received by a worker before the cancellation were attempted.
    let attempted = memory.mutations().await;
    assert!(attempted.len() <= max_workers as usize);
    assert!(attempted.len() as u64 <= processed);
    assert!(attempted.contains(&ItemKey::from("key-00000")));

    assert!(store.writes().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn running_twice_mutates_every_key_twice() {
    init_test_tracing();
    let collection = MemoryCollection::with_page_size(generate_keys(40), 7);

    for _ in 0..2 {
        let mut pipeline = create_pipeline(collection.clone(), MemoryCheckpointStore::new(), 5, 1);
        pipeline.start().await.unwrap();
        let summary = pipeline.wait().await.unwrap();
        assert_eq!(summary.processed, 40);
    }

    let counts = collection.mutation_counts().await;
    assert_eq!(counts.len(), 40);
    assert!(counts.values().all(|count| *count == 2));
}

#[tokio::test(flavor = "multi_thread")]
async fn listing_failure_is_fatal() {
    init_test_tracing();
    let memory = MemoryCollection::with_page_size(generate_keys(6), 2);
    let collection = FaultyCollection::wrap(
        memory.clone(),
        FaultConfig {
            fail_listing_on_call: Some(2),
            ..FaultConfig::default()
        },
    );
    let store = MemoryCheckpointStore::new();

    let mut pipeline = create_pipeline(collection, store.clone(), 2, 1);
    let progress = pipeline.progress();
    pipeline.start().await.unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ListingFailed);
    assert_eq!(progress.borrow().processed, 2);
    assert!(memory.mutations().await.len() <= 2);
    assert!(store.writes().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn undecodable_key_is_fatal() {
    init_test_tracing();
    let collection = MemoryCollection::new(["a", "c"]);
    collection.insert_raw_entry("b", RawEntry::new("b%ZZ")).await;

    let mut pipeline = create_pipeline(collection.clone(), MemoryCheckpointStore::new(), 2, 1);
    let progress = pipeline.progress();
    pipeline.start().await.unwrap();
    let err = pipeline.wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DecodeFailed);
    assert_eq!(progress.borrow().processed, 0);
    assert!(collection.mutations().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn checkpoint_write_failures_do_not_fail_the_run() {
    init_test_tracing();
    let collection = MemoryCollection::with_page_size(generate_keys(200), 20);
    let store = FailingCheckpointStore::new(None);
    let config = sweep_config::shared::PipelineConfig {
        report_interval_ms: 1,
        ..test_pipeline_config(4, 1)
    };

    let mut pipeline = Pipeline::new(config, collection.clone(), store.clone());
    pipeline.start().await.unwrap();
    let summary = pipeline.wait().await.unwrap();

    assert_eq!(summary.processed, 200);
    assert_eq!(collection.mutations().await.len(), 200);
    // At least the final checkpoint was attempted.
    assert!(store.write_attempts() >= 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreadable_checkpoint_fails_the_start() {
    init_test_tracing();
    let collection = MemoryCollection::new(["a"]);

    let mut pipeline = create_pipeline(
        collection.clone(),
        FailingCheckpointStore::unreadable(),
        2,
        1,
    );
    let err = pipeline.start().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CheckpointReadFailed);
    assert!(collection.list_requests().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn periodic_checkpoints_only_name_enqueued_keys_in_order() {
    init_test_tracing();
    let keys = generate_keys(2000);
    let collection = MemoryCollection::with_page_size(keys.clone(), 100);
    let store = MemoryCheckpointStore::new();
    let config = sweep_config::shared::PipelineConfig {
        report_interval_ms: 1,
        ..test_pipeline_config(4, 1)
    };

    let mut pipeline = Pipeline::new(config, collection, store.clone());
    pipeline.start().await.unwrap();
    pipeline.wait().await.unwrap();

    let writes = store.writes().await;
    let all_keys: HashSet<_> = keys.iter().map(|key| ItemKey::from(key.as_str())).collect();
    assert!(writes.iter().all(|key| all_keys.contains(key)));
    assert!(writes.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(writes.last(), Some(&ItemKey::from("key-01999")));
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_cancels_in_flight_mutations() {
    init_test_tracing();
    let memory = MemoryCollection::new(generate_keys(10));
    let collection = FaultyCollection::wrap(
        memory.clone(),
        FaultConfig {
            hang_mutations: true,
            ..FaultConfig::default()
        },
    );
    let store = MemoryCheckpointStore::new();

    let mut pipeline = create_pipeline(collection.clone(), store.clone(), 2, 1);
    let progress = pipeline.progress();
    let attempts_notify = collection.notify_on_mutation_attempts(2).await;
    pipeline.start().await.unwrap();

    attempts_notify.notified().await;
    let err = pipeline.shutdown_and_wait().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(memory.mutations().await.len(), 2);
    assert!(progress.borrow().processed <= 3);
    assert!(store.writes().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn external_shutdown_signal_stops_the_pipeline() {
    init_test_tracing();
    let collection = FaultyCollection::wrap(
        MemoryCollection::new(generate_keys(10)),
        FaultConfig {
            hang_mutations: true,
            ..FaultConfig::default()
        },
    );

    let mut pipeline = create_pipeline(collection.clone(), MemoryCheckpointStore::new(), 1, 1);
    let shutdown_tx = pipeline.shutdown_tx();
    let attempts_notify = collection.notify_on_mutation_attempts(1).await;
    pipeline.start().await.unwrap();

    attempts_notify.notified().await;
    assert!(shutdown_tx.shutdown());

    let err = pipeline.wait().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}
