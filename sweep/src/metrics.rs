//! Metrics definitions for sweep monitoring.

/// Label for the worker id in metrics.
pub const WORKER_ID_LABEL: &str = "worker_id";

/// Label for error kind in metrics.
pub const ERROR_KIND_LABEL: &str = "error_kind";

// Producer metrics

/// Counter for keys handed to the work queue.
pub const SWEEP_ITEMS_ENQUEUED_TOTAL: &str = "sweep_items_enqueued_total";

/// Counter for pages listed from the collection.
pub const SWEEP_PAGES_LISTED_TOTAL: &str = "sweep_pages_listed_total";

/// Gauge for the throughput computed at the last progress report, in keys per second.
pub const SWEEP_KEYS_PER_SECOND: &str = "sweep_keys_per_second";

// Worker metrics

/// Counter for mutations applied successfully.
pub const SWEEP_MUTATIONS_TOTAL: &str = "sweep_mutations_total";

/// Counter for mutations that failed.
pub const SWEEP_MUTATION_FAILURES_TOTAL: &str = "sweep_mutation_failures_total";

// Checkpoint metrics

/// Counter for checkpoint writes that succeeded.
pub const SWEEP_CHECKPOINT_WRITES_TOTAL: &str = "sweep_checkpoint_writes_total";

/// Counter for checkpoint writes that failed.
pub const SWEEP_CHECKPOINT_WRITE_FAILURES_TOTAL: &str = "sweep_checkpoint_write_failures_total";
