//! Concurrent sweep of a paginated remote collection.
//!
//! A single producer lists the collection page by page and hands every key to a bounded queue,
//! a fixed pool of workers applies a mutation to each key, and a cancellation group stops every
//! participant on the first failure. Progress is reported and checkpointed periodically so an
//! interrupted sweep can be resumed.

pub mod checkpoint;
pub mod collection;
pub mod concurrency;
pub mod error;
pub mod failpoints;
mod macros;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
