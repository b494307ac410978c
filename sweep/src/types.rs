//! Core data types shared across the pipeline.

use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

/// Identifier of one unit of work, already decoded from the transport encoding.
///
/// Keys are opaque to the pipeline; uniqueness is assumed but never checked.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey(String);

impl ItemKey {
    /// Creates a new key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ItemKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for ItemKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Read-only view of the producer's progress.
///
/// Published by the producer after every enqueue; everyone else only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    /// Number of keys handed to the work queue so far.
    pub processed: u64,
    /// The most recently enqueued key.
    pub last_enqueued: Option<ItemKey>,
    /// Time elapsed since the producer started.
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Returns the average throughput in keys per second.
    pub fn keys_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }

        self.processed as f64 / secs
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Number of keys that were enqueued, and therefore mutated, during the run.
    pub processed: u64,
    /// The last key of the run, persisted as the final checkpoint.
    pub last_key: Option<ItemKey>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl From<ProgressSnapshot> for RunSummary {
    fn from(snapshot: ProgressSnapshot) -> Self {
        Self {
            processed: snapshot.processed,
            last_key: snapshot.last_enqueued,
            elapsed: snapshot.elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_is_zero_before_any_time_elapsed() {
        let snapshot = ProgressSnapshot {
            processed: 10,
            ..ProgressSnapshot::default()
        };

        assert_eq!(snapshot.keys_per_second(), 0.0);
    }

    #[test]
    fn throughput_divides_processed_by_elapsed_seconds() {
        let snapshot = ProgressSnapshot {
            processed: 300,
            last_enqueued: Some(ItemKey::new("c")),
            elapsed: Duration::from_secs(60),
        };

        assert_eq!(snapshot.keys_per_second(), 5.0);
    }
}
