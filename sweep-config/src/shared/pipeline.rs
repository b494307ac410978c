use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::ValidationError;

/// Configuration of the sweep pipeline.
///
/// Immutable for the duration of a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Number of workers applying the mutation concurrently.
    #[serde(default = "default_max_workers")]
    pub max_workers: u16,
    /// Capacity of the queue between the producer and the workers.
    ///
    /// The producer blocks once this many keys are waiting for a worker.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Interval, in milliseconds, between two progress reports and checkpoint writes.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
}

impl PipelineConfig {
    /// Default number of mutation workers.
    pub const DEFAULT_MAX_WORKERS: u16 = 10;

    /// Default queue capacity, the smallest bounded hand-off between producer and workers.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1;

    /// Default interval between progress reports.
    pub const DEFAULT_REPORT_INTERVAL_MS: u64 = 60_000;

    /// Returns the reporting interval as a [`Duration`].
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    /// Validates pipeline configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_workers == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "pipeline.max_workers".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "pipeline.queue_capacity".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.report_interval_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "pipeline.report_interval_ms".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            queue_capacity: default_queue_capacity(),
            report_interval_ms: default_report_interval_ms(),
        }
    }
}

fn default_max_workers() -> u16 {
    PipelineConfig::DEFAULT_MAX_WORKERS
}

fn default_queue_capacity() -> usize {
    PipelineConfig::DEFAULT_QUEUE_CAPACITY
}

fn default_report_interval_ms() -> u64 {
    PipelineConfig::DEFAULT_REPORT_INTERVAL_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();

        assert_eq!(config.max_workers, 10);
        assert_eq!(config.queue_capacity, 1);
        assert_eq!(config.report_interval(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_are_rejected() {
        let config = PipelineConfig {
            max_workers: 0,
            ..PipelineConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"max_workers": 4}"#).unwrap();

        assert_eq!(config.max_workers, 4);
        assert_eq!(config.queue_capacity, PipelineConfig::DEFAULT_QUEUE_CAPACITY);
        assert_eq!(
            config.report_interval_ms,
            PipelineConfig::DEFAULT_REPORT_INTERVAL_MS
        );
    }
}
