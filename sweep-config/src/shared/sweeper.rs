use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{
    CheckpointConfig, CollectionConfig, MetricsConfig, PipelineConfig, ValidationError,
};

/// Complete configuration of the sweeper binary.
///
/// Typically loaded from the `configuration` directory at startup and then overridden by
/// command line flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// The collection to sweep.
    #[serde(default)]
    pub collection: CollectionConfig,
    /// Where progress is persisted.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Concurrency and reporting settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Optional Prometheus exporter.
    ///
    /// If `None`, metrics are recorded but never exported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

impl SweeperConfig {
    /// Validates the complete configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.collection.validate()?;
        self.checkpoint.validate()?;
        self.pipeline.validate()
    }
}

impl Config for SweeperConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
