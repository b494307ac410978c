use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::shared::ValidationError;

/// Location of the file holding the last enqueued key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckpointConfig {
    /// Path of the checkpoint file, periodically overwritten with the last enqueued key.
    #[serde(default = "default_checkpoint_path")]
    pub path: PathBuf,
}

impl CheckpointConfig {
    /// Default checkpoint location.
    pub const DEFAULT_PATH: &'static str = "/tmp/fixacl-lastkey.txt";

    /// Validates the checkpoint configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::MissingCheckpointPath);
        }

        Ok(())
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: default_checkpoint_path(),
        }
    }
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from(CheckpointConfig::DEFAULT_PATH)
}
