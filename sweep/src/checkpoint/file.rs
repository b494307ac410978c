use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::checkpoint::CheckpointStore;
use crate::error::{ErrorKind, SweepResult};
use crate::sweep_error;
use crate::types::ItemKey;

/// Checkpoint stored as the sole content of a text file.
///
/// Writes go to a sibling temporary file which is then renamed over the checkpoint, so a crash
/// mid-write never leaves a truncated key behind.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temporary_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| OsString::from("checkpoint"));
        file_name.push(".tmp");

        self.path.with_file_name(file_name)
    }
}

impl CheckpointStore for FileCheckpointStore {
    async fn read(&self) -> SweepResult<Option<ItemKey>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no checkpoint file found");
                return Ok(None);
            }
            Err(err) => {
                return Err(sweep_error!(
                    ErrorKind::CheckpointReadFailed,
                    "Checkpoint file could not be read",
                    format!("path: {}", self.path.display()),
                    source: err
                ));
            }
        };

        let key = content.trim();
        if key.is_empty() {
            return Ok(None);
        }

        Ok(Some(ItemKey::from(key)))
    }

    async fn write(&self, key: &ItemKey) -> SweepResult<()> {
        let temporary_path = self.temporary_path();

        let write_err = |err: io::Error| {
            sweep_error!(
                ErrorKind::CheckpointWriteFailed,
                "Checkpoint file could not be written",
                format!("path: {}", self.path.display()),
                source: err
            )
        };

        tokio::fs::write(&temporary_path, key.as_str())
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&temporary_path, &self.path)
            .await
            .map_err(write_err)?;

        Ok(())
    }
}
