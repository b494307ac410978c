use std::path::PathBuf;

use anyhow::Context;
use sweep_config::shared::SweeperConfig;
use sweep_config::{LoadConfigError, load_config};

/// Loads the sweeper configuration and applies the command line overrides.
///
/// Without a `configuration` directory the defaults are used, so the binary can run from any
/// directory with just `--bucket`.
pub fn load_sweeper_config(
    bucket: Option<String>,
    state: Option<PathBuf>,
) -> anyhow::Result<SweeperConfig> {
    let config = match load_config::<SweeperConfig>() {
        Ok(config) => config,
        Err(LoadConfigError::MissingConfigurationDirectory(_)) => SweeperConfig::default(),
        Err(err) => return Err(err).context("failed to load the configuration"),
    };

    apply_overrides(config, bucket, state)
}

fn apply_overrides(
    mut config: SweeperConfig,
    bucket: Option<String>,
    state: Option<PathBuf>,
) -> anyhow::Result<SweeperConfig> {
    if let Some(bucket) = bucket {
        config.collection.bucket = bucket;
    }
    if let Some(state) = state {
        config.checkpoint.path = state;
    }

    config
        .validate()
        .context("invalid configuration, check --bucket and --state")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_loaded_configuration() {
        let config = apply_overrides(
            SweeperConfig::default(),
            Some("photos".to_string()),
            Some(PathBuf::from("/var/lib/sweep/lastkey.txt")),
        )
        .unwrap();

        assert_eq!(config.collection.bucket, "photos");
        assert_eq!(
            config.checkpoint.path,
            PathBuf::from("/var/lib/sweep/lastkey.txt")
        );
    }

    #[test]
    fn missing_bucket_is_rejected() {
        let err = apply_overrides(SweeperConfig::default(), None, None).unwrap_err();

        assert!(format!("{err:#}").contains("`collection.bucket` must be set"));
    }

    #[test]
    fn default_state_file_is_kept_without_flag() {
        let config =
            apply_overrides(SweeperConfig::default(), Some("photos".to_string()), None).unwrap();

        assert_eq!(
            config.checkpoint.path,
            PathBuf::from("/tmp/fixacl-lastkey.txt")
        );
    }
}
