use std::path::{Path, PathBuf};

use layers::symbology::TierTable;
use serde::{Deserialize, Serialize};
use streaming::config::{InvalidStreamingConfig, StreamingConfig};
use thiserror::Error;

/// Everything tunable about the explorer core.
///
/// JSON keys: `bufferFraction`, `fetchThreshold`, `maxCachedPlaces`,
/// `tierTable` (list of `{tier, minPopularity, minZoom}`). Missing keys keep
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExplorerConfig {
    #[serde(flatten)]
    pub streaming: StreamingConfig,
    pub tier_table: TierTable,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Streaming(#[from] InvalidStreamingConfig),
}

impl ExplorerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ExplorerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.streaming.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ExplorerConfig};
    use layers::symbology::Tier;

    #[test]
    fn empty_object_is_the_default() {
        let cfg = ExplorerConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, ExplorerConfig::default());
    }

    #[test]
    fn recognizes_all_options() {
        let cfg = ExplorerConfig::from_json_str(
            r#"{
                "bufferFraction": 1.0,
                "fetchThreshold": 0.8,
                "maxCachedPlaces": 500,
                "tierTable": [
                    {"tier": "RARE", "minPopularity": 10, "minZoom": 2},
                    {"tier": "COMMON", "minPopularity": 0, "minZoom": 9}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.streaming.buffer_fraction, 1.0);
        assert_eq!(cfg.streaming.fetch_threshold, 0.8);
        assert_eq!(cfg.streaming.max_cached_places, 500);
        assert_eq!(cfg.tier_table.classify(20.0, 2.0), Some(Tier::Rare));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ExplorerConfig::from_json_str(r#"{"fetchThreshold": 0.5}"#),
            Err(ConfigError::Streaming(_))
        ));
        assert!(matches!(
            ExplorerConfig::from_json_str(r#"{"tierTable": []}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ExplorerConfig::load("/nonexistent/explorer.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/explorer.json"));
    }
}
