use super::schema::LodestarConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./lodestar.yaml
    /// 2. ~/.lodestar/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<LodestarConfig, ConfigError> {
        let local_config = PathBuf::from("./lodestar.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".lodestar").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(LodestarConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<LodestarConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        // serde_yaml rejects an empty document; treat it as "all defaults".
        if content.trim().is_empty() {
            return Ok(LodestarConfig::default());
        }
        let config: LodestarConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "scoring:\n  confidence_floor: 55\n  weights:\n    id: 0.5\nverification:\n  wait_ms: 0"
        )
        .unwrap();

        let config = ConfigLoader::load_from(file.path()).await.unwrap();
        assert_eq!(config.scoring.confidence_floor, 55.0);
        assert_eq!(config.scoring.weights.id, 0.5);
        assert_eq!(config.scoring.weights.name, 0.9);
        assert_eq!(config.verification.wait_ms, 0);
        assert_eq!(config.verification.text_prefix_len, 15);
        assert!(config.cache.enabled);
    }

    #[tokio::test]
    async fn test_empty_file_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = ConfigLoader::load_from(file.path()).await.unwrap();
        assert_eq!(config.scoring.confidence_floor, 40.0);
    }

    #[tokio::test]
    async fn test_malformed_config_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scoring: [not, a, map]").unwrap();
        let err = ConfigLoader::load_from(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = ConfigLoader::load_from(Path::new("/nonexistent/lodestar.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
