use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value in config file at {config_path}: {message}")]
    ConfigValueError { config_path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language token for new blocks and emptied auto blocks
    pub default_language: String,
    /// Document opened when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_path: Option<PathBuf>,
    pub detection: DetectionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub enabled: bool,
    pub min_content_length: usize,
    pub diff_fraction: f32,
    pub confidence_threshold: f32,
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_language: "text".to_string(),
            document_path: None,
            detection: DetectionConfig::default(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_content_length: 8,
            diff_fraction: 0.1,
            confidence_threshold: 0.15,
            request_timeout_ms: 5000,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config
            .validate()
            .map_err(|message| ConfigError::ConfigValueError {
                config_path: config_path.to_path_buf(),
                message,
            })?;

        // Expand shell variables and tilde in the document path
        config.document_path = config
            .document_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockpad");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn validate(&self) -> Result<(), String> {
        let d = &self.detection;
        if !(0.0..=1.0).contains(&d.diff_fraction) {
            return Err(format!("detection.diff_fraction must be in 0..=1, got {}", d.diff_fraction));
        }
        if !(0.0..=1.0).contains(&d.confidence_threshold) {
            return Err(format!(
                "detection.confidence_threshold must be in 0..=1, got {}",
                d.confidence_threshold
            ));
        }
        if self.default_language.is_empty() {
            return Err("default_language must not be empty".to_string());
        }
        Ok(())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
