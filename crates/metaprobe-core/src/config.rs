//! Configuration management for metaprobe.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::classifier::DEFAULT_EXTENSIONS;
use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/metaprobe/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Crawl traversal and HTTP settings
    pub crawler: CrawlerConfig,
    /// File extensions worth downloading
    pub classifier: ClassifierConfig,
    /// Sensitive-content detection settings
    pub detection: DetectionConfig,
    /// Database and download locations
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(config_path: &std::path::Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `METAPROBE_MAX_DEPTH`: Override the default crawl depth
    /// - `METAPROBE_DATA_DIR`: Override the data directory
    /// - `METAPROBE_USER_AGENT`: Override the HTTP user agent
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Apply `METAPROBE_*` environment overrides on top of this configuration.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("METAPROBE_MAX_DEPTH") {
            if let Ok(depth) = val.parse() {
                self.crawler.max_depth = depth;
                tracing::debug!("Override crawler.max_depth from env: {}", depth);
            }
        }

        if let Ok(val) = std::env::var("METAPROBE_DATA_DIR") {
            if !val.trim().is_empty() {
                tracing::debug!("Override storage.data_dir from env: {}", val);
                self.storage.data_dir = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("METAPROBE_USER_AGENT") {
            if !val.trim().is_empty() {
                tracing::debug!("Override crawler.user_agent from env");
                self.crawler.user_agent = val;
            }
        }
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/metaprobe/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses `storage.data_dir` when set, otherwise the XDG data directory
    /// (`~/.local/share/metaprobe`).
    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.storage.data_dir {
            return Ok(dir.clone());
        }
        let dirs = project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Path of the `SQLite` database file.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        Ok(self.data_dir()?.join("metaprobe.db"))
    }

    /// Root directory for downloaded artifacts.
    pub fn downloads_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self.data_dir()?.join("downloads"))
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "metaprobe", "metaprobe").ok_or(ConfigError::NoConfigDir)
}

/// Crawl traversal and HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Default maximum link depth from the origin page
    pub max_depth: u32,
    /// Timeout for HTML page requests in seconds
    pub page_timeout_secs: u64,
    /// Timeout for file downloads in seconds
    pub file_timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Scheme used when a target is given as a bare domain
    pub default_scheme: String,
}

impl CrawlerConfig {
    /// Page request timeout as a `Duration`.
    #[must_use]
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// File request timeout as a `Duration`.
    #[must_use]
    pub fn file_timeout(&self) -> Duration {
        Duration::from_secs(self.file_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            page_timeout_secs: 10,
            file_timeout_secs: 15,
            user_agent: format!(
                "Mozilla/5.0 (compatible; metaprobe/{})",
                env!("CARGO_PKG_VERSION")
            ),
            default_scheme: "http".to_string(),
        }
    }
}

/// Extension allow-list used to decide which links are downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Extensions with leading dot, matched case-insensitively
    pub allowed_extensions: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Sensitive-content detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Keywords searched case-insensitively in extracted text
    pub keywords: Vec<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            keywords: [
                "password",
                "contraseña",
                "usuario",
                "internal",
                "confidencial",
                "secret",
                "key",
                "token",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}

/// Database and download locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the data directory (database + downloads)
    pub data_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.crawler.max_depth, 2);
        assert_eq!(config.crawler.page_timeout(), Duration::from_secs(10));
        assert_eq!(config.crawler.file_timeout(), Duration::from_secs(15));
        assert_eq!(config.crawler.default_scheme, "http");
        assert!(config
            .classifier
            .allowed_extensions
            .contains(&".pdf".to_string()));
        assert!(config.detection.keywords.contains(&"password".to_string()));
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[crawler]"));
        assert!(toml_str.contains("[classifier]"));
        assert!(toml_str.contains("[detection]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.crawler.user_agent, config.crawler.user_agent);
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.crawler.max_depth = 4;
        config.storage.data_dir = Some(tmp.path().join("data"));

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(loaded.crawler.max_depth, 4);
        assert_eq!(
            loaded.database_path().expect("db path"),
            tmp.path().join("data").join("metaprobe.db")
        );
        assert_eq!(
            loaded.downloads_dir().expect("downloads dir"),
            tmp.path().join("data").join("downloads")
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = TempDir::new().expect("create temp dir");
        let loaded = AppConfig::load_from(&tmp.path().join("absent.toml")).expect("load config");
        assert_eq!(loaded.crawler.max_depth, 2);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[crawler]
max_depth = 5

[detection]
keywords = ["apikey"]
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.crawler.max_depth, 5);
        assert_eq!(config.detection.keywords, vec!["apikey".to_string()]);
        // These should be defaults
        assert_eq!(config.crawler.page_timeout_secs, 10);
        assert!(!config.classifier.allowed_extensions.is_empty());
    }
}
