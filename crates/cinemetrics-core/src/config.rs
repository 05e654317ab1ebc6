//! Configuration schema (cinemetrics.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Movie ids studied by default
pub const DEFAULT_MOVIE_IDS: &[u64] = &[
    299534, 19995, 140607, 299536, 597, 135397, 420818, 24428, 168259, 99861, 284054, 12445,
    181808, 330457, 351286, 109445, 321612, 260513,
];

/// Retry settings for the catalog source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,

    /// Backoff before the first retry (milliseconds)
    pub initial_backoff_ms: u64,

    /// Cap for exponential growth (milliseconds)
    pub max_backoff_ms: u64,

    /// Multiplier applied to the backoff after each retry
    pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Catalog API source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Movies to fetch, in order
    #[serde(default = "default_movie_ids")]
    pub movie_ids: Vec<u64>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed delay between requests (milliseconds)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Retry behaviour for transient failures
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_movie_ids() -> Vec<u64> {
    DEFAULT_MOVIE_IDS.to_vec()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_request_delay_ms() -> u64 {
    250
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            movie_ids: default_movie_ids(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            retry: RetrySettings::default(),
        }
    }
}

/// Artifact locations, relative to the project root unless absolute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw records written by the fetch step
    pub raw_records: PathBuf,

    /// Clean Table CSV
    pub clean_table: PathBuf,

    /// Run report JSON
    pub run_report: PathBuf,

    /// Directory receiving chart files
    pub reports_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_records: PathBuf::from("data/raw/movies.json"),
            clean_table: PathBuf::from("data/processed/movies_clean.csv"),
            run_report: PathBuf::from("data/processed/run_report.json"),
            reports_dir: PathBuf::from("reports/figures"),
        }
    }
}

/// Transformer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Minimum non-null cells a row needs to survive quality filtering
    pub min_non_null: usize,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self { min_non_null: 10 }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Catalog source
    #[serde(default)]
    pub source: SourceConfig,

    /// Artifact paths
    #[serde(default)]
    pub paths: PathsConfig,

    /// Transformer settings
    #[serde(default)]
    pub transform: TransformSettings,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            paths: PathsConfig::default(),
            transform: TransformSettings::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Read the catalog API key from the environment
    pub fn api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.source.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey(self.source.api_key_env.clone())),
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("{0} not found in environment or .env file")]
    MissingApiKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.transform.min_non_null, 10);
        assert_eq!(config.source.api_key_env, "API_KEY");
        assert_eq!(config.source.movie_ids.len(), 18);
        assert!(!config.source.movie_ids.contains(&0));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [source]
            movie_ids = [1, 2]
            request_delay_ms = 0

            [source.retry]
            max_retries = 1
            initial_backoff_ms = 10
            max_backoff_ms = 20
            backoff_multiplier = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.source.movie_ids, vec![1, 2]);
        assert_eq!(config.source.request_delay_ms, 0);
        assert_eq!(config.source.timeout_secs, 10);
        assert_eq!(config.source.retry.max_retries, 1);
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn empty_sections_fall_back_to_defaults() {
        let config = Config::from_toml(
            r#"
            [transform]

            [paths]
            clean_table = "out/clean.csv"

            [source.retry]
            max_retries = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.transform.min_non_null, 10);
        assert_eq!(config.paths.clean_table, PathBuf::from("out/clean.csv"));
        assert_eq!(config.paths.run_report, PathsConfig::default().run_report);
        assert_eq!(config.source.retry.max_retries, 5);
        assert_eq!(config.source.retry.initial_backoff_ms, 500);
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.source, parsed.source);
        assert_eq!(config.paths, parsed.paths);
    }

    #[test]
    fn missing_api_key_is_reported() {
        let mut config = Config::default();
        config.source.api_key_env = "CINEMETRICS_TEST_UNSET_KEY".to_string();
        let err = config.api_key().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey(ref name) if name == "CINEMETRICS_TEST_UNSET_KEY"));
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let mut config = Config::default();
        config.project_root = PathBuf::from("/tmp/project");
        assert_eq!(
            config.resolve(&config.paths.clean_table),
            PathBuf::from("/tmp/project/data/processed/movies_clean.csv")
        );
        assert_eq!(config.resolve(Path::new("/abs")), PathBuf::from("/abs"));
    }
}
