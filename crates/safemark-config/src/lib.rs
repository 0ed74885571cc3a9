//! Configuration management for safemark.
//!
//! Parses `safemark.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! [renderer]
//! copy_code_button = "Copy code"
//! download_table_button = "Download CSV"
//!
//! [cache]
//! capacity = 100
//! ```
//!
//! CLI settings can be applied during load via [`CliSettings`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override copy-code button label.
    pub copy_label: Option<String>,
    /// Override table download button label.
    pub download_label: Option<String>,
    /// Override fragment cache capacity.
    pub cache_capacity: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "safemark.toml";

/// Default capacity of each fragment cache.
const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Renderer affordances.
    pub renderer: RendererConfig,
    /// Fragment cache configuration.
    pub cache: CacheConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Renderer configuration.
///
/// A label enables the corresponding button; absent labels disable it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Label of the copy-code button on code blocks.
    pub copy_code_button: Option<String>,
    /// Label of the CSV download button on tables.
    pub download_table_button: Option<String>,
}

/// Cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries kept by each of the code, table and math caches.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require an optional string field to be non-empty when set.
fn require_non_empty(value: Option<&str>, field: &str) -> Result<(), ConfigError> {
    if value.is_some_and(|v| v.trim().is_empty()) {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `safemark.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values. The merged result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let start = std::env::current_dir().unwrap_or_default();
        Self::load_from(&start, config_path, cli_settings)
    }

    /// Same as [`Config::load`], discovering from `start` instead of the
    /// current directory.
    fn load_from(
        start: &Path,
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config(start) {
            Self::load_from_file(&discovered)?
        } else {
            tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(label) = &settings.copy_label {
            self.renderer.copy_code_button = Some(label.clone());
        }
        if let Some(label) = &settings.download_label {
            self.renderer.download_table_button = Some(label.clone());
        }
        if let Some(capacity) = settings.cache_capacity {
            self.cache.capacity = capacity;
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(
            self.renderer.copy_code_button.as_deref(),
            "renderer.copy_code_button",
        )?;
        require_non_empty(
            self.renderer.download_table_button.as_deref(),
            "renderer.download_table_button",
        )?;
        if self.cache.capacity == 0 {
            return Err(ConfigError::Validation(
                "cache.capacity must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn assert_validation_error(config: &Config, expected: &[&str]) {
        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ConfigError::Validation(_)));
        for part in expected {
            assert!(message.contains(part), "{message:?} lacks {part:?}");
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.renderer.copy_code_button.is_none());
        assert!(config.renderer.download_table_button.is_none());
        assert_eq!(config.cache.capacity, 100);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.capacity, 100);
        assert!(config.renderer.copy_code_button.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[renderer]
copy_code_button = "Copy code"
download_table_button = "Download CSV"

[cache]
capacity = 16
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.renderer.copy_code_button.as_deref(),
            Some("Copy code")
        );
        assert_eq!(
            config.renderer.download_table_button.as_deref(),
            Some("Download CSV")
        );
        assert_eq!(config.cache.capacity, 16);
    }

    #[test]
    fn test_parse_invalid_type() {
        let toml = r#"
[cache]
capacity = "many"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[cache]\ncapacity = 8\n");

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.cache.capacity, 8);
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_explicit_path_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");

        let err = Config::load(Some(&missing), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(path) if path == missing));
    }

    #[test]
    fn test_load_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[cache\n");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[renderer]\ncopy_code_button = \"Copy\"\n");
        let nested = dir.path().join("docs").join("guide");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::load_from(&nested, None, None).unwrap();

        assert_eq!(config.renderer.copy_code_button.as_deref(), Some("Copy"));
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_discover_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "[cache]\ncapacity = 1\n");
        let nested = dir.path().join("sub");
        std::fs::create_dir_all(&nested).unwrap();
        let near = write_config(&nested, "[cache]\ncapacity = 2\n");

        let config = Config::load_from(&nested, None, None).unwrap();

        assert_eq!(config.cache.capacity, 2);
        assert_eq!(config.config_path.as_deref(), Some(near.as_path()));
    }

    #[test]
    fn test_explicit_path_skips_discovery() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "[cache]\ncapacity = 1\n");
        let other = dir.path().join("other.toml");
        std::fs::write(&other, "[cache]\ncapacity = 3\n").unwrap();

        let config = Config::load_from(dir.path(), Some(&other), None).unwrap();

        assert_eq!(config.cache.capacity, 3);
    }

    #[test]
    fn test_apply_cli_settings_labels() {
        let mut config = Config::default();
        let overrides = CliSettings {
            copy_label: Some("Copy".to_owned()),
            download_label: Some("CSV".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.renderer.copy_code_button.as_deref(), Some("Copy"));
        assert_eq!(config.renderer.download_table_button.as_deref(), Some("CSV"));
        assert_eq!(config.cache.capacity, 100); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[renderer]\ncopy_code_button = \"File\"\n[cache]\ncapacity = 5\n",
        );
        let overrides = CliSettings {
            copy_label: Some("Flag".to_owned()),
            cache_capacity: Some(50),
            ..Default::default()
        };

        let config = Config::load(Some(&path), Some(&overrides)).unwrap();

        assert_eq!(config.renderer.copy_code_button.as_deref(), Some("Flag"));
        assert_eq!(config.cache.capacity, 50);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert!(config.renderer.copy_code_button.is_none());
        assert_eq!(config.cache.capacity, 100);
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_cache_capacity_zero() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        assert_validation_error(&config, &["cache.capacity"]);
    }

    #[test]
    fn test_validate_empty_label() {
        let mut config = Config::default();
        config.renderer.download_table_button = Some("  ".to_owned());
        assert_validation_error(&config, &["renderer.download_table_button", "empty"]);
    }

    #[test]
    fn test_load_rejects_zero_capacity_from_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "");
        let overrides = CliSettings {
            cache_capacity: Some(0),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&overrides)).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
