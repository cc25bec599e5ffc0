// Application Configuration
//
// Layers, lowest precedence first: built-in defaults, TOML file, then
// JOBMATCH__* environment variables (`__` separates nested keys).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use jobmatch_core::application::constants::{DEFAULT_MAX_CONCURRENCY, DEFAULT_TOP_N_GAPS};
use jobmatch_core::domain::SourceConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_PREFIX: &str = "JOBMATCH";
pub const CONFIG_ENV_VAR: &str = "JOBMATCH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "jobmatch.toml";
const DEFAULT_DB_FILE: &str = "jobmatch.db";
const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 3600;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// SQLite file; `~` is expanded. Defaults to the platform data dir.
    #[serde(default)]
    pub database_path: Option<String>,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// Daily-rolling log files are written here when set
    #[serde(default)]
    pub log_dir: Option<String>,

    #[serde(default = "default_top_n")]
    pub top_n_gaps: usize,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_cycle_interval() -> u64 {
    DEFAULT_CYCLE_INTERVAL_SECS
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N_GAPS
}

impl AppConfig {
    /// Load from `path` (required when given) or `./jobmatch.toml` (optional),
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_layered(path, ENV_PREFIX)
    }

    fn load_layered(path: Option<&Path>, env_prefix: &str) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: AppConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.max_concurrency == 0 {
            return Err(SettingsError::Invalid("max_concurrency must be at least 1".into()));
        }
        if self.cycle_interval_secs == 0 {
            return Err(SettingsError::Invalid("cycle_interval_secs must be at least 1".into()));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(SettingsError::Invalid(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }
        // Per-source validation happens at pipeline start so one bad source
        // does not stop the others
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
            None => ProjectDirs::from("dev", "jobmatch", "jobmatch")
                .map(|dirs| dirs.data_dir().join(DEFAULT_DB_FILE))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE)),
        }
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .as_deref()
            .map(|dir| PathBuf::from(shellexpand::tilde(dir).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobmatch_core::domain::AdapterKind;

    /// Write `contents` to a unique temp file
    fn temp_config(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("jobmatch-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let missing = std::env::temp_dir().join("does-not-exist-jobmatch");
        // An explicit path must exist
        assert!(AppConfig::load_layered(Some(&missing), "JOBMATCH_T0").is_err());

        let path = temp_config("");
        let config = AppConfig::load_layered(Some(&path), "JOBMATCH_T1").unwrap();
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(config.top_n_gaps, DEFAULT_TOP_N_GAPS);
        assert!(config.sources.is_empty());
        assert!(config.database_path().ends_with(DEFAULT_DB_FILE));
    }

    #[test]
    fn test_sources_from_toml() {
        let path = temp_config(
            r#"
            database_path = "~/jobs/jobmatch.db"
            max_concurrency = 2

            [[sources]]
            name = "remote-api"
            kind = "api"
            extract_skills = true

            [sources.rate_limit]
            requests = 10
            interval_ms = 60000

            [sources.connection]
            url = "https://jobs.example.com/api"
            skip_entries = 1

            [sources.field_map]
            title = "position"
            company = "company_name"

            [[sources]]
            name = "feed"
            kind = "rss"
            enabled = false

            [sources.connection]
            feeds = ["https://feed.example.com/rss"]
            "#,
        );

        let config = AppConfig::load_layered(Some(&path), "JOBMATCH_T2").unwrap();

        assert_eq!(config.max_concurrency, 2);
        assert!(!config.database_path().starts_with("~"));
        assert_eq!(config.sources.len(), 2);

        let api = &config.sources[0];
        assert_eq!(api.kind, AdapterKind::Api);
        assert_eq!(api.rate_limit.requests, 10);
        assert_eq!(api.retry.max_attempts, 5);
        assert_eq!(api.connection.skip_entries, 1);
        assert_eq!(api.mapping().company.as_deref(), Some("company_name"));
        assert!(api.validate().is_ok());

        assert!(!config.sources[1].enabled);
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = temp_config("max_concurrency = 2\ncycle_interval_secs = 60");
        std::env::set_var("JOBMATCH_T3__MAX_CONCURRENCY", "8");

        let config = AppConfig::load_layered(Some(&path), "JOBMATCH_T3").unwrap();

        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.cycle_interval_secs, 60);
    }

    #[test]
    fn test_duplicate_source_names_rejected() {
        let path = temp_config(
            r#"
            [[sources]]
            name = "dup"
            kind = "api"
            [[sources]]
            name = "dup"
            kind = "rss"
            "#,
        );

        assert!(matches!(
            AppConfig::load_layered(Some(&path), "JOBMATCH_T4"),
            Err(SettingsError::Invalid(_))
        ));
    }
}
