// Jobmatch Settings - configuration loading and logging setup

mod app_config;
mod logging;

pub use app_config::{AppConfig, SettingsError, CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use logging::{init_tracing, LOG_FORMAT_ENV_VAR};
