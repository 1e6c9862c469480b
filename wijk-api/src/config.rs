use std::str::FromStr;

use serde::Deserialize;
use serde_with::serde_as;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use strum::{Display, EnumString};

use crate::{
    adapters::outbound::RetryPolicy,
    domain::services::{TrackingRules, DEFAULT_EDIT_WINDOW_DAYS},
};

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub time_tracking: TimeTrackingSettings,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub app_url: String,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

/// Tunables of the tracking engine and its store.
#[serde_as]
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct TimeTrackingSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub edit_window_days: i64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub clock_skew_tolerance_secs: i64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub store_timeout_ms: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub store_max_retries: usize,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub store_retry_backoff_ms: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub directory_cache_ttl_secs: u64,
}

impl Default for TimeTrackingSettings {
    fn default() -> Self {
        Self {
            edit_window_days: DEFAULT_EDIT_WINDOW_DAYS,
            clock_skew_tolerance_secs: 60,
            store_timeout_ms: 5_000,
            store_max_retries: 3,
            store_retry_backoff_ms: 50,
            directory_cache_ttl_secs: 300,
        }
    }
}

impl TimeTrackingSettings {
    pub fn rules(&self) -> TrackingRules {
        TrackingRules {
            edit_window: time::Duration::days(self.edit_window_days),
            clock_skew_tolerance: time::Duration::seconds(self.clock_skew_tolerance_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: std::time::Duration::from_millis(self.store_timeout_ms),
            max_retries: self.store_max_retries,
            initial_backoff: std::time::Duration::from_millis(self.store_retry_backoff_ms),
            ..RetryPolicy::default()
        }
    }

    pub fn directory_cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.directory_cache_ttl_secs)
    }
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {e}"))
    })?;
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {e}")))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("WIJK")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
