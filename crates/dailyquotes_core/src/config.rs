//! Runtime configuration.
//!
//! # Responsibility
//! - Hold every tunable the composition root needs.
//! - Apply `DAILYQUOTES_*` environment overrides on top of defaults.
//! - Resolve the data dir from a flag, the environment or the home directory.
//!
//! # Invariants
//! - A config that passed `validate` has a positive page size, non-zero
//!   durations and an absolute data directory.

use crate::api::{QuotesApiConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::db::DB_FILE_NAME;
use crate::feed::paginator::{PaginatorConfig, DEFAULT_PAGE_SIZE};
use crate::logging::default_log_level;
use crate::notifier::DEFAULT_NOTIFY_INTERVAL;
use crate::settings::SETTINGS_FILE_NAME;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const ENV_DATA_DIR: &str = "DAILYQUOTES_DATA_DIR";
pub const ENV_API_BASE_URL: &str = "DAILYQUOTES_API_BASE_URL";
pub const ENV_PAGE_SIZE: &str = "DAILYQUOTES_PAGE_SIZE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "DAILYQUOTES_REQUEST_TIMEOUT_SECS";
pub const ENV_NOTIFY_INTERVAL_SECS: &str = "DAILYQUOTES_NOTIFY_INTERVAL_SECS";
pub const ENV_LOG_LEVEL: &str = "DAILYQUOTES_LOG_LEVEL";
pub const ENV_ROLLBACK_ON_FETCH_ERROR: &str = "DAILYQUOTES_ROLLBACK_ON_FETCH_ERROR";

const DATA_DIR_NAME: &str = ".dailyquotes";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment value could not be parsed.
    InvalidValue { key: &'static str, value: String },
    /// A parsed value violates a range rule.
    OutOfRange { key: &'static str, reason: &'static str },
    /// No data dir was given and the home directory is unknown.
    NoHomeDir,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value for {key}: `{value}`"),
            Self::OutOfRange { key, reason } => write!(f, "{key} {reason}"),
            Self::NoHomeDir => write!(
                f,
                "could not determine the home directory; set {ENV_DATA_DIR} or pass --data-dir"
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Holds the database, the settings file and the log directory.
    pub data_dir: PathBuf,
    pub api_base_url: Url,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub notify_interval: Duration,
    pub log_level: String,
    pub rollback_on_fetch_error: bool,
}

impl AppConfig {
    /// Built-in defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            api_base_url: QuotesApiConfig::default().base_url,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            notify_interval: DEFAULT_NOTIFY_INTERVAL,
            log_level: default_log_level().to_string(),
            rollback_on_fetch_error: false,
        }
    }

    /// Defaults overridden by process environment, then validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_data_dir(None)
    }

    /// Like `from_env`, but an explicit `data_dir` wins over
    /// `DAILYQUOTES_DATA_DIR` and the home-directory default.
    pub fn from_env_with_data_dir(data_dir: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve(data_dir, |key| std::env::var(key).ok(), dirs::home_dir)
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::resolve(None, lookup, dirs::home_dir)
    }

    /// Data dir resolution order: `explicit`, `DAILYQUOTES_DATA_DIR`,
    /// then `~/.dailyquotes`.
    fn resolve(
        explicit: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
        home_dir: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = match explicit {
            Some(dir) => dir,
            None => match get(ENV_DATA_DIR) {
                Some(value) => PathBuf::from(value.trim()),
                None => home_dir().ok_or(ConfigError::NoHomeDir)?.join(DATA_DIR_NAME),
            },
        };
        let mut config = Self::with_data_dir(data_dir);

        if let Some(value) = get(ENV_API_BASE_URL) {
            config.api_base_url = Url::parse(value.trim())
                .map_err(|_| invalid(ENV_API_BASE_URL, &value))?;
        }
        if let Some(value) = get(ENV_PAGE_SIZE) {
            config.page_size = parse_number(ENV_PAGE_SIZE, &value)?;
        }
        if let Some(value) = get(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout =
                Duration::from_secs(parse_number(ENV_REQUEST_TIMEOUT_SECS, &value)?);
        }
        if let Some(value) = get(ENV_NOTIFY_INTERVAL_SECS) {
            config.notify_interval =
                Duration::from_secs(parse_number(ENV_NOTIFY_INTERVAL_SECS, &value)?);
        }
        if let Some(value) = get(ENV_LOG_LEVEL) {
            config.log_level = value.trim().to_ascii_lowercase();
        }
        if let Some(value) = get(ENV_ROLLBACK_ON_FETCH_ERROR) {
            config.rollback_on_fetch_error = parse_flag(ENV_ROLLBACK_ON_FETCH_ERROR, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(out_of_range(ENV_PAGE_SIZE, "must be greater than zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(out_of_range(ENV_REQUEST_TIMEOUT_SECS, "must be greater than zero"));
        }
        if self.notify_interval.is_zero() {
            return Err(out_of_range(ENV_NOTIFY_INTERVAL_SECS, "must be greater than zero"));
        }
        if !self.data_dir.is_absolute() {
            return Err(out_of_range(ENV_DATA_DIR, "must be an absolute path"));
        }
        if !matches!(self.api_base_url.scheme(), "http" | "https") {
            return Err(out_of_range(ENV_API_BASE_URL, "must use http or https"));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }

    pub fn paginator_config(&self) -> PaginatorConfig {
        PaginatorConfig {
            page_size: self.page_size,
            rollback_on_fetch_error: self.rollback_on_fetch_error,
        }
    }

    pub fn api_config(&self) -> QuotesApiConfig {
        QuotesApiConfig {
            base_url: self.api_base_url.clone(),
            timeout: self.request_timeout,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

fn out_of_range(key: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::OutOfRange { key, reason }
}
