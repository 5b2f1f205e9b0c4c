//! Configuration infrastructure
//!
//! Contains configuration loading and validation for salary crawling.
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (see [`defaults`])
//! 2. A TOML file, `config/default.toml` unless another path is given
//! 3. Environment variables prefixed with `SALARY_CRAWLER`, using `__` as the
//!    section separator (e.g. `SALARY_CRAWLER__PACING__REQUEST_DELAY_MS=0`)

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::infrastructure::parsing::ParsingConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config from file: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub pacing: PacingConfig,
    pub resolution: ResolutionConfig,
    pub extraction: ExtractionConfig,
    pub parsing: ParsingConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Source site endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL, also used to absolutize search result links
    pub base_url: String,
    /// Path of the search endpoint
    pub search_path: String,
    /// Path prefix of direct profile pages
    pub profile_path: String,
}

/// HTTP client behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Browser-like identification header sent with every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Connect timeout in seconds
    pub connect_timeout_seconds: u64,
}

/// Bounded exponential backoff for transport failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

/// Request pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay after every request
    pub request_delay_ms: u64,
    /// Delay after every `cooldown_every`-th request, replacing the short one
    pub cooldown_delay_ms: u64,
    pub cooldown_every: u64,
}

/// How a job title is turned into a profile URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// Build the profile URL from the job title slug, no network
    #[default]
    Direct,
    /// Query the site search and take the first listing
    Search,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub strategy: ResolutionStrategy,
}

/// What to do with a record whose five percentiles are all absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyRecordPolicy {
    /// Persist it like any other record
    #[default]
    Keep,
    /// Report it as skipped and leave it out of the batch
    Discard,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub empty_record_policy: EmptyRecordPolicy,
}

/// Input lists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Delimited file of city names
    pub cities_file: PathBuf,
    /// Optional delimited file of job titles; overrides `job_titles` when set
    pub job_titles_file: Option<PathBuf>,
    pub job_titles: Vec<String>,
}

/// Kind of persistence target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Csv,
    Json,
    Xlsx,
    Sqlite,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
            Self::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

/// Output sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Base file name shared by the file sinks; any extension is replaced
    pub base_name: String,
    pub sinks: Vec<SinkKind>,
    pub database_name: String,
    pub table_name: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,
    pub json_format: bool,
    pub console_output: bool,
    pub file_output: bool,
    /// Directory for the log file; relative paths resolve against the working directory
    pub directory: PathBuf,
    pub file_name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: salary_com::BASE_URL.to_string(),
            search_path: salary_com::SEARCH_PATH.to_string(),
            profile_path: salary_com::PROFILE_PATH.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            connect_timeout_seconds: defaults::CONNECT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
            backoff_multiplier: defaults::RETRY_BACKOFF_MULTIPLIER,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            cooldown_delay_ms: defaults::COOLDOWN_DELAY_MS,
            cooldown_every: defaults::COOLDOWN_EVERY,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            cities_file: PathBuf::from(defaults::CITIES_FILE),
            job_titles_file: None,
            job_titles: vec![defaults::JOB_TITLE.to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            base_name: defaults::OUTPUT_BASE_NAME.to_string(),
            sinks: vec![SinkKind::Csv, SinkKind::Xlsx, SinkKind::Json, SinkKind::Sqlite],
            database_name: defaults::DATABASE_NAME.to_string(),
            table_name: defaults::TABLE_NAME.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            directory: PathBuf::from("logs"),
            file_name: defaults::LOG_FILE_NAME.to_string(),
        }
    }
}

impl RetryConfig {
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl AppConfig {
    /// Load from a config file (extension optional) plus environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("output.sinks")
                    .with_list_parse_key("input.job_titles")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!("Loaded configuration from: {:?}", path);
        Ok(config)
    }

    /// Load `config/default` if present, otherwise built-in defaults; env overrides apply either way
    pub fn load_default() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(defaults::CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("output.sinks")
                    .with_list_parse_key("input.job_titles")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(validation("retry.max_attempts must be greater than 0"));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(validation("retry.base_delay_ms cannot be greater than retry.max_delay_ms"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(validation("retry.backoff_multiplier must be at least 1.0"));
        }
        if self.pacing.cooldown_every == 0 {
            return Err(validation("pacing.cooldown_every must be greater than 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(validation("http.user_agent must not be empty"));
        }
        if self.output.sinks.is_empty() {
            return Err(validation("output.sinks must name at least one sink"));
        }
        if self.input.job_titles_file.is_none()
            && self.input.job_titles.iter().all(|t| t.trim().is_empty())
        {
            return Err(validation("input.job_titles is empty and no input.job_titles_file is set"));
        }
        if url::Url::parse(&self.site.base_url).is_err() {
            return Err(ConfigError::Validation {
                message: format!("site.base_url is not an absolute URL: {}", self.site.base_url),
            });
        }
        Ok(())
    }
}

fn validation(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}

/// Salary.com URLs
pub mod salary_com {
    pub const BASE_URL: &str = "https://www.salary.com";

    /// Search endpoint; query is `type=job&page=1&keyword={title}`
    pub const SEARCH_PATH: &str = "/research/search";

    /// Direct profile pages live at `{PROFILE_PATH}/{job-slug}-salary/{city}`
    pub const PROFILE_PATH: &str = "/research/salary/alternate";
}

/// Default configuration values
pub mod defaults {
    pub const CONFIG_FILE: &str = "config/default";

    pub const ENV_PREFIX: &str = "SALARY_CRAWLER";

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const CONNECT_TIMEOUT_SECONDS: u64 = 10;

    pub const RETRY_MAX_ATTEMPTS: u32 = 3;

    pub const RETRY_BASE_DELAY_MS: u64 = 1000;

    pub const RETRY_MAX_DELAY_MS: u64 = 30_000;

    pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;

    /// Short delay after each request
    pub const REQUEST_DELAY_MS: u64 = 500;

    /// Longer delay after every `COOLDOWN_EVERY` requests
    pub const COOLDOWN_DELAY_MS: u64 = 2000;

    pub const COOLDOWN_EVERY: u64 = 10;

    pub const CITIES_FILE: &str = "largest_cities.csv";

    pub const JOB_TITLE: &str = "senior accountant";

    pub const OUTPUT_BASE_NAME: &str = "salary_results";

    pub const DATABASE_NAME: &str = "salary_results.db";

    pub const TABLE_NAME: &str = "salary";

    pub const LOG_LEVEL: &str = "info";

    pub const LOG_FILE_NAME: &str = "salary-crawler.log";
}
