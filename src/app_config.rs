use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use url::Url;

use crate::database::DatabaseConnection;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Admin credential pair
    #[serde(default)]
    pub admin: AdminConfig,

    /// Document database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// YouTube Data API settings
    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// Generative-language API settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Admin session settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// The single admin account
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AdminConfig {
    // @field: Admin login email
    #[serde(default = "String::new")]
    pub email: String,

    // @field: Admin login password
    #[serde(default = "String::new")]
    pub password: String,
}

/// Document database configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// SQLite file path; the user data directory is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    /// Resolve the database file location
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => DatabaseConnection::default_database_path(),
        }
    }
}

/// YouTube Data API configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct YouTubeConfig {
    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_youtube_endpoint")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_youtube_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Generative-language API configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    // @field: Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    // @field: Timeout seconds
    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 2.0)
    /// Unset leaves the model default in place
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_gemini_endpoint(),
            model: default_gemini_model(),
            timeout_secs: default_gemini_timeout_secs(),
            temperature: None,
        }
    }
}

/// Admin session configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    /// Session file path; defaults next to the database
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Session lifetime after login, in seconds
    #[serde(default = "default_session_max_age_secs")]
    pub max_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_age_secs: default_session_max_age_secs(),
        }
    }
}

impl SessionConfig {
    /// Resolve the session file location
    pub fn resolve_path(&self, database: &DatabaseConfig) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        let db_path = database.resolve_path()?;
        let dir = db_path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(dir.join(DEFAULT_SESSION_FILENAME))
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

const DEFAULT_SESSION_FILENAME: &str = "admin_session.json";

/// Environment variables that override file settings
pub const ENV_ADMIN_EMAIL: &str = "ADMIN_EMAIL";
pub const ENV_ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
pub const ENV_YOUTUBE_API_KEY: &str = "YOUTUBE_DATA_API_KEY";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_DB_PATH: &str = "YTLEARN_DB_PATH";

fn default_timeout_secs() -> u64 {
    30
}

fn default_gemini_timeout_secs() -> u64 {
    120
}

fn default_session_max_age_secs() -> u64 {
    86_400 // one day
}

fn default_youtube_endpoint() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl Config {
    /// Load the config file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to open config file: {}", config_path.display()))?;

            return serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", config_path.display()));
        }

        warn!("Config file not found at '{}', creating default config.", config_path.display());

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", config_path.display()))?;

        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; empty values are ignored
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(email) = get(ENV_ADMIN_EMAIL) {
            self.admin.email = email;
        }
        if let Some(password) = get(ENV_ADMIN_PASSWORD) {
            self.admin.password = password;
        }
        if let Some(key) = get(ENV_YOUTUBE_API_KEY) {
            debug!("Using YouTube API key from {}", ENV_YOUTUBE_API_KEY);
            self.youtube.api_key = key;
        }
        if let Some(key) = get(ENV_GOOGLE_API_KEY) {
            debug!("Using generative-language API key from {}", ENV_GOOGLE_API_KEY);
            self.gemini.api_key = key;
        }
        if let Some(path) = get(ENV_DB_PATH) {
            self.database.path = Some(PathBuf::from(path));
        }
    }

    /// Validate the configuration for consistency and required values.
    ///
    /// API keys and admin credentials are checked where they are used, so
    /// commands that need none of them still run with an empty config.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.youtube.endpoint)
            .map_err(|e| anyhow!("Invalid YouTube endpoint '{}': {}", self.youtube.endpoint, e))?;
        Url::parse(&self.gemini.endpoint)
            .map_err(|e| anyhow!("Invalid Gemini endpoint '{}': {}", self.gemini.endpoint, e))?;

        if self.gemini.model.trim().is_empty() {
            return Err(anyhow!("Gemini model name must not be empty"));
        }

        if let Some(temperature) = self.gemini.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(anyhow!("Gemini temperature must be between 0.0 and 2.0, got {}", temperature));
            }
        }

        if self.youtube.timeout_secs == 0 || self.gemini.timeout_secs == 0 {
            return Err(anyhow!("Request timeouts must be greater than zero"));
        }

        if self.session.max_age_secs == 0 {
            return Err(anyhow!("Session max age must be greater than zero"));
        }

        Ok(())
    }
}
