use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::SlotWindow;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub google: GoogleSettings,
    #[serde(default)]
    pub slots: SlotSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub defaults: DefaultsSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

/// Google Calendar access. Every credential is optional; without any of
/// them the service runs on synthetic availability only.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleSettings {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub service_account_file: Option<String>,
    /// User to impersonate with domain-wide delegation
    pub delegated_subject: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Budget for a whole availability lookup before falling back
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_url: default_token_url(),
            calendar_id: default_calendar_id(),
            client_id: None,
            client_secret: None,
            refresh_token: None,
            access_token: None,
            service_account_file: None,
            delegated_subject: None,
            request_timeout_secs: default_request_timeout_secs(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

fn default_api_base() -> String { "https://www.googleapis.com/calendar/v3".to_string() }
fn default_token_url() -> String { "https://oauth2.googleapis.com/token".to_string() }
fn default_calendar_id() -> String { "primary".to_string() }
fn default_request_timeout_secs() -> u64 { 10 }
fn default_lookup_timeout_secs() -> u64 { 15 }

/// Business-hours sweep used to produce interviewer slots
#[derive(Debug, Clone, Deserialize)]
pub struct SlotSettings {
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default = "default_business_start_hour")]
    pub business_start_hour: u32,
    #[serde(default = "default_business_end_hour")]
    pub business_end_hour: u32,
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,
    /// Overrides the built-in fixture served by the basic synthetic source
    #[serde(default)]
    pub basic_fixture: Vec<String>,
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            duration_minutes: default_duration_minutes(),
            business_start_hour: default_business_start_hour(),
            business_end_hour: default_business_end_hour(),
            days_ahead: default_days_ahead(),
            basic_fixture: Vec::new(),
        }
    }
}

impl SlotSettings {
    pub fn window(&self) -> SlotWindow {
        SlotWindow {
            duration_minutes: self.duration_minutes,
            business_start_hour: self.business_start_hour,
            business_end_hour: self.business_end_hour,
            days_ahead: self.days_ahead,
        }
    }
}

fn default_duration_minutes() -> u32 { 60 }
fn default_business_start_hour() -> u32 { 9 }
fn default_business_end_hour() -> u32 { 17 }
fn default_days_ahead() -> u32 { 14 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 { 60 }
fn default_cache_capacity() -> u64 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsSettings {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_event_duration_minutes")]
    pub event_duration_minutes: u32,
}

impl Default for DefaultsSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            event_duration_minutes: default_event_duration_minutes(),
        }
    }
}

fn default_timezone() -> String { "UTC".to_string() }
fn default_event_duration_minutes() -> u32 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SCHEDULER_)
    /// 5. Well-known variables such as GOOGLE_CLIENT_ID or DEFAULT_TIMEZONE
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SCHEDULER__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SCHEDULER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_well_known_env(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SCHEDULER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Variables deployments already export for the Google client and the
/// default zone, mapped onto their config keys
const WELL_KNOWN_ENV: &[(&str, &str)] = &[
    ("GOOGLE_CLIENT_ID", "google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "google.client_secret"),
    ("GOOGLE_REFRESH_TOKEN", "google.refresh_token"),
    ("GOOGLE_ACCESS_TOKEN", "google.access_token"),
    ("GOOGLE_SERVICE_ACCOUNT_FILE", "google.service_account_file"),
    ("GOOGLE_CALENDAR_ID", "google.calendar_id"),
    ("DEFAULT_TIMEZONE", "defaults.timezone"),
];

fn apply_well_known_env(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in WELL_KNOWN_ENV {
        if let Ok(value) = std::env::var(var) {
            if !value.trim().is_empty() {
                builder = builder.set_override(*key, value)?;
            }
        }
    }

    builder.build()
}
