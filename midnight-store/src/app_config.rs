use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scheduler: SchedulerSettings,
    pub automation: AutomationSettings,
    pub smtp: SmtpSettings,
    pub auth: AuthConfig,
    pub vault: VaultConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: i64,
    #[serde(default = "default_lookahead_minutes")]
    pub lookahead_minutes: i64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_tick_seconds() -> u64 {
    60
}
fn default_lookback_minutes() -> i64 {
    5
}
fn default_lookahead_minutes() -> i64 {
    1
}
fn default_max_concurrent() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct AutomationSettings {
    pub site_url: String,
    pub webdriver_url: String,
    #[serde(default = "default_results_timeout")]
    pub results_timeout_seconds: u64,
}

fn default_results_timeout() -> u64 {
    30
}

/// Outbound notification settings. `host = None` disables email dispatch
/// (the executor falls back to a no-op notifier).
#[derive(Debug, Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    pub app_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    /// 32-byte AES-256-GCM key, hex encoded
    pub key_hex: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // MIDNIGHT__SERVER__PORT=8080 etc.
            .add_source(config::Environment::with_prefix("MIDNIGHT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
