//! Handles settings for the application. Configuration is written in
//! `settings.toml` and every value can be overridden with a `KOPILKA__*`
//! environment variable.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level passed to the tracing filter, e.g. `info` or `debug`.
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    /// OAuth bearer token for the Google Sheets and Drive APIs.
    pub sheets_token: String,
    /// Service account address users must share their spreadsheets with.
    pub service_email: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub telegram: Option<Telegram>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .add_source(Environment::with_prefix("KOPILKA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
