use crate::constants::DEFAULT_OTP_CODE_LENGTH;
use crate::flow::OtpPolicy;
use config::{self, ConfigError, Environment};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    pub workers: usize,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    pub flow_ttl_minutes: i64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OtpMode {
    Real,
    Simulated,
    Bypass,
}

#[derive(Debug, Deserialize)]
pub struct OtpSettings {
    pub mode: OtpMode,
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout_milliseconds: u64,
    pub max_attempts: u32,
    pub validity_seconds: i64,
    #[serde(default = "default_otp_code_length")]
    pub code_length: usize,
}

fn default_otp_code_length() -> usize {
    DEFAULT_OTP_CODE_LENGTH
}

impl OtpSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn policy(&self) -> OtpPolicy {
        OtpPolicy {
            max_attempts: self.max_attempts,
            validity: chrono::Duration::seconds(self.validity_seconds),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeadSinkKind {
    Sheet,
    Postgres,
}

#[derive(Debug, Deserialize)]
pub struct LeadSinkSettings {
    pub kind: LeadSinkKind,
    pub sheet_url: String,
    pub timeout_milliseconds: u64,
    pub timestamp_format: String,
}

impl LeadSinkSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: SecretString,
    pub port: u16,
    pub host: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db()
            .database(&self.name)
            .log_statements(tracing::log::LevelFilter::Trace)
    }
}

#[derive(Debug, Deserialize)]
pub struct TelemetrySettings {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub otp: OtpSettings,
    pub lead_sink: LeadSinkSettings,
    pub database: DatabaseSettings,
    pub telemetry: TelemetrySettings,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");
    let builder = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("configuration.yaml"),
        ))
        .add_source(
            Environment::with_prefix("LEAD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("application.allowed_origins"),
        )
        .build()?;
    builder.try_deserialize::<Settings>()
}
