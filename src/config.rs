use std::env;
use std::fs;
use std::time::Duration;

use crate::error::SummarizerError;

const DEFAULT_CLICKHOUSE_HOST: &str = "127.0.0.1";
const DEFAULT_CLICKHOUSE_PORT: u16 = 8123;
const DEFAULT_CLICKHOUSE_USER: &str = "default";
const DEFAULT_CLICKHOUSE_DATABASE: &str = "api_keyspace";
const DEFAULT_TRITON_SERVER_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TRITON_MODEL_NAME: &str = "summarization_model";
const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 180;
const DEFAULT_API_HOST: &str = "127.0.0.1";
pub const DEFAULT_API_PORT: u16 = 8090;

#[derive(Debug, Clone)]
pub struct Settings {
    pub clickhouse_host: String,
    pub clickhouse_port: u16,
    pub clickhouse_user: String,
    pub clickhouse_password: String,
    pub clickhouse_database: String,
    /// Base URL of the Triton HTTP endpoint (KServe v2 protocol)
    pub triton_server_url: String,
    pub triton_model_name: String,
    pub inference_timeout: Duration,
    /// Refuse to start unless the model reports ready
    pub inference_ensure_ready: bool,
    pub api_host: String,
    pub api_port: u16,
}

impl Settings {
    /// Validates the settings and returns an error if invalid.
    pub fn validate(&self) -> Result<(), SummarizerError> {
        validate_host(&self.clickhouse_host)?;
        validate_port(self.clickhouse_port)?;
        validate_host(&self.api_host)?;
        validate_port(self.api_port)?;
        if self.triton_model_name.trim().is_empty() {
            return Err(SummarizerError::Config("Model name cannot be empty".into()));
        }
        if self.inference_timeout.is_zero() {
            return Err(SummarizerError::Config(
                "Inference timeout cannot be 0".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn clickhouse_url(&self) -> String {
        format!("http://{}:{}", self.clickhouse_host, self.clickhouse_port)
    }

    #[must_use]
    pub fn api_bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// Validates that the host is not empty or whitespace-only.
fn validate_host(host: &str) -> Result<(), SummarizerError> {
    if host.trim().is_empty() {
        return Err(SummarizerError::Config("Host cannot be empty".into()));
    }
    Ok(())
}

/// Validates that the port is in valid range (1-65535).
fn validate_port(port: u16) -> Result<(), SummarizerError> {
    if port == 0 {
        return Err(SummarizerError::Config("Port cannot be 0".into()));
    }
    Ok(())
}

/// Read a value from environment variable, with support for _FILE suffix (Docker Secrets)
fn get_env_or_file(env_name: &str) -> Result<Option<String>, SummarizerError> {
    let file_env = format!("{env_name}_FILE");
    if let Ok(file_path) = env::var(&file_env) {
        return fs::read_to_string(&file_path)
            .map(|content| Some(content.trim().to_string()))
            .map_err(|e| SummarizerError::Config(format!("Failed to read {file_env}: {e}")));
    }

    Ok(env::var(env_name).ok())
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(name: &str, default: T) -> Result<T, SummarizerError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| SummarizerError::Config(format!("invalid value for {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

pub fn get_configuration() -> Result<Settings, SummarizerError> {
    let clickhouse_host = env_or("APP_CLICKHOUSE_HOST", DEFAULT_CLICKHOUSE_HOST);
    let clickhouse_port = parse_env("APP_CLICKHOUSE_PORT", DEFAULT_CLICKHOUSE_PORT)?;
    let clickhouse_user = env_or("APP_CLICKHOUSE_USER", DEFAULT_CLICKHOUSE_USER);
    let clickhouse_password = get_env_or_file("APP_CLICKHOUSE_PASSWORD")?.unwrap_or_default();
    let clickhouse_database = env_or("APP_CLICKHOUSE_DATABASE", DEFAULT_CLICKHOUSE_DATABASE);

    let triton_server_url = env_or("TRITON_SERVER_URL", DEFAULT_TRITON_SERVER_URL);
    let triton_model_name = env_or("TRITON_MODEL_NAME", DEFAULT_TRITON_MODEL_NAME);
    let inference_timeout = Duration::from_secs(parse_env(
        "INFERENCE_TIMEOUT_SECS",
        DEFAULT_INFERENCE_TIMEOUT_SECS,
    )?);
    let inference_ensure_ready = parse_env("INFERENCE_ENSURE_READY", true)?;

    let api_host = env_or("API_HOST", DEFAULT_API_HOST);
    let api_port = parse_env("API_PORT", DEFAULT_API_PORT)?;

    let settings = Settings {
        clickhouse_host,
        clickhouse_port,
        clickhouse_user,
        clickhouse_password,
        clickhouse_database,
        triton_server_url,
        triton_model_name,
        inference_timeout,
        inference_ensure_ready,
        api_host,
        api_port,
    };

    settings.validate()?;

    Ok(settings)
}
