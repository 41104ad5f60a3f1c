// Dashboard configuration loading and validation
use std::net::SocketAddr;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub endpoint_url: String,
    #[serde(default = "default_max_fan_rpm")]
    pub max_fan_rpm: f64,
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_max_rotations_per_second")]
    pub max_rotations_per_second: f64,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_max_fan_rpm() -> f64 {
    120.0
}

fn default_window_capacity() -> usize {
    30
}

fn default_reconnect_delay_ms() -> u64 {
    1200
}

fn default_max_rotations_per_second() -> f64 {
    3.0
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),
    #[error("endpoint_url is not a valid URL: {0}")]
    EndpointUrl(#[from] url::ParseError),
    #[error("endpoint_url scheme must be ws or wss, got {0}")]
    EndpointScheme(String),
    #[error("listen_addr is not a valid socket address: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),
    #[error("{0} must be positive")]
    NonPositive(&'static str),
}

pub fn load_dashboard_config() -> Result<DashboardConfig, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .build()?;

    let config: DashboardConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl DashboardConfig {
    /// Rejects unusable settings before the first connect attempt.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = Url::parse(&self.endpoint_url)?;
        match endpoint.scheme() {
            "ws" | "wss" => {}
            other => return Err(ConfigError::EndpointScheme(other.to_string())),
        }
        let _: SocketAddr = self.listen_addr.parse()?;
        if self.max_fan_rpm <= 0.0 {
            return Err(ConfigError::NonPositive("max_fan_rpm"));
        }
        if self.window_capacity == 0 {
            return Err(ConfigError::NonPositive("window_capacity"));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::NonPositive("reconnect_delay_ms"));
        }
        if self.max_rotations_per_second <= 0.0 {
            return Err(ConfigError::NonPositive("max_rotations_per_second"));
        }
        Ok(())
    }
}
