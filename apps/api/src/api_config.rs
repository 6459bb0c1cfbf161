use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use tagpulse_core::AppError;
use tagpulse_infrastructure::PipelineSettings;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub redis_url: Option<String>,
    pub cron_secret: Option<String>,
    pub pipeline: PipelineSettings,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = match optional_non_empty_env("API_PORT") {
            Some(value) => value.parse::<u16>().map_err(|error| {
                AppError::Config(format!("invalid API_PORT value '{value}': {error}"))
            })?,
            None => 3001,
        };

        Ok(Self {
            api_host,
            api_port,
            redis_url: optional_non_empty_env("REDIS_URL"),
            cron_secret: optional_non_empty_env("CRON_SECRET"),
            pipeline: PipelineSettings::from_env()?,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Config(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;

        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
