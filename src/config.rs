use std::env;

use crate::error::ConfigError;

/// How `.clan` results are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CensusMode {
    /// Per-class counts as a plain text summary.
    Text,
    /// Pie chart image attachment, counts encoded as slices.
    Chart,
}

/// Process configuration, read from the environment exactly once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub mongodb_url: String,
    pub db_name: String,
    pub census_mode: CensusMode,
    pub keepalive_port: u16,
}

pub const DEFAULT_KEEPALIVE_PORT: u16 = 8080;

fn required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::MissingEnvVar(var))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let census_mode = match env::var("CENSUS_MODE") {
            Ok(value) => match value.as_str() {
                "text" => CensusMode::Text,
                "chart" => CensusMode::Chart,
                other => {
                    return Err(ConfigError::InvalidEnvValue {
                        var: "CENSUS_MODE",
                        reason: format!("expected \"text\" or \"chart\", got {other:?}"),
                    })
                }
            },
            Err(_) => CensusMode::Chart,
        };

        let keepalive_port = match env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidEnvValue {
                var: "PORT",
                reason: format!("expected a port number, got {value:?}"),
            })?,
            Err(_) => DEFAULT_KEEPALIVE_PORT,
        };

        Ok(Config {
            discord_token: required("TOKEN")?,
            mongodb_url: required("URL_MONGODB")?,
            db_name: required("DB_NAME")?,
            census_mode,
            keepalive_port,
        })
    }
}
