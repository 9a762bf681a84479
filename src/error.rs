use thiserror::Error;

/// Startup configuration failures. These are fatal: the process logs the
/// error and exits before connecting to Discord or the database.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid value for environment variable {var}: {reason}")]
    InvalidEnvValue { var: &'static str, reason: String },
}

/// Per-request failures. Each one is contained within the message that
/// caused it; the handler logs it and keeps serving subsequent messages.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("store query failed: {0}")]
    Store(#[from] mongodb::error::Error),
    #[error("could not decode stored record: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
    #[error("class {0:?} has no palette color")]
    UnknownClass(String),
    #[error("chart rendering failed: {0}")]
    Render(String),
}
