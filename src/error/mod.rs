// Error types for configuration loading and route assembly

use thiserror::Error;

/// Errors raised before the status routes start serving.
///
/// Check failures never surface here: they are rendered as 503/500 status
/// bodies by the individual checkers.
#[derive(Error, Debug)]
pub enum HealthCheckError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Unable to load configuration file ({0})")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database connection error: {0}")]
    Database(String),
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub type HealthCheckResult<T> = Result<T, HealthCheckError>;
