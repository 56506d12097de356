// Error types for configuration and replay input handling
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetricsError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
