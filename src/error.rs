//! Error types for the analytics engines

use thiserror::Error;

/// Errors that can occur while deriving analytics from price history
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Series too short for the requested statistic
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Non-positive price, volatility, expiry, or count
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Zero variance or similar would produce NaN/inf
    #[error("Numerically degenerate input: {0}")]
    NumericDegenerate(String),

    #[error("Simulation cancelled after {completed} of {requested} paths")]
    Cancelled { completed: usize, requested: usize },

    #[error("Simulation timed out after {completed} of {requested} paths")]
    Timeout { completed: usize, requested: usize },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
