use std::io;
use thiserror::Error;

/// Unified error type for lchat
#[derive(Error, Debug)]
pub enum LchatError {
    /// Missing or invalid preference value
    #[error("{0}")]
    Config(String),

    /// Soft per-session quota reached
    #[error("Quota warning: Exceeded {0} calls this session.")]
    QuotaExceeded(u32),

    /// Chat request still failing after every retry
    #[error("Request failed after {retries} retries: {last}")]
    RequestFailed { retries: u32, last: String },

    /// Response body did not have the expected shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Malformed `custom_presets` JSON
    #[error("Invalid presets JSON: {0}")]
    PresetJson(String),

    /// API-related errors (model catalog, image endpoint)
    #[error("API error: {0}")]
    Api(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),
}

impl LchatError {
    /// Short name shown as the title of an error result item.
    pub fn title(&self) -> &'static str {
        match self {
            LchatError::Config(_) => "Failed to parse preferences",
            LchatError::QuotaExceeded(_) => "Quota Exceeded",
            LchatError::RequestFailed { .. } => "Request failed",
            LchatError::Parse(_) => "Parse error",
            LchatError::Io { .. } => "File error",
            LchatError::PresetJson(_) => "Invalid presets",
            LchatError::Api(_) => "API error",
            LchatError::Network(_) => "Network error",
            LchatError::Serialization(_) => "Serialization error",
            LchatError::Input(_) => "Input error",
        }
    }
}

impl From<reqwest::Error> for LchatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LchatError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            LchatError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            LchatError::Api(format!("API returned error status: {}", err))
        } else if err.is_decode() {
            LchatError::Parse(err.to_string())
        } else {
            LchatError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for LchatError {
    fn from(err: serde_json::Error) -> Self {
        LchatError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for LchatError {
    fn from(err: serde_yml::Error) -> Self {
        LchatError::Serialization(format!("YAML error: {}", err))
    }
}
