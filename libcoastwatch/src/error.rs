//! Error types for Coastwatch

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoastwatchError>;

#[derive(Error, Debug)]
pub enum CoastwatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Local storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Missing information: {0}")]
    InvalidInput(String),

    #[error("Location error: {0}")]
    LocationUnavailable(String),

    #[error("Authentication error: {0}")]
    AuthRequired(String),
}

impl CoastwatchError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CoastwatchError::InvalidInput(_) => 3,
            CoastwatchError::LocationUnavailable(_) => 3,
            CoastwatchError::AuthRequired(_) => 2,
            CoastwatchError::Api(_) => 1,
            CoastwatchError::Config(_) => 1,
            CoastwatchError::Store(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Corrupted state file: {0}")]
    Corrupted(String),
}

/// Failures talking to the remote hazard-report API
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Connectivity failure, timeout or unreadable response stream
    #[error("{0}")]
    Network(String),

    /// Non-2xx response; carries the plain-text body or a status fallback
    #[error("Server error: {0}")]
    Status(String),

    /// 2xx response whose envelope reported `success: false`
    #[error("Server error: {0}")]
    Rejected(String),

    /// Response body did not match the expected envelope
    #[error("Server error: malformed response ({0})")]
    Malformed(String),
}

impl ApiError {
    /// Message suitable for showing to the user as-is
    pub fn reason(&self) -> &str {
        match self {
            ApiError::Network(msg)
            | ApiError::Status(msg)
            | ApiError::Rejected(msg)
            | ApiError::Malformed(msg) => msg,
        }
    }
}
