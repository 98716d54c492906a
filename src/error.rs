use thiserror::Error;

/// Main error type for the claimer
#[derive(Error, Debug)]
pub enum ClaimerError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Timed out after {elapsed_secs}s: {operation}")]
    Timeout { operation: String, elapsed_secs: u64 },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // Crypto/signing errors
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Address parsing error: {0}")]
    AddressParsing(String),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Result type alias for ClaimerError
pub type Result<T> = std::result::Result<T, ClaimerError>;

impl ClaimerError {
    /// True when the failure happened before a response was obtained
    /// (connect, timeout, RPC transport).
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode(),
            Self::Rpc(_) | Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
