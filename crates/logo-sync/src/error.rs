//! Error types for the sync library.

use thiserror::Error;

/// Main error type for sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// PUNTO or staging database error
    #[error("Database error: {0}")]
    Source(#[from] tiberius::error::Error),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Staging queue or log error
    #[error("Staging store error: {0}")]
    State(String),

    /// Transport failure talking to J-Platform
    #[error("Connection error: {0}")]
    Http(reqwest::Error),

    /// J-Platform did not answer within the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Login rejected by J-Platform
    #[error("Login failed: {0}")]
    Auth(String),

    /// Business error reported by J-Platform
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: Option<String>,
    },

    /// Queued payload could not be decoded
    #[error("Payload parse error: {0}")]
    Payload(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Shutdown was requested (SIGINT, SIGTERM)
    #[error("Sync cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else {
            SyncError::Http(err)
        }
    }
}

impl SyncError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl Into<String>, context: impl Into<String>) -> Self {
        SyncError::Pool {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create an Api error from a parsed vendor response
    pub fn api(status: u16, message: impl Into<String>, body: Option<String>) -> Self {
        SyncError::Api {
            status,
            message: message.into(),
            body,
        }
    }

    /// True when the error means the cached auth token was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Api { status: 401, .. })
    }

    /// Raw J-Platform response body, if the error carries one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            SyncError::Api { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Config(_) | SyncError::Yaml(_) => 1,
            SyncError::Source(_) | SyncError::Pool { .. } => 2,
            SyncError::Http(_) | SyncError::Timeout | SyncError::Auth(_) | SyncError::Api { .. } => 3,
            SyncError::State(_) => 4,
            SyncError::Payload(_) | SyncError::Json(_) => 5,
            SyncError::Cancelled => 6,
            SyncError::Io(_) => 7,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
