//! Error types for the engine

use thiserror::Error;

/// Result type alias using our EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// The feed for a subscription went away while a caller was
    /// blocked on it
    #[error("Feed disconnected for {0}")]
    FeedDisconnected(String),

    /// A blocking query ended without a matching update
    #[error("No matching update received: {0}")]
    NoMatchingUpdate(String),

    /// Instrument metadata could not be resolved
    #[error("Instrument metadata missing for {0}")]
    MetadataMissing(String),

    /// No processor factory is registered for a job kind
    #[error("Unsupported job kind: {0}")]
    UnsupportedJob(String),

    /// A processor could not be constructed or started
    #[error("Job processing error: {0}")]
    Job(String),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}
