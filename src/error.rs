//! Error types for Intake Assist.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Q&A error: {0}")]
    Qa(#[from] QaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while building a flow definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowDefinitionError {
    #[error("Flow definition has no fields")]
    Empty,

    #[error("Duplicate field key: {0}")]
    DuplicateKey(String),

    #[error("Field {key} has no value; record is incomplete")]
    MissingValue { key: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Failures of the question-answering collaborator.
///
/// These surface to the user as a failure message; the session is left as it
/// was before the question was asked.
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("No API key configured for the answering model (set GROQ_API_KEY)")]
    MissingCredential,

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
