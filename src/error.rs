//! Error handling for the Predica library.
//!
//! Defines the shared error type `PredicaError` and a `Result` alias used
//! throughout the crate. Every variant renders as a single actionable
//! sentence; nothing is retried automatically anywhere in the core.

use thiserror::Error;

/// Result type for Predica operations
pub type Result<T> = std::result::Result<T, PredicaError>;

/// Main error type for the homily drafting workflow
#[derive(Debug, Error)]
pub enum PredicaError {
    /// A prompt template placeholder had no corresponding variable.
    /// Programmer error: caught before anything is sent to the model.
    #[error("Prompt template '{template}' is under-filled: {detail}")]
    MissingVariable { template: String, detail: String },

    /// The model reply did not match the requested structured shape
    #[error("Model reply did not match the requested shape: {0}")]
    SchemaViolation(String),

    /// Network, auth or rate-limit failure talking to an upstream service
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// An action was invoked before its required prior state exists
    #[error("Action not available yet: {0}")]
    PreconditionViolation(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template error other than a missing variable
    #[error("Template error: {0}")]
    Template(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PredicaError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new schema violation error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        Self::SchemaViolation(msg.into())
    }

    /// Create a new upstream error
    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(msg: S) -> Self {
        Self::Template(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_config_creation() {
        let error = PredicaError::config("missing API key");
        assert!(matches!(error, PredicaError::Config(_)));
        assert_eq!(error.to_string(), "Configuration error: missing API key");
    }

    #[test]
    fn test_error_schema_creation() {
        let error = PredicaError::schema("expected a list of strings");
        assert!(matches!(error, PredicaError::SchemaViolation(_)));
        assert_eq!(
            error.to_string(),
            "Model reply did not match the requested shape: expected a list of strings"
        );
    }

    #[test]
    fn test_error_missing_variable_display() {
        let error = PredicaError::MissingVariable {
            template: "predication".to_string(),
            detail: "Variable `profile` not found in context".to_string(),
        };
        assert!(error.to_string().contains("predication"));
        assert!(error.to_string().contains("profile"));
    }

    #[test]
    fn test_error_precondition_display() {
        let error = PredicaError::PreconditionViolation("select a key message first");
        assert_eq!(
            error.to_string(),
            "Action not available yet: select a key message first"
        );
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: PredicaError = io_error.into();
        assert!(matches!(error, PredicaError::Io(_)));
        assert!(error.to_string().contains("file not found"));
    }
}
