use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the relay
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("No calendar source configured")]
    #[diagnostic(code(muistutin::source_unavailable))]
    SourceUnavailable,

    #[error("Calendar fetch error: {0}")]
    #[diagnostic(code(muistutin::fetch))]
    FetchFailure(String),

    #[error("Delivery error: {0}")]
    #[diagnostic(code(muistutin::delivery))]
    DeliveryFailure(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(muistutin::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(muistutin::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(muistutin::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(muistutin::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(muistutin::other))]
    Other(String),
}

// Implement From for TOML serialization errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type RelayResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create fetch errors
pub fn fetch_error(message: &str) -> Error {
    Error::FetchFailure(message.to_string())
}

/// Helper to create delivery errors
pub fn delivery_error(message: &str) -> Error {
    Error::DeliveryFailure(message.to_string())
}

/// Helper to create other errors
#[allow(dead_code)]
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
