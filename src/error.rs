use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the calendar engine
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Malformed date in {record}: '{value}'")]
    #[diagnostic(code(lukkari::malformed_date))]
    MalformedDate { record: String, value: String },

    #[error("Cannot mutate '{id}': {reason}")]
    #[diagnostic(
        code(lukkari::invalid_mutation_target),
        help("Edit the source assignment, note or base event instead")
    )]
    InvalidMutationTarget { id: String, reason: String },

    #[error("Persistence service unavailable: {0}")]
    #[diagnostic(code(lukkari::persistence), help("Check the data source and retry"))]
    PersistenceUnavailable(String),

    #[error("Invalid event: {0}")]
    #[diagnostic(code(lukkari::invalid_event))]
    InvalidEvent(String),

    #[error("Invalid month {year}-{month}")]
    #[diagnostic(code(lukkari::invalid_month))]
    InvalidMonth { year: i32, month: u32 },

    #[error("Environment error: {0}")]
    #[diagnostic(code(lukkari::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(lukkari::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(lukkari::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(lukkari::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(lukkari::other))]
    Other(String),
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type CalendarResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing or invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create persistence errors
pub fn persistence_error(message: &str) -> Error {
    Error::PersistenceUnavailable(message.to_string())
}

/// Helper to create malformed date errors
pub fn malformed_date(record: &str, value: &str) -> Error {
    Error::MalformedDate {
        record: record.to_string(),
        value: value.to_string(),
    }
}

/// Helper to reject a mutation of a synthetic id
pub fn invalid_target(id: &str, reason: &str) -> Error {
    Error::InvalidMutationTarget {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
