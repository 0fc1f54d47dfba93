// ================================================================
// File: herald-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing {0} capability on the platform client")]
    MissingCapability(&'static str),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("REST error: {0}")]
    Rest(String),

    #[error("Component error: {0}")]
    Component(String),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Check error: {0}")]
    Check(String),

    #[error("Check not found: {0}")]
    CheckNotFound(String),

    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),

    #[error("Prefix not found: {0}")]
    PrefixNotFound(String),

    #[error("Command error: {0}")]
    Command(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Command(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Command(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        // Command callbacks may bubble anyhow errors; fold them into the
        // command variant so the hook stack sees one error type.
        Error::Command(e.to_string())
    }
}
