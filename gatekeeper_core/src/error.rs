//! Error types for Gatekeeper.

use thiserror::Error;

/// Root error type for Gatekeeper.
///
/// A denied authorization is not an error; it is reported through
/// [`AuthorizationDecision`](crate::service::AuthorizationDecision).
#[derive(Debug, Error)]
pub enum GatekeeperError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    #[error("Policy already exists: {0}")]
    PolicyAlreadyExists(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type used throughout Gatekeeper.
pub type Result<T> = std::result::Result<T, GatekeeperError>;
