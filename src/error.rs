//! Error types for the promotion dispatcher

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Catalog could not be read. Fatal to a dispatch cycle.
    #[error("Catalog unavailable: {0}")]
    SourceUnavailable(String),

    /// Status write rejected: row gone or already marked by someone else.
    #[error("Catalog update conflict: {0}")]
    UpdateConflict(String),

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Link shortening failed: {0}")]
    ShortenFailed(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}
