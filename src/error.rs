//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Prompt rejected before any network call. The message is user-facing.
    #[error("{0}")]
    Validation(String),

    /// Any failure of the remote call, surfaced as `"<label>: <message>"`.
    #[error("{label}: {message}")]
    Upstream { label: String, message: String },

    #[error("Inference API error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream { .. })
    }

    /// The message without this enum's own prefix.
    pub fn detail(&self) -> String {
        match self {
            Error::Validation(message)
            | Error::Inference(message)
            | Error::Config(message)
            | Error::Upstream { message, .. } => message.clone(),
            Error::Io(e) => e.to_string(),
            Error::Http(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
