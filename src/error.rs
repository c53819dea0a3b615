//! Error types for the qbt-inspect library.

use thiserror::Error;

/// Errors that can occur while talking to the torrent data source.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Web API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the server.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// The Web API rejected the login.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during configuration handling.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file was missing a value or malformed.
    #[error("config error: {0}")]
    Config(String),
}

/// A specialized `Result` type for qbt-inspect operations.
pub type Result<T> = std::result::Result<T, Error>;
