//! Fetch error types.

use thiserror::Error;

/// Errors that can occur while fetching or draining content.
///
/// `Clone` so every reader of a shared content handle can observe the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be built.
    #[error("Request error: {0}")]
    Request(String),

    /// The transport failed before a response arrived.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server answered with an error status.
    #[error("HTTP error: {status} for {location}")]
    Http { status: u16, location: String },

    /// The body stream failed part-way through.
    #[error("Stream error: {0}")]
    Stream(String),

    /// The drained body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

impl From<http::Error> for FetchError {
    fn from(e: http::Error) -> Self {
        FetchError::Request(e.to_string())
    }
}
