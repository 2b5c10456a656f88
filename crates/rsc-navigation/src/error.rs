//! Navigation error types.

use rsc_core::{ConfigError, LocationError, NavigationKey};
use rsc_fetch::FetchError;
use thiserror::Error;

/// Errors surfaced by the navigation controller.
///
/// A superseded navigation is not an error; it resolves to
/// `NavigationOutcome::Superseded` and is otherwise ignored.
#[derive(Error, Debug)]
pub enum NavigationError {
    /// The navigation target is not a valid location.
    #[error("Invalid location: {0}")]
    InvalidLocation(#[from] LocationError),

    /// Fetching or reading content failed.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// No cache entry exists for a key that should have one.
    #[error("No cached content for key {0}")]
    MissingContent(NavigationKey),

    /// The navigator configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The background task driving a navigation did not finish.
    #[error("Navigation task failed: {0}")]
    Task(String),
}
