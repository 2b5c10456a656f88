//! Navigation locations.

use std::fmt;
use std::str::FromStr;

use http::uri::PathAndQuery;
use serde::{Deserialize, Serialize};

/// Error returned when a string is not a usable location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("location must start with '/': {0:?}")]
    NotAbsolute(String),

    #[error("invalid location {location:?}: {reason}")]
    Invalid { location: String, reason: String },
}

/// A location inside the application: a path plus an optional query string.
///
/// This is what the address bar shows minus the origin, e.g. `/ships/3?search=x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location(String);

impl Location {
    /// Parse and validate a location string.
    pub fn parse(s: &str) -> Result<Self, LocationError> {
        if !s.starts_with('/') {
            return Err(LocationError::NotAbsolute(s.to_string()));
        }

        let parsed = PathAndQuery::from_str(s).map_err(|e| LocationError::Invalid {
            location: s.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self(parsed.as_str().to_string()))
    }

    /// The application root, `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Get the full location string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the path component.
    pub fn path(&self) -> &str {
        match self.0.split_once('?') {
            Some((path, _)) => path,
            None => &self.0,
        }
    }

    /// Get the raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.0.split_once('?').map(|(_, query)| query)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Location {
    type Error = LocationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.0
    }
}
