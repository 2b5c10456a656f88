//! Simulation scripts.
//!
//! A script declares canned server responses and a list of steps to drive
//! a navigation session with:
//!
//! ```toml
//! start = "/"
//!
//! [[routes]]
//! location = "/"
//! body = "<home/>"
//!
//! [[routes]]
//! location = "/ships"
//! body = "<ships/>"
//! delay_ms = 40
//!
//! [[actions]]
//! id = "like"
//! root = "<ship liked/>"
//! return_value = { likes = 3 }
//!
//! [[steps]]
//! op = "navigate"
//! to = "/ships"
//!
//! [[steps]]
//! op = "back"
//! wait = true
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use http::StatusCode;
use rsc_core::Location;
use rsc_fetch::{ScriptedFetcher, ScriptedRoute};
use serde::{Deserialize, Serialize};

/// A scripted session.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Location of the first history entry.
    #[serde(default = "default_start")]
    pub start: String,
    /// Canned content responses.
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    /// Canned server action responses.
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    /// Steps, run in order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_start() -> String {
    "/".to_string()
}

fn default_status() -> u16 {
    200
}

fn default_chunks() -> usize {
    1
}

/// Response for one location.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteSpec {
    pub location: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default = "default_chunks")]
    pub chunks: usize,
}

/// Response for one server action.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionSpec {
    pub id: String,
    #[serde(default)]
    pub root: serde_json::Value,
    #[serde(default)]
    pub return_value: serde_json::Value,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub delay_ms: u64,
}

/// One step of a session.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    /// Push a new entry.
    Navigate {
        to: String,
        #[serde(default)]
        wait: bool,
    },
    /// Replace the current entry.
    Replace {
        to: String,
        #[serde(default)]
        wait: bool,
    },
    /// Move back one entry and report the pop.
    Back {
        #[serde(default)]
        wait: bool,
    },
    /// Move forward one entry and report the pop.
    Forward {
        #[serde(default)]
        wait: bool,
    },
    /// Call a server action and wait for its return value.
    Action {
        id: String,
        #[serde(default)]
        args: serde_json::Value,
    },
    /// Sleep.
    Wait { ms: u64 },
    /// Wait for every outstanding navigation.
    Settle,
}

impl Step {
    /// Short description for progress output.
    pub fn describe(&self) -> String {
        match self {
            Self::Navigate { to, .. } => format!("navigate {}", to),
            Self::Replace { to, .. } => format!("replace {}", to),
            Self::Back { .. } => "back".to_string(),
            Self::Forward { .. } => "forward".to_string(),
            Self::Action { id, .. } => format!("action {}", id),
            Self::Wait { ms } => format!("wait {}ms", ms),
            Self::Settle => "settle".to_string(),
        }
    }
}

impl Script {
    /// Load a script from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse script {}", path.display()))
    }

    /// Parse and check a script.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let script: Self = toml::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<()> {
        Location::parse(&self.start).context("Invalid start location")?;
        for route in &self.routes {
            Location::parse(&route.location)
                .with_context(|| format!("Invalid route location {:?}", route.location))?;
            parse_status(route.status)?;
        }
        for action in &self.actions {
            parse_status(action.status)?;
        }
        Ok(())
    }

    /// Build a fetcher serving this script's responses.
    pub fn fetcher(&self) -> Result<ScriptedFetcher> {
        let mut fetcher = ScriptedFetcher::new();

        for route in &self.routes {
            let response = ScriptedRoute::new(route.body.as_bytes())
                .with_status(parse_status(route.status)?)
                .with_delay(Duration::from_millis(route.delay_ms))
                .with_chunks(route.chunks);
            fetcher = fetcher.route_with(&route.location, response);
        }

        for action in &self.actions {
            let envelope = serde_json::json!({
                "root": action.root,
                "returnValue": action.return_value,
            });
            let response = ScriptedRoute::new(serde_json::to_vec(&envelope)?)
                .with_status(parse_status(action.status)?)
                .with_delay(Duration::from_millis(action.delay_ms));
            fetcher = fetcher.action_with(&action.id, response);
        }

        Ok(fetcher)
    }
}

fn parse_status(status: u16) -> Result<StatusCode> {
    StatusCode::from_u16(status).with_context(|| format!("Invalid status code {}", status))
}
