//! Navigation lifecycle tracking.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What started a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationKind {
    /// Initial content load when the session starts.
    Initial,
    /// Navigation that pushes a new history entry.
    Push,
    /// Navigation that replaces the current history entry.
    Replace,
    /// Back/forward movement through existing history.
    Pop,
    /// Server action invocation against the current entry.
    Action,
}

impl NavigationKind {
    /// Whether completing this kind of navigation writes to history.
    pub fn mutates_history(&self) -> bool {
        matches!(self, Self::Push | Self::Replace)
    }
}

impl fmt::Display for NavigationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Push => write!(f, "push"),
            Self::Replace => write!(f, "replace"),
            Self::Pop => write!(f, "pop"),
            Self::Action => write!(f, "action"),
        }
    }
}

/// Lifecycle phases for a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationPhase {
    /// Fetch issued, handle stored in the cache.
    Started,
    /// Content drained and the navigation became visible.
    Committed,
    /// A later navigation started first; the result was discarded.
    Superseded,
    /// The content fetch failed.
    Failed(String),
}

/// Observer trait for navigation lifecycle events.
pub trait NavigationObserver: Send + Sync {
    /// Called when a navigation enters a phase.
    ///
    /// `elapsed` is measured from when the navigation started.
    fn on_phase(&self, kind: NavigationKind, phase: &NavigationPhase, elapsed: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_push_and_replace_mutate_history() {
        assert!(NavigationKind::Push.mutates_history());
        assert!(NavigationKind::Replace.mutates_history());
        assert!(!NavigationKind::Pop.mutates_history());
        assert!(!NavigationKind::Action.mutates_history());
        assert!(!NavigationKind::Initial.mutates_history());
    }

    #[test]
    fn test_kind_display_matches_serde() {
        for kind in [
            NavigationKind::Initial,
            NavigationKind::Push,
            NavigationKind::Replace,
            NavigationKind::Pop,
            NavigationKind::Action,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }
}
