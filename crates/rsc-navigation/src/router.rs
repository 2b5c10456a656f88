//! Router state observed by the render layer.

use rsc_core::{Location, NavigationKey};
use serde::Serialize;

/// Committed and in-flight locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterState {
    /// Location of the last committed navigation.
    pub location: Location,
    /// Location most recently requested. Equals `location` when idle.
    pub next_location: Location,
    /// Whether a navigation that has not been superseded is still in flight.
    pub is_pending: bool,
}

impl RouterState {
    /// Idle state at `location`.
    pub fn idle(location: Location) -> Self {
        Self {
            next_location: location.clone(),
            location,
            is_pending: false,
        }
    }

    pub(crate) fn begin(&mut self, target: Location) {
        self.next_location = target;
        self.is_pending = true;
    }

    pub(crate) fn commit(&mut self, location: Location) {
        self.location = location.clone();
        self.next_location = location;
        self.is_pending = false;
    }

    pub(crate) fn abandon(&mut self) {
        self.next_location = self.location.clone();
        self.is_pending = false;
    }
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSnapshot {
    pub router: RouterState,
    /// Key whose content should be rendered.
    pub active_key: NavigationKey,
    /// Incremented every time the render layer is notified.
    pub epoch: u64,
}

/// Notification that the render layer should render `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderEvent {
    pub key: NavigationKey,
    pub epoch: u64,
    /// Set when the key may be unchanged but its content was replaced.
    pub forced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(s: &str) -> Location {
        Location::parse(s).unwrap()
    }

    #[test]
    fn test_begin_and_commit() {
        let mut router = RouterState::idle(loc("/"));
        router.begin(loc("/ships"));

        assert!(router.is_pending);
        assert_eq!(router.location, loc("/"));
        assert_eq!(router.next_location, loc("/ships"));

        router.commit(loc("/ships"));
        assert_eq!(router, RouterState::idle(loc("/ships")));
    }

    #[test]
    fn test_abandon_restores_committed_location() {
        let mut router = RouterState::idle(loc("/"));
        router.begin(loc("/broken"));
        router.abandon();

        assert_eq!(router, RouterState::idle(loc("/")));
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = RouterSnapshot {
            router: RouterState::idle(loc("/")),
            active_key: NavigationKey::from("k0"),
            epoch: 3,
        };
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["activeKey"], "k0");
        assert_eq!(json["router"]["nextLocation"], "/");
        assert_eq!(json["router"]["isPending"], false);
    }
}
