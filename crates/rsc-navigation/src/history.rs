//! Address-bar history seam.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rsc_core::{Location, NavigationKey};
use serde::Serialize;

/// One entry in the history stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Key stored in the entry's state. `None` for entries this runtime never wrote.
    pub key: Option<NavigationKey>,
    /// Location shown in the address bar.
    pub location: Location,
}

impl HistoryEntry {
    /// Create an entry carrying a key.
    pub fn new(key: NavigationKey, location: Location) -> Self {
        Self {
            key: Some(key),
            location,
        }
    }

    /// Create an entry without a key.
    pub fn unkeyed(location: Location) -> Self {
        Self {
            key: None,
            location,
        }
    }
}

/// Browser-style session history.
///
/// The controller only pushes, replaces and reads the current entry. Moving
/// back and forward belongs to whoever owns the history; they report it to
/// the controller through `NavigationController::handle_pop_event`.
pub trait HistoryStore: Send + Sync + 'static {
    /// Add an entry after the current one, dropping any forward entries.
    fn push(&self, key: NavigationKey, location: Location);

    /// Overwrite the current entry.
    fn replace(&self, key: NavigationKey, location: Location);

    /// Get the current entry.
    fn current(&self) -> HistoryEntry;
}

/// Counts of history writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistoryMutations {
    pub pushes: usize,
    pub replaces: usize,
}

#[derive(Debug)]
struct Stack {
    entries: Vec<HistoryEntry>,
    index: usize,
    mutations: HistoryMutations,
}

/// In-process history stack with back/forward movement.
#[derive(Debug)]
pub struct MemoryHistory {
    stack: Mutex<Stack>,
}

impl MemoryHistory {
    /// Start with a single unkeyed entry, like a fresh page load.
    pub fn new(initial: Location) -> Self {
        Self::with_entry(HistoryEntry::unkeyed(initial))
    }

    /// Start with a single given entry.
    pub fn with_entry(entry: HistoryEntry) -> Self {
        Self {
            stack: Mutex::new(Stack {
                entries: vec![entry],
                index: 0,
                mutations: HistoryMutations::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Stack> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move one entry back. Returns the new current entry, or `None` at the start.
    pub fn back(&self) -> Option<HistoryEntry> {
        self.go(-1)
    }

    /// Move one entry forward. Returns the new current entry, or `None` at the end.
    pub fn forward(&self) -> Option<HistoryEntry> {
        self.go(1)
    }

    /// Move `delta` entries. Returns `None` without moving if out of range.
    pub fn go(&self, delta: isize) -> Option<HistoryEntry> {
        let mut stack = self.lock();
        let target = stack.index.checked_add_signed(delta)?;
        if target >= stack.entries.len() {
            return None;
        }
        stack.index = target;
        Some(stack.entries[target].clone())
    }

    /// Whether there is an entry behind the current one.
    pub fn can_go_back(&self) -> bool {
        self.lock().index > 0
    }

    /// Whether there is an entry ahead of the current one.
    pub fn can_go_forward(&self) -> bool {
        let stack = self.lock();
        stack.index + 1 < stack.entries.len()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().entries.clone()
    }

    /// Index of the current entry.
    pub fn index(&self) -> usize {
        self.lock().index
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Always false; history has at least one entry.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Writes made through `push` and `replace`.
    pub fn mutations(&self) -> HistoryMutations {
        self.lock().mutations
    }
}

impl HistoryStore for MemoryHistory {
    fn push(&self, key: NavigationKey, location: Location) {
        let mut stack = self.lock();
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(HistoryEntry::new(key, location));
        stack.index = stack.entries.len() - 1;
        stack.mutations.pushes += 1;
    }

    fn replace(&self, key: NavigationKey, location: Location) {
        let mut stack = self.lock();
        let index = stack.index;
        stack.entries[index] = HistoryEntry::new(key, location);
        stack.mutations.replaces += 1;
    }

    fn current(&self) -> HistoryEntry {
        let stack = self.lock();
        stack.entries[stack.index].clone()
    }
}
