//! History-keyed content cache.

use std::collections::{HashMap, VecDeque};

use rsc_core::NavigationKey;
use rsc_fetch::ContentHandle;

/// Maps navigation keys to content handles.
///
/// Each entry corresponds to one history entry, so by default nothing is
/// ever removed during a session. With a capacity limit, the oldest entries
/// are evicted first; the caller names keys that must survive (the active
/// key, the current history key).
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: HashMap<NavigationKey, ContentHandle>,
    order: VecDeque<NavigationKey>,
    capacity: Option<usize>,
}

impl ContentCache {
    /// Create an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding at most `capacity` unprotected entries.
    pub fn bounded(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Store a handle, replacing any existing entry for `key`.
    ///
    /// Replacing keeps the entry's original age for eviction.
    pub fn insert(&mut self, key: NavigationKey, handle: ContentHandle) -> Option<ContentHandle> {
        let previous = self.entries.insert(key.clone(), handle);
        if previous.is_none() {
            self.order.push_back(key);
        }
        previous
    }

    /// Store a handle only if `key` has no entry yet. Returns whether it was stored.
    pub fn insert_if_absent(&mut self, key: NavigationKey, handle: ContentHandle) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.insert(key, handle);
        true
    }

    /// Get the handle for a key.
    pub fn get(&self, key: &NavigationKey) -> Option<&ContentHandle> {
        self.entries.get(key)
    }

    /// Check whether a key has an entry.
    pub fn contains(&self, key: &NavigationKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &NavigationKey> {
        self.order.iter()
    }

    /// Configured capacity, if any.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Evict the oldest entries beyond capacity, never touching `protected`.
    ///
    /// Returns the evicted keys, oldest first.
    pub fn evict(&mut self, protected: &[&NavigationKey]) -> Vec<NavigationKey> {
        let Some(capacity) = self.capacity else {
            return Vec::new();
        };

        let mut evicted = Vec::new();
        while self.entries.len() > capacity {
            let Some(index) = self.order.iter().position(|k| !protected.contains(&k)) else {
                break;
            };
            if let Some(key) = self.order.remove(index) {
                self.entries.remove(&key);
                evicted.push(key);
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsc_core::Location;
    use rsc_fetch::Content;

    fn handle(path: &str) -> ContentHandle {
        ContentHandle::resolved(Content {
            location: Location::parse(path).unwrap(),
            root: path.as_bytes().to_vec(),
            return_value: None,
        })
    }

    fn key(s: &str) -> NavigationKey {
        NavigationKey::from(s)
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = ContentCache::new();
        let h = handle("/a");

        assert!(cache.insert(key("k1"), h.clone()).is_none());
        assert!(cache.contains(&key("k1")));
        assert!(cache.get(&key("k1")).unwrap().same_fetch(&h));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut cache = ContentCache::new();
        let first = handle("/a");
        let second = handle("/a");

        cache.insert(key("k1"), first.clone());
        let previous = cache.insert(key("k1"), second.clone()).unwrap();

        assert!(previous.same_fetch(&first));
        assert!(cache.get(&key("k1")).unwrap().same_fetch(&second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.keys().count(), 1);
    }

    #[test]
    fn test_insert_if_absent_is_first_write_wins() {
        let mut cache = ContentCache::new();
        let first = handle("/a");

        assert!(cache.insert_if_absent(key("k1"), first.clone()));
        assert!(!cache.insert_if_absent(key("k1"), handle("/a")));
        assert!(cache.get(&key("k1")).unwrap().same_fetch(&first));
    }

    #[test]
    fn test_keys_in_insertion_order() {
        let mut cache = ContentCache::new();
        cache.insert(key("c"), handle("/c"));
        cache.insert(key("a"), handle("/a"));
        cache.insert(key("b"), handle("/b"));

        let keys: Vec<_> = cache.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_unbounded_never_evicts() {
        let mut cache = ContentCache::new();
        for i in 0..100 {
            cache.insert(key(&format!("k{}", i)), handle("/"));
        }
        assert!(cache.evict(&[]).is_empty());
        assert_eq!(cache.len(), 100);
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let mut cache = ContentCache::bounded(Some(2));
        cache.insert(key("k1"), handle("/1"));
        cache.insert(key("k2"), handle("/2"));
        cache.insert(key("k3"), handle("/3"));

        let evicted = cache.evict(&[]);
        assert_eq!(evicted, vec![key("k1")]);
        assert!(!cache.contains(&key("k1")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_bounded_skips_protected() {
        let mut cache = ContentCache::bounded(Some(1));
        cache.insert(key("active"), handle("/1"));
        cache.insert(key("old"), handle("/2"));
        cache.insert(key("new"), handle("/3"));

        let active = key("active");
        let new = key("new");
        let evicted = cache.evict(&[&active, &new]);

        assert_eq!(evicted, vec![key("old")]);
        assert!(cache.contains(&active));
        assert!(cache.contains(&new));
        // Everything left is protected; capacity is exceeded but nothing more can go.
        assert_eq!(cache.len(), 2);
    }
}
