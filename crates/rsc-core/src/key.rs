//! Navigation keys and supersession tokens.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Opaque identifier for one point in navigation history.
///
/// A key is stored in the history entry's state and used to look up the
/// content handle for that entry in the content cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationKey(String);

impl NavigationKey {
    /// Create a key from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random key.
    pub fn generate() -> Self {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
        use rand::Rng;

        let bytes: [u8; 18] = rand::thread_rng().gen();
        Self(format!("nav_{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Get the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NavigationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NavigationKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NavigationKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Tags a single navigation attempt.
///
/// Tokens are process-unique and strictly increasing. A controller keeps the
/// token of the most recently started navigation; a completion whose token
/// no longer matches it has been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavigationToken(u64);

impl NavigationToken {
    /// Mint a fresh token.
    pub fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw token value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NavigationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nav#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_new() {
        let key = NavigationKey::new("abc123");
        assert_eq!(key.as_str(), "abc123");
        assert_eq!(format!("{}", key), "abc123");
    }

    #[test]
    fn test_key_generate_format() {
        let key = NavigationKey::generate();
        let s = key.as_str();

        assert!(s.starts_with("nav_"));
        // Base64 encoded 18 bytes = 24 chars, plus "nav_" = 28 chars
        assert_eq!(s.len(), 28);
    }

    #[test]
    fn test_key_generate_uniqueness() {
        let keys: HashSet<_> = (0..256).map(|_| NavigationKey::generate()).collect();
        assert_eq!(keys.len(), 256);
    }

    #[test]
    fn test_key_serializes_transparently() {
        let key = NavigationKey::from("k1");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#""k1""#);

        let back: NavigationKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_tokens_strictly_increase() {
        let a = NavigationToken::next();
        let b = NavigationToken::next();
        let c = NavigationToken::next();

        assert!(a < b && b < c);
        assert_ne!(a, c);
    }

    #[test]
    fn test_tokens_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| (0..100).map(|_| NavigationToken::next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert!(seen.insert(token));
            }
        }
        assert_eq!(seen.len(), 400);
    }
}
