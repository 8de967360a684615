//! Canonical user identity.
//!
//! The same logical user must map to the same memory-service key and chat
//! history owner everywhere. `UserId::new` is the only way to build one.

use serde::{Deserialize, Serialize};

/// A normalized user identifier: trimmed, lowercased, whitespace runs
/// collapsed to a single `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Normalize a raw login name. Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_");
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_spacing() {
        let a = UserId::new("  Ana  Maria ").unwrap();
        let b = UserId::new("ana maria").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "ana_maria");
    }

    #[test]
    fn blank_is_rejected() {
        assert!(UserId::new("").is_none());
        assert!(UserId::new("   \t").is_none());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = UserId::new("Bob").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"bob\"");
    }
}
