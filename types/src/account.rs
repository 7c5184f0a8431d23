//! Account identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a participant in a staking pool: a staker, the funding
/// authority, or the pool's own custody account.
///
/// The identifier is opaque to the reward engine. Token links decide what a
/// well-formed identifier looks like for their asset.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account identifier from a raw string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An identifier is valid when it is non-empty and has no surrounding whitespace.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.trim() == self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_padded_ids_are_invalid() {
        assert!(AccountId::new("alice").is_valid());
        assert!(!AccountId::new("").is_valid());
        assert!(!AccountId::new(" alice").is_valid());
    }

    #[test]
    fn display_is_raw_string() {
        assert_eq!(AccountId::from("pool").to_string(), "pool");
    }
}
