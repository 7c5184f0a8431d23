//! Asset identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a fungible asset (e.g. the stake token or the reward token).
///
/// Two token links reporting the same `AssetId` move the same balances; the
/// pool uses this to keep staked principal out of the reward solvency check.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
