//! Pool configuration with TOML file support.

use serde::{Deserialize, Serialize};
use stakeline_types::AccountId;

use crate::RewardsError;

/// Configuration for a staking pool.
///
/// Can be loaded from a TOML file via [`PoolConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// The pool's own custody account on both token links. Stakes are pulled
    /// into it and withdrawals and claims are paid out of it.
    #[serde(default = "default_pool_account")]
    pub pool_account: AccountId,

    /// The only account allowed to fund reward periods.
    #[serde(default = "default_funding_authority")]
    pub funding_authority: AccountId,

    /// Upper bound on a single funding period, if any.
    #[serde(default)]
    pub max_reward_duration_secs: Option<u64>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_pool_account() -> AccountId {
    AccountId::new("staking_pool")
}

fn default_funding_authority() -> AccountId {
    AccountId::new("reward_distributor")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl PoolConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, RewardsError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| RewardsError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, RewardsError> {
        let config: Self = toml::from_str(s).map_err(|e| RewardsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, RewardsError> {
        toml::to_string_pretty(self).map_err(|e| RewardsError::Config(e.to_string()))
    }

    /// Reject configurations no pool can run with.
    pub fn validate(&self) -> Result<(), RewardsError> {
        if !self.pool_account.is_valid() {
            return Err(RewardsError::Config(format!(
                "invalid pool_account {:?}",
                self.pool_account.as_str()
            )));
        }
        if !self.funding_authority.is_valid() {
            return Err(RewardsError::Config(format!(
                "invalid funding_authority {:?}",
                self.funding_authority.as_str()
            )));
        }
        if self.max_reward_duration_secs == Some(0) {
            return Err(RewardsError::Config(
                "max_reward_duration_secs must be non-zero".into(),
            ));
        }
        match self.log_format.as_str() {
            "human" | "json" => Ok(()),
            other => Err(RewardsError::Config(format!("unknown log_format {other:?}"))),
        }
    }

    /// Builder-style override of the funding authority.
    pub fn with_funding_authority(mut self, authority: impl Into<AccountId>) -> Self {
        self.funding_authority = authority.into();
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_account: default_pool_account(),
            funding_authority: default_funding_authority(),
            max_reward_duration_secs: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
