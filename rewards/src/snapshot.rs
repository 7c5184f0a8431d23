//! Pool snapshots: global and per-account state captured at a point in time.
//!
//! A snapshot is enough to rebuild a pool exactly: restoring one and then
//! running the same operations yields the same rewards as never having
//! stopped. Snapshots are validated on the way in so a corrupted or
//! hand-edited file cannot break the `total_staked` invariant.

use crate::error::RewardsError;
use crate::ledger::StakeLedger;
use crate::state::{AccountState, GlobalState};
use serde::{Deserialize, Serialize};
use stakeline_types::{AccountId, Timestamp};
use std::collections::HashMap;
use std::path::Path;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A full copy of pool state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Snapshot version for compatibility.
    pub version: u32,
    /// Clock reading when the snapshot was taken.
    pub taken_at: Timestamp,
    pub global: GlobalState,
    /// Every account ever created, sorted by account id.
    pub accounts: Vec<AccountSnapshot>,
}

/// The state of a single account captured in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account: AccountId,
    pub state: AccountState,
}

impl PoolSnapshot {
    pub fn capture(global: &GlobalState, ledger: &StakeLedger, taken_at: Timestamp) -> Self {
        let mut accounts: Vec<AccountSnapshot> = ledger
            .iter()
            .map(|(account, state)| AccountSnapshot {
                account: account.clone(),
                state: state.clone(),
            })
            .collect();
        accounts.sort_by(|a, b| a.account.cmp(&b.account));
        Self {
            version: SNAPSHOT_VERSION,
            taken_at,
            global: global.clone(),
            accounts,
        }
    }

    /// Check the invariants every reachable pool state satisfies.
    pub fn validate(&self) -> Result<(), RewardsError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(RewardsError::Snapshot(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                self.version
            )));
        }

        let mut sum: u128 = 0;
        let mut seen = std::collections::HashSet::with_capacity(self.accounts.len());
        for entry in &self.accounts {
            if !seen.insert(&entry.account) {
                return Err(RewardsError::InvariantViolation(format!(
                    "duplicate account {}",
                    entry.account
                )));
            }
            if entry.state.reward_per_token_paid > self.global.reward_per_token_stored {
                return Err(RewardsError::InvariantViolation(format!(
                    "account {} checkpointed ahead of the accumulator",
                    entry.account
                )));
            }
            sum = sum
                .checked_add(entry.state.staked_balance)
                .ok_or(RewardsError::Overflow)?;
        }

        let g = &self.global;
        if sum != g.total_staked {
            return Err(RewardsError::InvariantViolation(format!(
                "sum of balances {sum} != total_staked {}",
                g.total_staked
            )));
        }
        if g.total_claimed > g.total_released {
            return Err(RewardsError::InvariantViolation(format!(
                "claimed {} exceeds released {}",
                g.total_claimed, g.total_released
            )));
        }
        if g.total_released > g.total_funded {
            return Err(RewardsError::InvariantViolation(format!(
                "released {} exceeds funded {}",
                g.total_released, g.total_funded
            )));
        }
        if g.last_update_time > g.period_finish && g.total_funded > 0 {
            return Err(RewardsError::InvariantViolation(format!(
                "last update {} is past period finish {}",
                g.last_update_time, g.period_finish
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, RewardsError> {
        bincode::serialize(self).map_err(|e| RewardsError::Snapshot(e.to_string()))
    }

    /// Decode and validate a snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RewardsError> {
        let snapshot: Self =
            bincode::deserialize(bytes).map_err(|e| RewardsError::Snapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), RewardsError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| RewardsError::Snapshot(e.to_string()))
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RewardsError> {
        let bytes =
            std::fs::read(path.as_ref()).map_err(|e| RewardsError::Snapshot(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn into_parts(self) -> (GlobalState, StakeLedger) {
        let accounts: HashMap<AccountId, AccountState> = self
            .accounts
            .into_iter()
            .map(|entry| (entry.account, entry.state))
            .collect();
        (self.global, StakeLedger::from_accounts(accounts))
    }
}
