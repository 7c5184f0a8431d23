//! Global pool state and per-account reward state.

use serde::{Deserialize, Serialize};
use stakeline_types::Timestamp;

/// Pool-wide accrual state. One per pool.
///
/// `reward_per_token_stored` only moves inside a checkpoint (see
/// `accumulator`); `reward_rate` and `period_finish` only move inside
/// funding (see `distributor`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    /// Sum of every account's `staked_balance`.
    pub total_staked: u128,
    /// Cumulative reward per unit of stake, scaled by `PRECISION`.
    pub reward_per_token_stored: u128,
    /// When the accumulator was last brought up to date. Never past `period_finish`
    /// once a period has been funded.
    pub last_update_time: Timestamp,
    /// Reward units released per second during the active period.
    pub reward_rate: u128,
    /// When the current funding period ends.
    pub period_finish: Timestamp,
    /// Sum of every amount ever passed to a successful `fund`.
    pub total_funded: u128,
    /// Reward released to stakers: `reward_rate × elapsed` summed over every
    /// checkpointed stretch with a non-zero stake. Settled rewards round
    /// down, so everything ever owed fits inside it.
    pub total_released: u128,
    /// Sum of every reward ever paid out by `claim`.
    pub total_claimed: u128,
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Reward state for a single staker.
///
/// Created with zero fields on first stake and kept after the balance
/// returns to zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Current deposit of the stake asset.
    pub staked_balance: u128,
    /// Accumulator value at this account's last settlement.
    pub reward_per_token_paid: u128,
    /// Settled reward not yet claimed.
    pub rewards_owed: u128,
    /// Reward this account has claimed over its lifetime.
    pub total_claimed: u128,
}

impl AccountState {
    pub fn new() -> Self {
        Self::default()
    }
}
