//! The reward-per-token accumulator and per-account checkpoints.
//!
//! `reward_per_token` is the cumulative reward released per unit of stake
//! since the pool was created, scaled by [`PRECISION`]. An account's share of
//! everything released between two instants is
//! `staked × (rpt_later − rpt_earlier) / PRECISION`, provided its stake did
//! not change in between. Checkpointing an account before every change to its
//! stake keeps that proviso true.

use crate::error::RewardsError;
use crate::math::{mul3_div, mul_div};
use crate::state::{AccountState, GlobalState};
use stakeline_types::Timestamp;

/// Fixed-point scale of the accumulator.
///
/// Each `reward_per_token` evaluation rounds down by less than one unit of
/// `1 / PRECISION` reward per staked unit, so the rounding loss per
/// operation stays below `total_staked / 10^18` reward units.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

impl GlobalState {
    /// The latest instant reward has been released up to: `min(now, period_finish)`.
    pub fn last_time_reward_applicable(&self, now: Timestamp) -> Timestamp {
        now.min(self.period_finish)
    }

    /// Accumulator value at `now`, without mutating state.
    ///
    /// While nothing is staked the accumulator does not move. Reward released
    /// during such a stretch is never allocated to anyone.
    pub fn reward_per_token(&self, now: Timestamp) -> Result<u128, RewardsError> {
        if self.total_staked == 0 {
            return Ok(self.reward_per_token_stored);
        }
        let elapsed = self
            .last_update_time
            .elapsed_since(self.last_time_reward_applicable(now));
        let delta = mul3_div(
            elapsed as u128,
            self.reward_rate,
            PRECISION,
            self.total_staked,
        )
        .ok_or(RewardsError::Overflow)?;
        self.reward_per_token_stored
            .checked_add(delta)
            .ok_or(RewardsError::Overflow)
    }

    /// `total_released` brought up to `now`, without mutating state.
    ///
    /// Follows the accumulator: nothing is released while nothing is staked.
    pub fn released_through(&self, now: Timestamp) -> Result<u128, RewardsError> {
        if self.total_staked == 0 {
            return Ok(self.total_released);
        }
        let elapsed = self
            .last_update_time
            .elapsed_since(self.last_time_reward_applicable(now));
        let pending = (elapsed as u128)
            .checked_mul(self.reward_rate)
            .ok_or(RewardsError::Overflow)?;
        self.total_released
            .checked_add(pending)
            .ok_or(RewardsError::Overflow)
    }

    /// Released reward not yet paid out: what the pool owes stakers, settled
    /// or not.
    pub fn unclaimed_reward(&self, now: Timestamp) -> Result<u128, RewardsError> {
        self.released_through(now)?
            .checked_sub(self.total_claimed)
            .ok_or_else(|| {
                RewardsError::InvariantViolation(format!(
                    "claimed {} exceeds released reward",
                    self.total_claimed
                ))
            })
    }
}

impl AccountState {
    /// Reward this account would hold after settling against `reward_per_token`.
    pub fn earned(&self, reward_per_token: u128) -> Result<u128, RewardsError> {
        let delta = reward_per_token
            .checked_sub(self.reward_per_token_paid)
            .ok_or(RewardsError::Overflow)?;
        let pending =
            mul_div(self.staked_balance, delta, PRECISION).ok_or(RewardsError::Overflow)?;
        self.rewards_owed
            .checked_add(pending)
            .ok_or(RewardsError::Overflow)
    }
}

/// Bring the accumulator up to `now` and, if given, settle `account` against it.
///
/// Must run before any change to a balance, the total, or the reward rate.
/// Running it twice at the same instant is a no-op the second time. Nothing is
/// written unless every computation succeeds.
pub fn checkpoint(
    global: &mut GlobalState,
    account: Option<&mut AccountState>,
    now: Timestamp,
) -> Result<u128, RewardsError> {
    let reward_per_token = global.reward_per_token(now)?;
    let released = global.released_through(now)?;
    let settled = match &account {
        Some(account) => Some(account.earned(reward_per_token)?),
        None => None,
    };

    global.reward_per_token_stored = reward_per_token;
    global.total_released = released;
    global.last_update_time = global.last_time_reward_applicable(now);
    if let (Some(account), Some(owed)) = (account, settled) {
        account.rewards_owed = owed;
        account.reward_per_token_paid = reward_per_token;
    }
    Ok(reward_per_token)
}
