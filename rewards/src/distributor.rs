//! Funding periods: reward rate, period end, and rollover of unspent reward.
//!
//! The period moves `Unfunded → Active → Expired → Active → …`. Only a
//! successful fund moves it into `Active`; time alone moves it into `Expired`.
//! Funding never touches balances.

use crate::error::RewardsError;
use crate::state::GlobalState;
use serde::{Deserialize, Serialize};
use stakeline_types::Timestamp;

/// Where the pool is in its funding lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodStatus {
    /// Never funded.
    Unfunded,
    /// Releasing reward until `finish`.
    Active { finish: Timestamp },
    /// The last period ended at `finish`; nothing accrues until the next fund.
    Expired { finish: Timestamp },
}

/// The outcome a fund call would commit, computed without mutating state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundingPlan {
    /// New reward units per second.
    pub reward_rate: u128,
    /// New end of the period: `now + duration`.
    pub period_finish: Timestamp,
    /// Unreleased reward carried over from the still-active period.
    pub leftover: u128,
    /// `reward_rate × duration`: what the pool must hold to honour the period.
    pub required: u128,
}

impl GlobalState {
    pub fn period_status(&self, now: Timestamp) -> PeriodStatus {
        if self.total_funded == 0 {
            PeriodStatus::Unfunded
        } else if now < self.period_finish {
            PeriodStatus::Active {
                finish: self.period_finish,
            }
        } else {
            PeriodStatus::Expired {
                finish: self.period_finish,
            }
        }
    }

    /// Reward the current period has yet to release: `(period_finish − now) × rate`.
    pub fn remaining_reward(&self, now: Timestamp) -> Result<u128, RewardsError> {
        if now >= self.period_finish {
            return Ok(0);
        }
        let remaining = now.elapsed_since(self.period_finish) as u128;
        remaining
            .checked_mul(self.reward_rate)
            .ok_or(RewardsError::Overflow)
    }

    /// Compute the rate and period a fund of `amount` over `duration_secs`
    /// starting at `now` would produce.
    ///
    /// An expired (or never started) period contributes nothing. An active
    /// period contributes its unreleased reward, which is spread over the new
    /// duration together with `amount`.
    pub fn plan_funding(
        &self,
        amount: u128,
        duration_secs: u64,
        now: Timestamp,
    ) -> Result<FundingPlan, RewardsError> {
        if amount == 0 {
            return Err(RewardsError::ZeroAmount);
        }
        if duration_secs == 0 {
            return Err(RewardsError::ZeroDuration);
        }
        let leftover = self.remaining_reward(now)?;
        let total = amount.checked_add(leftover).ok_or(RewardsError::Overflow)?;
        let reward_rate = total / duration_secs as u128;
        let period_finish = now
            .checked_add_secs(duration_secs)
            .ok_or(RewardsError::Overflow)?;
        let required = reward_rate
            .checked_mul(duration_secs as u128)
            .ok_or(RewardsError::Overflow)?;
        Ok(FundingPlan {
            reward_rate,
            period_finish,
            leftover,
            required,
        })
    }

    /// Commit a funding plan. The accumulator must already be checkpointed at `now`.
    pub fn apply_funding(
        &mut self,
        plan: &FundingPlan,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), RewardsError> {
        let total_funded = self
            .total_funded
            .checked_add(amount)
            .ok_or(RewardsError::Overflow)?;
        self.reward_rate = plan.reward_rate;
        self.period_finish = plan.period_finish;
        self.last_update_time = now;
        self.total_funded = total_funded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn first_fund_sets_rate_from_amount() {
        let g = GlobalState::new();
        let plan = g.plan_funding(1000, 1000, ts(10)).unwrap();
        assert_eq!(plan.reward_rate, 1);
        assert_eq!(plan.leftover, 0);
        assert_eq!(plan.period_finish, ts(1010));
        assert_eq!(plan.required, 1000);
    }

    #[test]
    fn refund_mid_period_rolls_over_unspent_reward() {
        let mut g = GlobalState::new();
        let plan = g.plan_funding(2000, 1000, ts(0)).unwrap();
        g.apply_funding(&plan, 2000, ts(0)).unwrap();
        assert_eq!(g.reward_rate, 2);

        // 500s left at 2/s = 1000 unspent
        let plan = g.plan_funding(1000, 1000, ts(500)).unwrap();
        assert_eq!(plan.leftover, 1000);
        assert_eq!(plan.reward_rate, (1000 + 1000) / 1000);
        assert_eq!(plan.period_finish, ts(1500));
    }

    #[test]
    fn refund_after_expiry_discards_nothing_and_carries_nothing() {
        let mut g = GlobalState::new();
        let plan = g.plan_funding(1000, 100, ts(0)).unwrap();
        g.apply_funding(&plan, 1000, ts(0)).unwrap();
        let plan = g.plan_funding(300, 100, ts(100)).unwrap();
        assert_eq!(plan.leftover, 0);
        assert_eq!(plan.reward_rate, 3);
    }

    #[test]
    fn zero_inputs_are_rejected() {
        let g = GlobalState::new();
        assert!(matches!(g.plan_funding(0, 10, ts(0)), Err(RewardsError::ZeroAmount)));
        assert!(matches!(g.plan_funding(10, 0, ts(0)), Err(RewardsError::ZeroDuration)));
    }

    #[test]
    fn amount_smaller_than_duration_opens_a_zero_rate_period() {
        let mut g = GlobalState::new();
        let plan = g.plan_funding(500, 1000, ts(0)).unwrap();
        assert_eq!(plan.reward_rate, 0);
        assert_eq!(plan.period_finish, ts(1000));
        assert_eq!(plan.required, 0);
        g.apply_funding(&plan, 500, ts(0)).unwrap();
        assert_eq!(g.period_status(ts(10)), PeriodStatus::Active { finish: ts(1000) });
        assert_eq!(g.total_funded, 500);
    }

    #[test]
    fn period_status_transitions() {
        let mut g = GlobalState::new();
        assert_eq!(g.period_status(ts(0)), PeriodStatus::Unfunded);
        let plan = g.plan_funding(100, 100, ts(0)).unwrap();
        g.apply_funding(&plan, 100, ts(0)).unwrap();
        assert_eq!(g.period_status(ts(99)), PeriodStatus::Active { finish: ts(100) });
        assert_eq!(g.period_status(ts(100)), PeriodStatus::Expired { finish: ts(100) });
        assert_eq!(g.remaining_reward(ts(100)).unwrap(), 0);
        assert_eq!(g.remaining_reward(ts(40)).unwrap(), 60);
    }

    #[test]
    fn period_finish_overflow_is_detected() {
        let g = GlobalState::new();
        assert!(matches!(
            g.plan_funding(u128::MAX, u64::MAX, ts(1)),
            Err(RewardsError::Overflow)
        ));
    }
}
