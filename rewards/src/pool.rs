//! The staking pool: public surface over the ledger, accumulator and distributor.
//!
//! Every write follows the same sequence:
//!
//! 1. validate the request (no state touched on failure)
//! 2. checkpoint the accumulator and the affected account
//! 3. apply the internal effect
//! 4. call the token link last
//! 5. undo step 3 if the token call fails
//!
//! Step 2 is never undone. A checkpoint only records reward already released,
//! so keeping it after a failed transfer loses nothing and double-counts
//! nothing.

use crate::accumulator::checkpoint;
use crate::config::PoolConfig;
use crate::distributor::{FundingPlan, PeriodStatus};
use crate::error::RewardsError;
use crate::ledger::StakeLedger;
use crate::snapshot::PoolSnapshot;
use crate::state::{AccountState, GlobalState};
use stakeline_token::TokenLink;
use stakeline_types::{AccountId, Clock, Timestamp};
use tracing::{debug, error, info, warn};

/// A single-stake-asset, single-reward-asset staking pool.
///
/// `C` supplies time, `S` moves the stake asset, `R` moves the reward asset.
/// `S` and `R` may be links to the same asset.
pub struct StakingPool<C, S, R> {
    config: PoolConfig,
    clock: C,
    stake_token: S,
    reward_token: R,
    global: GlobalState,
    ledger: StakeLedger,
}

/// Log invariant failures on their way out. Everything else is an ordinary
/// rejected request.
fn surface(err: RewardsError) -> RewardsError {
    if err.is_fatal() {
        error!(error = %err, "reward engine invariant failure");
    }
    err
}

impl<C, S, R> StakingPool<C, S, R>
where
    C: Clock,
    S: TokenLink,
    R: TokenLink,
{
    /// Create an unfunded pool with no stakers.
    pub fn new(config: PoolConfig, clock: C, stake_token: S, reward_token: R) -> Self {
        Self {
            config,
            clock,
            stake_token,
            reward_token,
            global: GlobalState::new(),
            ledger: StakeLedger::new(),
        }
    }

    /// Rebuild a pool from a validated snapshot.
    pub fn restore(
        config: PoolConfig,
        clock: C,
        stake_token: S,
        reward_token: R,
        snapshot: PoolSnapshot,
    ) -> Result<Self, RewardsError> {
        snapshot.validate()?;
        let accounts = snapshot.accounts.len();
        let (global, ledger) = snapshot.into_parts();
        info!(
            accounts,
            total_staked = %global.total_staked,
            period_finish = %global.period_finish,
            "restored staking pool from snapshot"
        );
        Ok(Self {
            config,
            clock,
            stake_token,
            reward_token,
            global,
            ledger,
        })
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot::capture(&self.global, &self.ledger, self.clock.now())
    }

    /// Check the pool's structural invariants. O(accounts).
    pub fn audit(&self) -> Result<(), RewardsError> {
        let sum = self
            .ledger
            .sum_balances()
            .ok_or(RewardsError::Overflow)
            .map_err(surface)?;
        if sum != self.global.total_staked {
            return Err(surface(RewardsError::InvariantViolation(format!(
                "sum of balances {sum} != total_staked {}",
                self.global.total_staked
            ))));
        }
        self.global.unclaimed_reward(self.clock.now()).map_err(surface)?;
        self.snapshot().validate().map_err(surface)
    }

    // ── Reads ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn total_staked(&self) -> u128 {
        self.global.total_staked
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.ledger.balance_of(account)
    }

    /// Reward `account` could claim right now. Side-effect free.
    pub fn earned(&self, account: &AccountId) -> Result<u128, RewardsError> {
        let Some(state) = self.ledger.get(account) else {
            return Ok(0);
        };
        let reward_per_token = self.reward_per_token()?;
        state.earned(reward_per_token).map_err(surface)
    }

    pub fn reward_per_token(&self) -> Result<u128, RewardsError> {
        self.global
            .reward_per_token(self.clock.now())
            .map_err(surface)
    }

    pub fn last_time_reward_applicable(&self) -> Timestamp {
        self.global.last_time_reward_applicable(self.clock.now())
    }

    pub fn reward_rate(&self) -> u128 {
        self.global.reward_rate
    }

    pub fn period_finish(&self) -> Timestamp {
        self.global.period_finish
    }

    pub fn period_status(&self) -> PeriodStatus {
        self.global.period_status(self.clock.now())
    }

    /// Reward the current period has yet to release.
    pub fn remaining_reward(&self) -> Result<u128, RewardsError> {
        self.global
            .remaining_reward(self.clock.now())
            .map_err(surface)
    }

    pub fn account(&self, account: &AccountId) -> Option<&AccountState> {
        self.ledger.get(account)
    }

    pub fn global(&self) -> &GlobalState {
        &self.global
    }

    pub fn total_funded(&self) -> u128 {
        self.global.total_funded
    }

    pub fn total_claimed(&self) -> u128 {
        self.global.total_claimed
    }

    pub fn staker_count(&self) -> usize {
        self.ledger.staker_count()
    }

    /// Reward-asset balance the pool can commit to a new period.
    ///
    /// Reward already released to stakers and not yet claimed is spoken for.
    /// When stake and reward are the same asset, staked principal sits in the
    /// same balance and is excluded too.
    pub fn reward_available(&self) -> Result<u128, RewardsError> {
        let held = self
            .reward_token
            .balance_of(&self.config.pool_account)
            .map_err(RewardsError::BalanceQuery)?;
        let principal = if self.stake_token.asset() == self.reward_token.asset() {
            self.global.total_staked
        } else {
            0
        };
        let owed = self.global.unclaimed_reward(self.clock.now())?;
        Ok(held
            .saturating_sub(principal)
            .saturating_sub(owed))
    }

    // ── Writes ─────────────────────────────────────────────────────────

    /// Deposit `amount` of the stake asset from `account`.
    pub fn stake(&mut self, account: &AccountId, amount: u128) -> Result<(), RewardsError> {
        if amount == 0 {
            return Err(RewardsError::ZeroAmount);
        }
        let now = self.clock.now();
        let first_stake = self.ledger.get(account).is_none();
        let staged = checkpoint(&mut self.global, Some(self.ledger.entry(account)), now)
            .and_then(|_| self.ledger.credit(&mut self.global, account, amount));
        if let Err(e) = staged {
            if first_stake {
                self.ledger.forget(account);
            }
            return Err(surface(e));
        }

        if let Err(e) =
            self.stake_token
                .transfer_from(account, &self.config.pool_account, amount)
        {
            self.ledger
                .debit(&mut self.global, account, amount)
                .map_err(surface)?;
            if first_stake {
                self.ledger.forget(account);
            }
            warn!(%account, amount, error = %e, "stake transfer failed, rolled back");
            return Err(RewardsError::TransferFailed(e));
        }

        debug!(
            %account,
            amount,
            balance = self.ledger.balance_of(account),
            total_staked = self.global.total_staked,
            "staked"
        );
        Ok(())
    }

    /// Return `amount` of staked asset to `account`.
    pub fn withdraw(&mut self, account: &AccountId, amount: u128) -> Result<(), RewardsError> {
        if amount == 0 {
            return Err(RewardsError::ZeroAmount);
        }
        let available = self.ledger.balance_of(account);
        if amount > available {
            return Err(RewardsError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        let now = self.clock.now();
        checkpoint(&mut self.global, Some(self.ledger.entry(account)), now).map_err(surface)?;
        self.ledger
            .debit(&mut self.global, account, amount)
            .map_err(surface)?;

        if let Err(e) = self
            .stake_token
            .transfer(&self.config.pool_account, account, amount)
        {
            self.ledger
                .credit(&mut self.global, account, amount)
                .map_err(surface)?;
            warn!(%account, amount, error = %e, "withdraw transfer failed, rolled back");
            return Err(RewardsError::TransferFailed(e));
        }

        debug!(
            %account,
            amount,
            balance = self.ledger.balance_of(account),
            total_staked = self.global.total_staked,
            "withdrew"
        );
        Ok(())
    }

    /// Pay out everything `account` has earned. Returns the amount paid.
    pub fn claim(&mut self, account: &AccountId) -> Result<u128, RewardsError> {
        if self.ledger.get(account).is_none() {
            return Ok(0);
        }
        let now = self.clock.now();
        let state = self.ledger.entry(account);
        checkpoint(&mut self.global, Some(&mut *state), now).map_err(surface)?;

        let owed = state.rewards_owed;
        if owed == 0 {
            return Ok(0);
        }
        let account_claimed = state
            .total_claimed
            .checked_add(owed)
            .ok_or(RewardsError::Overflow)
            .map_err(surface)?;
        let pool_claimed = self
            .global
            .total_claimed
            .checked_add(owed)
            .ok_or(RewardsError::Overflow)
            .map_err(surface)?;

        if let Err(e) = self
            .reward_token
            .transfer(&self.config.pool_account, account, owed)
        {
            warn!(%account, owed, error = %e, "reward transfer failed, reward kept owed");
            return Err(RewardsError::TransferFailed(e));
        }

        let state = self.ledger.entry(account);
        state.rewards_owed = 0;
        state.total_claimed = account_claimed;
        self.global.total_claimed = pool_claimed;
        debug!(%account, paid = owed, "claimed");
        Ok(owed)
    }

    /// Withdraw the whole stake, then claim. Returns the reward paid.
    ///
    /// If the claim fails after the withdraw succeeded, the withdraw stands
    /// and the reward stays owed.
    pub fn exit(&mut self, account: &AccountId) -> Result<u128, RewardsError> {
        let balance = self.ledger.balance_of(account);
        if balance > 0 {
            self.withdraw(account, balance)?;
        }
        self.claim(account)
    }

    /// Start a new funding period of `duration_secs` releasing `amount` plus
    /// whatever the current period has not yet released.
    ///
    /// Only the configured funding authority may call this. The pool must
    /// already hold the reward asset the new period promises.
    pub fn fund(
        &mut self,
        caller: &AccountId,
        amount: u128,
        duration_secs: u64,
    ) -> Result<FundingPlan, RewardsError> {
        if *caller != self.config.funding_authority {
            return Err(RewardsError::NotFundingAuthority(caller.clone()));
        }
        if let Some(max) = self.config.max_reward_duration_secs {
            if duration_secs > max {
                return Err(RewardsError::DurationTooLong {
                    requested: duration_secs,
                    max,
                });
            }
        }
        let now = self.clock.now();
        let plan = self
            .global
            .plan_funding(amount, duration_secs, now)
            .map_err(surface)?;
        let available = self.reward_available()?;
        if plan.required > available {
            return Err(RewardsError::InsufficientRewardBalance {
                required: plan.required,
                available,
            });
        }

        checkpoint(&mut self.global, None, now).map_err(surface)?;
        self.global
            .apply_funding(&plan, amount, now)
            .map_err(surface)?;

        info!(
            amount,
            duration_secs,
            leftover = plan.leftover,
            reward_rate = plan.reward_rate,
            period_finish = %plan.period_finish,
            "funded reward period"
        );
        Ok(plan)
    }
}
