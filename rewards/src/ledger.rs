//! Staked balances per account and the pool-wide total.

use crate::error::RewardsError;
use crate::state::{AccountState, GlobalState};
use stakeline_types::AccountId;
use std::collections::HashMap;

/// Per-account reward state, keyed by account.
///
/// Credits and debits keep `GlobalState::total_staked` equal to the sum of
/// every `staked_balance`. Both are all-or-nothing: on error nothing changes.
#[derive(Clone, Debug, Default)]
pub struct StakeLedger {
    accounts: HashMap<AccountId, AccountState>,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_accounts(accounts: HashMap<AccountId, AccountState>) -> Self {
        Self { accounts }
    }

    pub fn get(&self, account: &AccountId) -> Option<&AccountState> {
        self.accounts.get(account)
    }

    /// The account's state, created with zero fields if it has never staked.
    pub(crate) fn entry(&mut self, account: &AccountId) -> &mut AccountState {
        self.accounts.entry(account.clone()).or_default()
    }

    /// Drop an account created by a stake that did not go through.
    pub(crate) fn forget(&mut self, account: &AccountId) {
        self.accounts.remove(account);
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.accounts
            .get(account)
            .map(|a| a.staked_balance)
            .unwrap_or(0)
    }

    /// Add `amount` to the account's stake and the pool total.
    pub(crate) fn credit(
        &mut self,
        global: &mut GlobalState,
        account: &AccountId,
        amount: u128,
    ) -> Result<(), RewardsError> {
        let total = global
            .total_staked
            .checked_add(amount)
            .ok_or(RewardsError::Overflow)?;
        let state = self.entry(account);
        state.staked_balance = state
            .staked_balance
            .checked_add(amount)
            .ok_or(RewardsError::Overflow)?;
        global.total_staked = total;
        Ok(())
    }

    /// Remove `amount` from the account's stake and the pool total.
    pub(crate) fn debit(
        &mut self,
        global: &mut GlobalState,
        account: &AccountId,
        amount: u128,
    ) -> Result<(), RewardsError> {
        let available = self.balance_of(account);
        if amount > available {
            return Err(RewardsError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        let total = global
            .total_staked
            .checked_sub(amount)
            .ok_or(RewardsError::Overflow)?;
        let state = self.entry(account);
        state.staked_balance -= amount;
        global.total_staked = total;
        Ok(())
    }

    /// Number of accounts with a non-zero stake.
    pub fn staker_count(&self) -> usize {
        self.accounts
            .values()
            .filter(|a| a.staked_balance > 0)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &AccountState)> {
        self.accounts.iter()
    }

    /// Sum of every account's stake. O(n); `StakingPool::audit` checks it
    /// against `total_staked`.
    pub fn sum_balances(&self) -> Option<u128> {
        self.accounts
            .values()
            .try_fold(0u128, |acc, a| acc.checked_add(a.staked_balance))
    }
}
