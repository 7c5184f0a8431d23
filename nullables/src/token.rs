//! Nullable token: a thread-safe in-memory fungible token for tests and simulations.

use stakeline_token::{TokenError, TokenLink};
use stakeline_types::{AccountId, AssetId};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Book {
    balances: HashMap<AccountId, u128>,
    /// (owner, spender) → remaining allowance.
    allowances: HashMap<(AccountId, AccountId), u128>,
    /// Number of upcoming transfers to reject.
    failures_pending: u32,
}

impl Book {
    fn take_failure(&mut self) -> Option<TokenError> {
        if self.failures_pending == 0 {
            return None;
        }
        self.failures_pending -= 1;
        Some(TokenError::Rejected("injected failure".into()))
    }

    fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let available = self.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                holder: from.clone(),
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balances
            .get(to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(from.clone(), available - amount);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

/// An in-memory token with ERC-20 style allowances.
///
/// `transfer_from(payer, to, amount)` spends the allowance `payer` granted to
/// `to`: the receiving pool is also the spender. Failures can be injected
/// with [`NullToken::fail_next_transfers`].
pub struct NullToken {
    asset: AssetId,
    book: Mutex<Book>,
}

impl NullToken {
    pub fn new(symbol: &str) -> Self {
        Self {
            asset: AssetId::new(symbol),
            book: Mutex::new(Book::default()),
        }
    }

    /// Create `amount` new tokens in `to`.
    pub fn mint(&self, to: &AccountId, amount: u128) {
        let mut book = self.book.lock().unwrap();
        let balance = book.balances.entry(to.clone()).or_insert(0);
        *balance += amount;
    }

    /// Let `spender` pull up to `amount` from `owner`. Replaces any previous allowance.
    pub fn approve(&self, owner: &AccountId, spender: &AccountId, amount: u128) {
        self.book
            .lock()
            .unwrap()
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.book
            .lock()
            .unwrap()
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Infallible balance read for test assertions.
    pub fn balance(&self, holder: &AccountId) -> u128 {
        self.book
            .lock()
            .unwrap()
            .balances
            .get(holder)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.book.lock().unwrap().balances.values().sum()
    }

    /// Reject the next `count` transfers (either kind) without moving anything.
    pub fn fail_next_transfers(&self, count: u32) {
        self.book.lock().unwrap().failures_pending = count;
    }
}

impl TokenLink for NullToken {
    fn asset(&self) -> AssetId {
        self.asset.clone()
    }

    fn balance_of(&self, holder: &AccountId) -> Result<u128, TokenError> {
        Ok(self.balance(holder))
    }

    fn transfer_from(
        &self,
        payer: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let mut book = self.book.lock().unwrap();
        if let Some(err) = book.take_failure() {
            return Err(err);
        }
        let key = (payer.clone(), to.clone());
        let allowed = book.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: payer.clone(),
                spender: to.clone(),
                needed: amount,
                available: allowed,
            });
        }
        book.move_balance(payer, to, amount)?;
        book.allowances.insert(key, allowed - amount);
        Ok(())
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        let mut book = self.book.lock().unwrap();
        if let Some(err) = book.take_failure() {
            return Err(err);
        }
        book.move_balance(from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s)
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let token = NullToken::new("STK");
        token.mint(&id("alice"), 100);
        token.approve(&id("alice"), &id("pool"), 60);

        token.transfer_from(&id("alice"), &id("pool"), 50).unwrap();
        assert_eq!(token.balance(&id("alice")), 50);
        assert_eq!(token.balance(&id("pool")), 50);
        assert_eq!(token.allowance(&id("alice"), &id("pool")), 10);

        let err = token.transfer_from(&id("alice"), &id("pool"), 11).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { available: 10, .. }));
    }

    #[test]
    fn overdraft_leaves_balances_untouched() {
        let token = NullToken::new("RWD");
        token.mint(&id("pool"), 5);
        let err = token.transfer(&id("pool"), &id("bob"), 6).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { needed: 6, available: 5, .. }));
        assert_eq!(token.balance(&id("pool")), 5);
        assert_eq!(token.balance(&id("bob")), 0);
    }

    #[test]
    fn injected_failures_are_consumed_in_order() {
        let token = NullToken::new("RWD");
        token.mint(&id("pool"), 10);
        token.fail_next_transfers(2);
        assert!(token.transfer(&id("pool"), &id("bob"), 1).is_err());
        assert!(token.transfer(&id("pool"), &id("bob"), 1).is_err());
        token.transfer(&id("pool"), &id("bob"), 1).unwrap();
        assert_eq!(token.balance(&id("bob")), 1);
        assert_eq!(token.total_supply(), 10);
    }
}
