//! Abstract token capability consumed by the staking pool.
//!
//! The pool never moves balances itself. Every transfer of the stake asset or
//! the reward asset goes through a [`TokenLink`], so the same pool logic runs
//! against an on-chain token, a custodial ledger, or the in-memory
//! `NullToken` used in tests.

pub mod error;

pub use error::TokenError;

use stakeline_types::{AccountId, AssetId};
use std::sync::Arc;

/// Transfer and balance capability for a single fungible asset.
///
/// Implementations use interior mutability; callers hold a shared reference.
/// A failed transfer must leave every balance unchanged.
pub trait TokenLink {
    /// The asset this link moves.
    fn asset(&self) -> AssetId;

    /// Current balance of `holder`.
    fn balance_of(&self, holder: &AccountId) -> Result<u128, TokenError>;

    /// Move `amount` from `payer` to `to`, drawing on an allowance `payer`
    /// granted to `to` beforehand.
    fn transfer_from(&self, payer: &AccountId, to: &AccountId, amount: u128)
        -> Result<(), TokenError>;

    /// Move `amount` out of `from` (an account the caller controls) to `to`.
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TokenError>;
}

impl<T: TokenLink + ?Sized> TokenLink for &T {
    fn asset(&self) -> AssetId {
        (**self).asset()
    }

    fn balance_of(&self, holder: &AccountId) -> Result<u128, TokenError> {
        (**self).balance_of(holder)
    }

    fn transfer_from(
        &self,
        payer: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        (**self).transfer_from(payer, to, amount)
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        (**self).transfer(from, to, amount)
    }
}

impl<T: TokenLink + ?Sized> TokenLink for Arc<T> {
    fn asset(&self) -> AssetId {
        (**self).asset()
    }

    fn balance_of(&self, holder: &AccountId) -> Result<u128, TokenError> {
        (**self).balance_of(holder)
    }

    fn transfer_from(
        &self,
        payer: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        (**self).transfer_from(payer, to, amount)
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        (**self).transfer(from, to, amount)
    }
}
