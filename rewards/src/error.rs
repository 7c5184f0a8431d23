//! Reward-engine errors.

use stakeline_token::TokenError;
use stakeline_types::AccountId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewardsError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("funding duration must be non-zero")]
    ZeroDuration,

    #[error("funding duration {requested}s exceeds maximum {max}s")]
    DurationTooLong { requested: u64, max: u64 },

    #[error("insufficient stake: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },

    #[error("{0} is not the funding authority")]
    NotFundingAuthority(AccountId),

    #[error("token transfer failed: {0}")]
    TransferFailed(#[source] TokenError),

    #[error("reward balance query failed: {0}")]
    BalanceQuery(#[source] TokenError),

    #[error("insufficient reward balance: period requires {required}, pool holds {available}")]
    InsufficientRewardBalance { required: u128, available: u128 },

    #[error("arithmetic overflow in reward computation")]
    Overflow,

    #[error("staking service lock poisoned by a panicked operation")]
    Poisoned,

    #[error("pool invariant violated: {0}")]
    InvariantViolation(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("config error: {0}")]
    Config(String),
}

/// Broad classification of a [`RewardsError`], telling the caller what
/// happened to pool state and whether a retry can succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any mutation.
    Validation,
    /// Caller lacks the required role; rejected before any mutation.
    Authorization,
    /// External token call failed; staged mutation was rolled back.
    Transfer,
    /// Funding would promise more than the pool holds; no state change.
    Solvency,
    /// Arithmetic or internal invariant broken. Not recoverable.
    Invariant,
    /// Snapshot or configuration could not be read or written.
    Storage,
}

impl RewardsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAmount
            | Self::ZeroDuration
            | Self::DurationTooLong { .. }
            | Self::InsufficientBalance { .. } => ErrorKind::Validation,
            Self::NotFundingAuthority(_) => ErrorKind::Authorization,
            Self::TransferFailed(_) | Self::BalanceQuery(_) => ErrorKind::Transfer,
            Self::InsufficientRewardBalance { .. } => ErrorKind::Solvency,
            Self::Overflow | Self::Poisoned | Self::InvariantViolation(_) => ErrorKind::Invariant,
            Self::Snapshot(_) | Self::Config(_) => ErrorKind::Storage,
        }
    }

    /// Whether this error signals a broken internal invariant rather than a
    /// rejected request.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Invariant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_matches_recovery_semantics() {
        assert_eq!(RewardsError::ZeroAmount.kind(), ErrorKind::Validation);
        assert_eq!(
            RewardsError::InsufficientBalance { requested: 2, available: 1 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RewardsError::TransferFailed(TokenError::Rejected("paused".into())).kind(),
            ErrorKind::Transfer
        );
        assert_eq!(
            RewardsError::InsufficientRewardBalance { required: 2, available: 1 }.kind(),
            ErrorKind::Solvency
        );
        assert!(RewardsError::Overflow.is_fatal());
        assert!(!RewardsError::ZeroDuration.is_fatal());
    }

    #[test]
    fn transfer_error_keeps_source() {
        use std::error::Error as _;
        let err = RewardsError::TransferFailed(TokenError::Unavailable("rpc down".into()));
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "token transfer failed: token backend unavailable: rpc down");
    }
}
