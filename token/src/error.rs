use stakeline_types::AccountId;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient balance for {holder}: need {needed}, have {available}")]
    InsufficientBalance {
        holder: AccountId,
        needed: u128,
        available: u128,
    },

    #[error("insufficient allowance from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        needed: u128,
        available: u128,
    },

    #[error("transfer rejected: {0}")]
    Rejected(String),

    #[error("token backend unavailable: {0}")]
    Unavailable(String),

    #[error("arithmetic overflow in token balance")]
    Overflow,
}
