//! Reward-accrual engine for a single-asset staking pool.
//!
//! A funded pool releases `reward_rate` reward units per second until
//! `period_finish`. Every staker receives a share of each second's release
//! proportional to its stake at that second:
//!
//! `earned(a) = owed(a) + staked(a) × (reward_per_token − paid(a)) / PRECISION`
//!
//! The global `reward_per_token` accumulator advances once per operation, and
//! each account settles against it when it is touched, so stake, withdraw,
//! claim and fund are all O(1) in the number of stakers.
//!
//! This crate handles:
//! - The accumulator and per-account checkpoints (`accumulator`)
//! - Funding periods and rollover of unspent reward (`distributor`)
//! - Staked balances and the global total (`ledger`)
//! - The public pool surface with staged rollback around token transfers (`pool`)
//! - A thread-safe single-writer wrapper (`service`)
//! - Snapshots and TOML configuration (`snapshot`, `config`)

pub mod accumulator;
pub mod config;
pub mod distributor;
pub mod error;
pub mod ledger;
pub mod math;
pub mod pool;
pub mod service;
pub mod snapshot;
pub mod state;

pub use accumulator::PRECISION;
pub use config::PoolConfig;
pub use distributor::{FundingPlan, PeriodStatus};
pub use error::{ErrorKind, RewardsError};
pub use ledger::StakeLedger;
pub use pool::StakingPool;
pub use service::StakingService;
pub use snapshot::PoolSnapshot;
pub use state::{AccountState, GlobalState};
