//! Thread-safe single-writer access to a staking pool.
//!
//! Every pool operation reads the accumulator, mutates, and possibly rolls
//! back. Two operations interleaving inside that sequence could settle an
//! account against a stale accumulator, so the service runs each one as a
//! single critical section under one lock. Reads take the same lock and
//! therefore observe only states between operations.

use crate::distributor::FundingPlan;
use crate::error::{ErrorKind, RewardsError};
use crate::pool::StakingPool;
use crate::snapshot::PoolSnapshot;
use stakeline_token::TokenLink;
use stakeline_types::{AccountId, Clock, Timestamp};
use stakeline_utils::StatsCounter;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const OPERATIONS: &[&str] = &[
    "stake",
    "withdraw",
    "claim",
    "exit",
    "fund",
    "rejected",
    "rolled_back",
];

/// A cloneable handle to a pool shared between threads.
pub struct StakingService<C, S, R> {
    pool: Arc<Mutex<StakingPool<C, S, R>>>,
    stats: Arc<StatsCounter>,
}

impl<C, S, R> Clone for StakingService<C, S, R> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<C, S, R> StakingService<C, S, R>
where
    C: Clock,
    S: TokenLink,
    R: TokenLink,
{
    pub fn new(pool: StakingPool<C, S, R>) -> Self {
        Self {
            pool: Arc::new(Mutex::new(pool)),
            stats: Arc::new(StatsCounter::new(OPERATIONS)),
        }
    }

    /// Run `f` with exclusive access to the pool.
    pub fn with_pool<T>(
        &self,
        f: impl FnOnce(&mut StakingPool<C, S, R>) -> Result<T, RewardsError>,
    ) -> Result<T, RewardsError> {
        let mut pool = self.pool.lock().map_err(|_| RewardsError::Poisoned)?;
        f(&mut pool)
    }

    fn record<T>(&self, op: &'static str, result: Result<T, RewardsError>) -> Result<T, RewardsError> {
        match &result {
            Ok(_) => self.stats.increment(op),
            Err(e) => {
                self.stats.increment("rejected");
                if e.kind() == ErrorKind::Transfer {
                    self.stats.increment("rolled_back");
                }
            }
        }
        result
    }

    pub fn stake(&self, account: &AccountId, amount: u128) -> Result<(), RewardsError> {
        let result = self.with_pool(|pool| pool.stake(account, amount));
        self.record("stake", result)
    }

    pub fn withdraw(&self, account: &AccountId, amount: u128) -> Result<(), RewardsError> {
        let result = self.with_pool(|pool| pool.withdraw(account, amount));
        self.record("withdraw", result)
    }

    pub fn claim(&self, account: &AccountId) -> Result<u128, RewardsError> {
        let result = self.with_pool(|pool| pool.claim(account));
        self.record("claim", result)
    }

    pub fn exit(&self, account: &AccountId) -> Result<u128, RewardsError> {
        let result = self.with_pool(|pool| pool.exit(account));
        self.record("exit", result)
    }

    pub fn fund(
        &self,
        caller: &AccountId,
        amount: u128,
        duration_secs: u64,
    ) -> Result<FundingPlan, RewardsError> {
        let result = self.with_pool(|pool| pool.fund(caller, amount, duration_secs));
        self.record("fund", result)
    }

    pub fn total_staked(&self) -> Result<u128, RewardsError> {
        self.with_pool(|pool| Ok(pool.total_staked()))
    }

    pub fn balance_of(&self, account: &AccountId) -> Result<u128, RewardsError> {
        self.with_pool(|pool| Ok(pool.balance_of(account)))
    }

    pub fn earned(&self, account: &AccountId) -> Result<u128, RewardsError> {
        self.with_pool(|pool| pool.earned(account))
    }

    pub fn reward_rate(&self) -> Result<u128, RewardsError> {
        self.with_pool(|pool| Ok(pool.reward_rate()))
    }

    pub fn period_finish(&self) -> Result<Timestamp, RewardsError> {
        self.with_pool(|pool| Ok(pool.period_finish()))
    }

    pub fn snapshot(&self) -> Result<PoolSnapshot, RewardsError> {
        self.with_pool(|pool| Ok(pool.snapshot()))
    }

    /// Successful operations by name, plus `rejected` and `rolled_back` totals.
    pub fn stats(&self) -> BTreeMap<&'static str, u64> {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use stakeline_nullables::{NullClock, NullToken};
    use std::thread;

    type TestService = StakingService<Arc<NullClock>, Arc<NullToken>, Arc<NullToken>>;

    fn service() -> (TestService, Arc<NullClock>, Arc<NullToken>, Arc<NullToken>) {
        let clock = Arc::new(NullClock::new(1_000));
        let stake = Arc::new(NullToken::new("STK"));
        let reward = Arc::new(NullToken::new("RWD"));
        let pool = StakingPool::new(
            PoolConfig::default(),
            clock.clone(),
            stake.clone(),
            reward.clone(),
        );
        (StakingService::new(pool), clock, stake, reward)
    }

    #[test]
    fn concurrent_stakes_and_withdrawals_keep_totals_consistent() {
        let (svc, _clock, stake, _reward) = service();
        let pool_account = PoolConfig::default().pool_account;
        let accounts: Vec<AccountId> = (0..8).map(|i| AccountId::new(format!("staker_{i}"))).collect();
        for account in &accounts {
            stake.mint(account, 1_000);
            stake.approve(account, &pool_account, 1_000);
        }

        let handles: Vec<_> = accounts
            .iter()
            .cloned()
            .map(|account| {
                let svc = svc.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        svc.stake(&account, 10).unwrap();
                    }
                    for _ in 0..20 {
                        svc.withdraw(&account, 10).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(svc.total_staked().unwrap(), 8 * 300);
        for account in &accounts {
            assert_eq!(svc.balance_of(account).unwrap(), 300);
        }
        svc.with_pool(|pool| pool.audit()).unwrap();
        assert_eq!(svc.stats()["stake"], 400);
        assert_eq!(svc.stats()["withdraw"], 160);
    }

    #[test]
    fn stats_count_rejections_and_rollbacks() {
        let (svc, _clock, stake, _reward) = service();
        let alice = AccountId::new("alice");
        stake.mint(&alice, 10);

        assert!(svc.stake(&alice, 0).is_err());
        // no allowance: transfer fails and is rolled back
        assert!(svc.stake(&alice, 10).is_err());

        let stats = svc.stats();
        assert_eq!(stats["stake"], 0);
        assert_eq!(stats["rejected"], 2);
        assert_eq!(stats["rolled_back"], 1);
        assert_eq!(svc.total_staked().unwrap(), 0);
    }

    #[test]
    fn reads_see_funded_period() {
        let (svc, clock, stake, reward) = service();
        let config = PoolConfig::default();
        let alice = AccountId::new("alice");
        stake.mint(&alice, 100);
        stake.approve(&alice, &config.pool_account, 100);
        reward.mint(&config.pool_account, 600);

        svc.stake(&alice, 100).unwrap();
        svc.fund(&config.funding_authority, 600, 60).unwrap();
        clock.advance(30);

        assert_eq!(svc.reward_rate().unwrap(), 10);
        assert_eq!(svc.period_finish().unwrap(), Timestamp::new(1_060));
        assert_eq!(svc.earned(&alice).unwrap(), 300);
        assert_eq!(svc.claim(&alice).unwrap(), 300);
        assert_eq!(svc.snapshot().unwrap().global.total_claimed, 300);
    }
}
