use proptest::prelude::*;

use stakeline_nullables::{NullClock, NullToken};
use stakeline_rewards::{PoolConfig, StakingPool};
use stakeline_types::AccountId;
use std::sync::Arc;

type TestPool = StakingPool<Arc<NullClock>, Arc<NullToken>, Arc<NullToken>>;

struct Sim {
    clock: Arc<NullClock>,
    stake: Arc<NullToken>,
    reward: Arc<NullToken>,
    config: PoolConfig,
    pool: TestPool,
}

fn sim() -> Sim {
    let config = PoolConfig::default();
    let clock = Arc::new(NullClock::new(0));
    let stake = Arc::new(NullToken::new("STK"));
    let reward = Arc::new(NullToken::new("RWD"));
    let pool = StakingPool::new(config.clone(), clock.clone(), stake.clone(), reward.clone());
    Sim {
        clock,
        stake,
        reward,
        config,
        pool,
    }
}

fn account(i: usize) -> AccountId {
    AccountId::new(format!("staker_{i}"))
}

#[derive(Clone, Debug)]
enum Op {
    Stake(usize, u128),
    Withdraw(usize, u128),
    Claim(usize),
    Exit(usize),
    Fund(u128, u64),
    Advance(u64),
    FailNextTransfer,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..3, 1u128..10_000).prop_map(|(a, n)| Op::Stake(a, n)),
        (0usize..3, 1u128..10_000).prop_map(|(a, n)| Op::Withdraw(a, n)),
        (0usize..3).prop_map(Op::Claim),
        (0usize..3).prop_map(Op::Exit),
        (1u128..1_000_000, 1u64..5_000).prop_map(|(n, d)| Op::Fund(n, d)),
        (0u64..2_000).prop_map(Op::Advance),
        Just(Op::FailNextTransfer),
    ]
}

impl Sim {
    /// Apply `op`, ignoring rejections: every rejection must leave the pool consistent.
    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Stake(a, n) => {
                self.stake.mint(&account(a), n);
                self.stake.approve(&account(a), &self.config.pool_account, n);
                let _ = self.pool.stake(&account(a), n);
            }
            Op::Withdraw(a, n) => {
                let _ = self.pool.withdraw(&account(a), n);
            }
            Op::Claim(a) => {
                let _ = self.pool.claim(&account(a));
            }
            Op::Exit(a) => {
                let _ = self.pool.exit(&account(a));
            }
            Op::Fund(n, d) => {
                self.reward.mint(&self.config.pool_account, n);
                let authority = self.config.funding_authority.clone();
                let _ = self.pool.fund(&authority, n, d);
            }
            Op::Advance(secs) => self.clock.advance(secs),
            Op::FailNextTransfer => {
                self.stake.fail_next_transfers(1);
                self.reward.fail_next_transfers(1);
            }
        }
    }

    fn total_earned(&self) -> u128 {
        (0..3).map(|i| self.pool.earned(&account(i)).unwrap()).sum()
    }
}

proptest! {
    /// Σ balances == total_staked, and pool custody matches, after any operation sequence.
    #[test]
    fn total_staked_matches_balances(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut s = sim();
        for op in &ops {
            s.apply(op);
            prop_assert!(s.pool.audit().is_ok(), "audit failed after {:?}", op);
            let sum: u128 = (0..3).map(|i| s.pool.balance_of(&account(i))).sum();
            prop_assert_eq!(sum, s.pool.total_staked());
            prop_assert_eq!(s.stake.balance(&s.config.pool_account), s.pool.total_staked());
        }
    }

    /// Paid plus still-claimable reward never exceeds what was funded.
    #[test]
    fn reward_is_conserved(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut s = sim();
        for op in &ops {
            s.apply(op);
            let claimed = s.pool.total_claimed();
            prop_assert!(claimed <= s.pool.total_funded());
            prop_assert!(claimed + s.total_earned() <= s.pool.total_funded());
            let released = s.pool.global().released_through(s.pool.now()).unwrap();
            prop_assert!(claimed + s.total_earned() <= released);
            prop_assert!(released <= s.pool.total_funded());
            let paid: u128 = (0..3).map(|i| s.reward.balance(&account(i))).sum();
            prop_assert_eq!(paid, claimed);
        }
    }

    /// Without withdraw or claim, earned never decreases as time passes.
    #[test]
    fn earned_is_monotonic(
        stake in 1u128..1_000_000,
        amount in 1_000u128..10_000_000,
        duration in 1u64..1_000,
        steps in prop::collection::vec(0u64..500, 1..20),
    ) {
        let mut s = sim();
        let who = account(0);
        s.apply(&Op::Stake(0, stake));
        s.apply(&Op::Fund(amount, duration));
        let mut last = s.pool.earned(&who).unwrap();
        for step in steps {
            s.clock.advance(step);
            let now = s.pool.earned(&who).unwrap();
            prop_assert!(now >= last, "earned dropped from {} to {}", last, now);
            last = now;
        }
    }

    /// earned is a pure read.
    #[test]
    fn earned_is_pure(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut s = sim();
        for op in &ops {
            s.apply(op);
        }
        let before = s.pool.snapshot();
        for i in 0..3 {
            let first = s.pool.earned(&account(i)).unwrap();
            let second = s.pool.earned(&account(i)).unwrap();
            prop_assert_eq!(first, second);
        }
        prop_assert_eq!(s.pool.snapshot(), before);
    }

    /// Two stakers present for a whole period split it by stake, up to rounding.
    #[test]
    fn full_period_split_is_proportional(
        a in 1u128..1_000_000,
        b in 1u128..1_000_000,
        rate in 1u128..1_000,
        duration in 1u64..10_000,
    ) {
        let mut s = sim();
        s.apply(&Op::Stake(0, a));
        s.apply(&Op::Stake(1, b));
        let amount = rate * duration as u128;
        s.apply(&Op::Fund(amount, duration));
        s.clock.advance(duration);

        let ea = s.pool.earned(&account(0)).unwrap();
        let eb = s.pool.earned(&account(1)).unwrap();
        prop_assert!(ea + eb <= amount);
        prop_assert!(amount - (ea + eb) <= 2);
        let expected_a = amount * a / (a + b);
        prop_assert!(ea.abs_diff(expected_a) <= 1);
    }
}
