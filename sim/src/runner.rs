//! Replays a scenario against an in-memory pool.

use crate::scenario::{Scenario, Step};
use anyhow::Context;
use stakeline_nullables::{NullClock, NullToken};
use stakeline_rewards::{
    PeriodStatus, PoolConfig, PoolSnapshot, RewardsError, StakingPool, StakingService,
};
use stakeline_types::{AccountId, Timestamp};
use stakeline_utils::format_duration;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

type SimService = StakingService<Arc<NullClock>, Arc<NullToken>, Arc<NullToken>>;

/// One account's position at report time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountRow {
    pub account: AccountId,
    pub staked: u128,
    pub earned: u128,
    pub claimed: u128,
}

/// Pool state at a `report` step or at the end of the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub elapsed_secs: u64,
    pub total_staked: u128,
    pub reward_rate: u128,
    pub period: String,
    pub accounts: Vec<AccountRow>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "t+{}  total_staked={}  rate={}/s  period={}",
            format_duration(self.elapsed_secs),
            self.total_staked,
            self.reward_rate,
            self.period
        )?;
        writeln!(f, "  {:<20} {:>24} {:>24} {:>24}", "account", "staked", "earned", "claimed")?;
        for row in &self.accounts {
            writeln!(
                f,
                "  {:<20} {:>24} {:>24} {:>24}",
                row.account.as_str(),
                row.staked,
                row.earned,
                row.claimed
            )?;
        }
        Ok(())
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct Outcome {
    pub reports: Vec<Report>,
    pub rejected_steps: usize,
    pub stats: BTreeMap<&'static str, u64>,
    /// Pool state after the last step.
    pub snapshot: PoolSnapshot,
}

pub struct Runner {
    scenario: Scenario,
    config: PoolConfig,
    clock: Arc<NullClock>,
    stake_token: Arc<NullToken>,
    reward_token: Arc<NullToken>,
    service: SimService,
    accounts: BTreeSet<AccountId>,
}

impl Runner {
    pub fn new(scenario: Scenario, config: PoolConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let clock = Arc::new(NullClock::with_block_time(
            scenario.start,
            scenario.block_time_secs,
        ));
        let stake_token = Arc::new(NullToken::new(&scenario.stake_asset));
        let reward_token = if scenario.shares_asset() {
            Arc::clone(&stake_token)
        } else {
            Arc::new(NullToken::new(&scenario.reward_asset))
        };
        let pool = StakingPool::new(
            config.clone(),
            Arc::clone(&clock),
            Arc::clone(&stake_token),
            Arc::clone(&reward_token),
        );

        let mut accounts = BTreeSet::new();
        for balance in &scenario.balances {
            let account = AccountId::new(balance.account.as_str());
            let amount = scenario.scale(balance.stake)?;
            stake_token.mint(&account, amount);
            stake_token.approve(&account, &config.pool_account, amount);
            accounts.insert(account);
        }

        Ok(Self {
            scenario,
            config,
            clock,
            stake_token,
            reward_token,
            service: StakingService::new(pool),
            accounts,
        })
    }

    /// Replay every step. Rejected operations are logged and counted; only
    /// scenario errors (bad amounts) and fatal engine errors stop the run.
    pub fn run(mut self) -> anyhow::Result<Outcome> {
        let steps = std::mem::take(&mut self.scenario.steps);
        let mut reports = Vec::new();
        let mut rejected_steps = 0;

        info!(
            name = %self.scenario.name,
            steps = steps.len(),
            accounts = self.accounts.len(),
            "running scenario"
        );

        for (index, step) in steps.iter().enumerate() {
            match self.apply(step) {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {}
                Err(err) => {
                    if let Some(engine) = err.downcast_ref::<RewardsError>() {
                        if engine.is_fatal() {
                            return Err(err.context(format!("step {index}")));
                        }
                        warn!(step = index, error = %engine, "step rejected");
                        rejected_steps += 1;
                        continue;
                    }
                    return Err(err.context(format!("step {index}")));
                }
            }
        }

        reports.push(self.report()?);
        Ok(Outcome {
            reports,
            rejected_steps,
            stats: self.service.stats(),
            snapshot: self.service.snapshot()?,
        })
    }

    fn apply(&mut self, step: &Step) -> anyhow::Result<Option<Report>> {
        match step {
            Step::Advance { secs } => self.clock.advance(*secs),
            Step::AdvanceBlocks { blocks } => self.clock.advance_blocks(*blocks),
            Step::Stake { account, amount } => {
                let amount = self.scenario.scale(*amount)?;
                let account = self.track(account);
                self.service.stake(&account, amount)?;
            }
            Step::Withdraw { account, amount } => {
                let amount = self.scenario.scale(*amount)?;
                let account = self.track(account);
                self.service.withdraw(&account, amount)?;
            }
            Step::Claim { account } => {
                let account = self.track(account);
                let paid = self.service.claim(&account)?;
                info!(%account, paid, "claim");
            }
            Step::Exit { account } => {
                let account = self.track(account);
                let paid = self.service.exit(&account)?;
                info!(%account, paid, "exit");
            }
            Step::Fund {
                amount,
                duration_secs,
                caller,
            } => {
                let amount = self.scenario.scale(*amount)?;
                let caller = caller
                    .as_deref()
                    .map(AccountId::new)
                    .unwrap_or_else(|| self.config.funding_authority.clone());
                self.reward_token.mint(&self.config.pool_account, amount);
                self.service.fund(&caller, amount, *duration_secs)?;
            }
            Step::FailTransfers { count } => {
                self.stake_token.fail_next_transfers(*count);
                if !self.scenario.shares_asset() {
                    self.reward_token.fail_next_transfers(*count);
                }
            }
            Step::Report => return Ok(Some(self.report()?)),
        }
        Ok(None)
    }

    fn track(&mut self, name: &str) -> AccountId {
        let account = AccountId::new(name);
        self.accounts.insert(account.clone());
        account
    }

    fn report(&self) -> anyhow::Result<Report> {
        let accounts = &self.accounts;
        let elapsed_secs = Timestamp::new(self.scenario.start).elapsed_since(self.clock.now());
        self.service
            .with_pool(|pool| {
                let mut rows = Vec::with_capacity(accounts.len());
                for account in accounts {
                    rows.push(AccountRow {
                        account: account.clone(),
                        staked: pool.balance_of(account),
                        earned: pool.earned(account)?,
                        claimed: pool.account(account).map_or(0, |s| s.total_claimed),
                    });
                }
                let period = match pool.period_status() {
                    PeriodStatus::Unfunded => "unfunded".to_string(),
                    PeriodStatus::Active { finish } => format!(
                        "active, {} left",
                        format_duration(finish.as_secs().saturating_sub(pool.now().as_secs()))
                    ),
                    PeriodStatus::Expired { finish } => format!("expired at {finish}"),
                };
                Ok(Report {
                    elapsed_secs,
                    total_staked: pool.total_staked(),
                    reward_rate: pool.reward_rate(),
                    period,
                    accounts: rows,
                })
            })
            .context("building report")
    }
}

/// Summarise a saved snapshot: global counters, then one line per account.
pub fn describe_snapshot(snapshot: &PoolSnapshot) -> String {
    let g = &snapshot.global;
    let mut out = format!(
        "snapshot v{} taken at {}\n  total_staked={} rate={}/s period_finish={}\n  funded={} released={} claimed={}\n",
        snapshot.version,
        snapshot.taken_at,
        g.total_staked,
        g.reward_rate,
        g.period_finish,
        g.total_funded,
        g.total_released,
        g.total_claimed,
    );
    for entry in &snapshot.accounts {
        out.push_str(&format!(
            "  {:<20} staked={} owed={} claimed={}\n",
            entry.account.as_str(),
            entry.state.staked_balance,
            entry.state.rewards_owed,
            entry.state.total_claimed,
        ));
    }
    out
}
