//! Scripted scenarios loaded from TOML.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Starting balances and a list of steps to replay against a fresh pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,

    /// Unix seconds at which the clock starts.
    #[serde(default = "default_start")]
    pub start: u64,

    /// Seconds per block for `advance_blocks`.
    #[serde(default = "default_block_time")]
    pub block_time_secs: u64,

    /// Every amount in the file is multiplied by `10^decimals`.
    #[serde(default)]
    pub decimals: u32,

    #[serde(default = "default_stake_asset")]
    pub stake_asset: String,

    /// Set equal to `stake_asset` to simulate a single-token pool.
    #[serde(default = "default_reward_asset")]
    pub reward_asset: String,

    #[serde(default)]
    pub balances: Vec<Balance>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Stake asset minted to an account and approved for the pool before step one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub account: String,
    pub stake: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Advance { secs: u64 },
    AdvanceBlocks { blocks: u64 },
    Stake { account: String, amount: u128 },
    Withdraw { account: String, amount: u128 },
    Claim { account: String },
    Exit { account: String },
    /// Mint `amount` of the reward asset into the pool, then fund as `caller`
    /// (the configured funding authority when omitted).
    Fund {
        amount: u128,
        duration_secs: u64,
        #[serde(default)]
        caller: Option<String>,
    },
    /// Reject the next `count` token transfers on both assets.
    FailTransfers { count: u32 },
    Report,
}

fn default_start() -> u64 {
    1_700_000_000
}

fn default_block_time() -> u64 {
    1
}

fn default_stake_asset() -> String {
    "STK".into()
}

fn default_reward_asset() -> String {
    "RWD".into()
}

impl Scenario {
    pub fn from_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = toml::from_str(s)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.block_time_secs == 0 {
            bail!("block_time_secs must be positive");
        }
        if self.decimals > 30 {
            bail!("decimals {} is too large", self.decimals);
        }
        if self.stake_asset.is_empty() || self.reward_asset.is_empty() {
            bail!("asset symbols must not be empty");
        }
        Ok(())
    }

    /// `amount * 10^decimals`.
    pub fn scale(&self, amount: u128) -> anyhow::Result<u128> {
        10u128
            .checked_pow(self.decimals)
            .and_then(|unit| amount.checked_mul(unit))
            .with_context(|| format!("amount {amount} overflows at {} decimals", self.decimals))
    }

    pub fn shares_asset(&self) -> bool {
        self.stake_asset == self.reward_asset
    }
}
