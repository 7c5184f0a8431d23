//! stakeline-sim: replay scripted staking scenarios against an in-memory pool.

mod runner;
mod scenario;

use anyhow::Context;
use clap::Parser;
use runner::{describe_snapshot, Runner};
use scenario::Scenario;
use stakeline_rewards::{PoolConfig, PoolSnapshot};
use stakeline_utils::{init_logging, LogFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stakeline-sim", about = "Staking reward engine simulator")]
struct Cli {
    /// Log format: "human" or "json".
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, env = "STAKELINE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STAKELINE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML pool configuration file. CLI flags and env vars
    /// override its settings.
    #[arg(long, env = "STAKELINE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the funding authority account.
    #[arg(long, env = "STAKELINE_FUNDING_AUTHORITY")]
    funding_authority: Option<String>,

    /// Cap the duration of a single funding period, in seconds.
    #[arg(long, env = "STAKELINE_MAX_REWARD_DURATION")]
    max_reward_duration: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a scenario file and print per-account positions.
    Run {
        /// Scenario TOML file.
        #[arg(long)]
        scenario: PathBuf,

        /// Write the final pool snapshot to this file.
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
    },
    /// Validate a saved pool snapshot and print its contents.
    Inspect {
        /// Snapshot file written by `run --snapshot-out`.
        #[arg(long)]
        snapshot: PathBuf,
    },
    /// Print the default pool configuration as TOML.
    DefaultConfig,
}

fn load_config(cli: &Cli) -> anyhow::Result<PoolConfig> {
    let mut config = match cli.config {
        Some(ref path) => PoolConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PoolConfig::default(),
    };
    if let Some(ref format) = cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(ref level) = cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(ref authority) = cli.funding_authority {
        config = config.with_funding_authority(authority.as_str());
    }
    if cli.max_reward_duration.is_some() {
        config.max_reward_duration_secs = cli.max_reward_duration;
    }
    config.validate()?;
    Ok(config)
}

/// Output for subcommands that need neither configuration nor logging.
fn standalone_output(cli: &Cli) -> anyhow::Result<Option<String>> {
    match cli.command {
        Command::DefaultConfig => Ok(Some(PoolConfig::default().to_toml_string()?)),
        _ => Ok(None),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(output) = standalone_output(&cli)? {
        print!("{output}");
        return Ok(());
    }

    let config = load_config(&cli)?;
    let format: LogFormat = config
        .log_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    init_logging(format, &config.log_level)?;

    match cli.command {
        Command::Run {
            scenario,
            snapshot_out,
        } => {
            let scenario = Scenario::from_toml_file(&scenario)?;
            tracing::info!(
                name = %scenario.name,
                funding_authority = %config.funding_authority,
                "loaded scenario"
            );

            let outcome = Runner::new(scenario, config)?.run()?;
            for report in &outcome.reports {
                println!("{report}");
            }
            println!("rejected steps: {}", outcome.rejected_steps);
            for (op, count) in &outcome.stats {
                println!("  {op:<12} {count}");
            }
            if let Some(path) = snapshot_out {
                outcome
                    .snapshot
                    .save_to_file(&path)
                    .with_context(|| format!("writing snapshot {}", path.display()))?;
                tracing::info!(path = %path.display(), "saved pool snapshot");
            }
        }
        Command::Inspect { snapshot } => {
            let loaded = PoolSnapshot::load_from_file(&snapshot)
                .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
            print!("{}", describe_snapshot(&loaded));
        }
        Command::DefaultConfig => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_ignores_broken_settings() {
        let cli = Cli::try_parse_from([
            "stakeline-sim",
            "--log-format",
            "xml",
            "--config",
            "/nonexistent/pool.toml",
            "default-config",
        ])
        .unwrap();
        assert!(load_config(&cli).is_err());

        let output = standalone_output(&cli).unwrap().unwrap();
        assert_eq!(PoolConfig::from_toml_str(&output).unwrap(), PoolConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "stakeline-sim",
            "--funding-authority",
            "treasury",
            "--max-reward-duration",
            "600",
            "inspect",
            "--snapshot",
            "pool.snapshot",
        ])
        .unwrap();
        assert!(standalone_output(&cli).unwrap().is_none());
        let config = load_config(&cli).unwrap();
        assert_eq!(config.funding_authority.as_str(), "treasury");
        assert_eq!(config.max_reward_duration_secs, Some(600));
    }
}
