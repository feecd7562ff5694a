//! CLI argument definitions using clap
//!
//! Commands:
//! - finquest init --config <path> --username <name>
//! - finquest level --config <path> --user <id>
//! - finquest gain --config <path> --user <id> (--amount <n> | --reward <kind>)
//! - finquest stats --range <range> (records as JSON on stdin)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::auth::UserId;
use crate::finance::TimeRange;
use crate::leveling::XpReward;

/// finquest - leveling and statistics for a gamified finance tracker
#[derive(Parser, Debug)]
#[command(name = "finquest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the profile store and a profile
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./finquest.json")]
        config: PathBuf,

        /// Display name of the new profile
        #[arg(long)]
        username: String,

        /// Profile ID (random if omitted)
        #[arg(long)]
        user: Option<UserId>,
    },

    /// Show XP, level and progress of a profile
    Level {
        /// Path to configuration file
        #[arg(long, default_value = "./finquest.json")]
        config: PathBuf,

        #[arg(long)]
        user: UserId,
    },

    /// Add XP to a profile
    Gain {
        /// Path to configuration file
        #[arg(long, default_value = "./finquest.json")]
        config: PathBuf,

        #[arg(long)]
        user: UserId,

        /// XP to add
        #[arg(long, conflicts_with = "reward", required_unless_present = "reward")]
        amount: Option<u64>,

        /// Fixed reward: log-expense, complete-challenge or create-budget
        #[arg(long)]
        reward: Option<XpReward>,

        /// Reason shown with the notification
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Compute spending and savings statistics from JSON on stdin
    Stats {
        /// 6months, 1year or all
        #[arg(long, default_value = "6months")]
        range: TimeRange,

        /// Reference date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        today: Option<chrono::NaiveDate>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_requires_amount_or_reward() {
        let user = UserId::random().to_string();
        assert!(Cli::try_parse_from(["finquest", "gain", "--user", user.as_str()]).is_err());
        assert!(Cli::try_parse_from([
            "finquest",
            "gain",
            "--user",
            user.as_str(),
            "--amount",
            "5",
            "--reward",
            "log-expense",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "finquest",
            "gain",
            "--user",
            user.as_str(),
            "--reward",
            "create-budget",
        ])
        .unwrap();
        match cli.command {
            Command::Gain { reward, amount, .. } => {
                assert_eq!(reward, Some(XpReward::CreateBudget));
                assert!(amount.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_stats_range_parsing() {
        let cli = Cli::try_parse_from([
            "finquest", "stats", "--range", "all", "--today", "2024-05-01",
        ])
        .unwrap();
        match cli.command {
            Command::Stats { range, today } => {
                assert_eq!(range, TimeRange::All);
                assert_eq!(today, chrono::NaiveDate::from_ymd_opt(2024, 5, 1));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["finquest", "stats", "--range", "week"]).is_err());
    }
}
