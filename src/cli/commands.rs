//! CLI command implementations
//!
//! Each command loads the configuration, applies the log level and then
//! does one thing. Results are written to stdout as a single JSON line.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::UserId;
use crate::finance::{
    average_monthly_spending, average_savings, filter_expenses, savings_change, savings_trend,
    spending_by_category, spending_by_month, Category, Expense, SavingsGoal, TimeRange,
};
use crate::leveling::XpReward;
use crate::notify::LogNotifier;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::profile::{FileProfileStore, Profile, ProfileError};
use crate::progression::{ProgressionError, XpTracker};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_response};

/// Records accepted by `stats`
#[derive(Debug, Default, Deserialize)]
pub struct StatsInput {
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub savings_goals: Vec<SavingsGoal>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let data = match cmd {
        Command::Init {
            config,
            username,
            user,
        } => init(&config, &username, user)?,
        Command::Level { config, user } => level(&config, user)?,
        Command::Gain {
            config,
            user,
            amount,
            reward,
            reason,
        } => gain(&config, user, amount, reward, &reason)?,
        Command::Stats { range, today } => {
            let input: StatsInput = serde_json::from_value(read_request()?)
                .map_err(|e| CliError::invalid_input(format!("Invalid records: {}", e)))?;
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            stats(&input, range, today)?
        }
    };
    write_response(data)
}

/// Create the profile store if needed and add a profile
pub fn init(config_path: &Path, username: &str, user: Option<UserId>) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let path = config.store_path();

    let mut store = if path.exists() {
        FileProfileStore::open(path).map_err(store_error)?
    } else {
        let store = FileProfileStore::create(path).map_err(store_error)?;
        log_event_with_fields(
            Event::StoreInitialized,
            &[("path", &path.display().to_string())],
        );
        store
    };

    let user_id = user.unwrap_or_else(UserId::random);
    if !store
        .ensure_profile(Profile::new(user_id, username))
        .map_err(store_error)?
    {
        return Err(CliError::already_initialized(format!(
            "Profile {} already exists",
            user_id
        )));
    }

    Ok(json!({"initialized": true, "user_id": user_id}))
}

/// Current XP, level and progress
pub fn level(config_path: &Path, user: UserId) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let tracker = open_tracker(&config, user)?;
    Ok(json!(tracker.snapshot()))
}

/// Add XP, either an explicit amount or a configured reward
pub fn gain(
    config_path: &Path,
    user: UserId,
    amount: Option<u64>,
    reward: Option<XpReward>,
    reason: &str,
) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let mut tracker = open_tracker(&config, user)?;

    let result = match (amount, reward) {
        (Some(amount), _) => tracker.add_xp(amount, reason),
        (None, Some(reward)) => tracker.award(reward, &config.rewards),
        (None, None) => {
            return Err(CliError::invalid_input("Either --amount or --reward is required"))
        }
    };

    let gain = result.map_err(|e| match e {
        ProgressionError::Leveling(e) => CliError::invalid_input(e.to_string()),
        other => CliError::gain_failed(other.to_string()),
    })?;

    Ok(json!({
        "gain": gain,
        "level": tracker.snapshot(),
    }))
}

/// Spending and savings statistics over `range`
pub fn stats(input: &StatsInput, range: TimeRange, today: NaiveDate) -> CliResult<Value> {
    if let Some(bad) = input
        .expenses
        .iter()
        .find(|e| !(e.amount.is_finite() && e.amount > 0.0))
    {
        return Err(CliError::invalid_input(format!(
            "Expense {} has invalid amount {}",
            bad.id, bad.amount
        )));
    }

    let categories: HashMap<_, _> = input
        .categories
        .iter()
        .map(|c| (c.id, c.name.clone()))
        .collect();

    let expenses = filter_expenses(&input.expenses, range, today);
    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    let savings = savings_trend(&input.savings_goals, range, today);

    Ok(json!({
        "range": range.as_str(),
        "total_spent": total,
        "average_monthly": average_monthly_spending(expenses.iter().copied()),
        "by_month": spending_by_month(expenses.iter().copied()),
        "by_category": spending_by_category(expenses.iter().copied(), &categories),
        "savings": savings,
        "average_savings": average_savings(&savings),
        "savings_change": savings_change(&savings),
    }))
}

fn load_config(path: &Path) -> CliResult<Config> {
    let config = Config::load(path)?;
    Logger::set_min_severity(config.log_level);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", &path.display().to_string())],
    );
    Ok(config)
}

fn open_tracker(config: &Config, user: UserId) -> CliResult<XpTracker<FileProfileStore>> {
    let store = FileProfileStore::open(config.store_path()).map_err(|_| {
        CliError::not_initialized("Profile store not found. Run 'finquest init' first.")
    })?;

    XpTracker::load(user, store, Arc::new(LogNotifier)).map_err(|e| match e {
        ProgressionError::Load(ProfileError::NotFound(id)) => {
            CliError::not_initialized(format!("No profile {}. Run 'finquest init' first.", id))
        }
        other => CliError::io_error(other.to_string()),
    })
}

fn store_error(e: ProfileError) -> CliError {
    CliError::io_error(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use crate::profile::ProfileStore;
    use std::fs;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_config(temp_dir: &TempDir) -> std::path::PathBuf {
        let config_path = temp_dir.path().join("finquest.json");
        let store = temp_dir.path().join("profiles.json");

        let config = json!({
            "profile_store": store.to_string_lossy(),
            "log_level": "error"
        });

        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_init_creates_store_and_profile() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        let user = UserId::random();

        let out = init(&config_path, "ana", Some(user)).unwrap();
        assert_eq!(out["user_id"], json!(user.to_string()));

        let store = FileProfileStore::open(&temp_dir.path().join("profiles.json")).unwrap();
        assert_eq!(store.read_profile_xp(user).unwrap(), 0);
    }

    #[test]
    fn test_init_refuses_existing_profile() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        let user = UserId::random();

        init(&config_path, "ana", Some(user)).unwrap();
        init(&config_path, "ben", None).unwrap();

        let result = init(&config_path, "ana", Some(user));
        assert_eq!(
            result.unwrap_err().code(),
            &CliErrorCode::AlreadyInitialized
        );
    }

    #[test]
    fn test_level_requires_init() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);

        let result = level(&config_path, UserId::random());
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::NotInitialized);

        init(&config_path, "ana", None).unwrap();
        let result = level(&config_path, UserId::random());
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::NotInitialized);
    }

    #[test]
    fn test_gain_amount_and_reward() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        let user = UserId::random();
        init(&config_path, "ana", Some(user)).unwrap();

        let out = gain(&config_path, user, Some(90), None, "").unwrap();
        assert_eq!(out["level"]["level"], json!(1));

        let out = gain(&config_path, user, None, Some(XpReward::LogExpense), "").unwrap();
        assert_eq!(out["gain"]["leveled_up"], json!(true));
        assert_eq!(out["level"]["xp"], json!(100));

        let out = level(&config_path, user).unwrap();
        assert_eq!(out["level"], json!(2));
        assert_eq!(out["xp_for_next_level"], json!(400));
    }

    #[test]
    fn test_gain_zero_is_invalid_input() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir);
        let user = UserId::random();
        init(&config_path, "ana", Some(user)).unwrap();

        let result = gain(&config_path, user, Some(0), None, "");
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::InvalidInput);
    }

    #[test]
    fn test_stats_output() {
        let user = UserId::random();
        let expense = |amount: f64, on: NaiveDate| Expense {
            id: Uuid::new_v4(),
            user_id: user,
            category_id: None,
            amount,
            description: Some("Food".to_string()),
            date: on,
            created_at: Utc::now(),
        };
        let input = StatsInput {
            expenses: vec![
                expense(40.0, date(2024, 4, 2)),
                expense(60.0, date(2024, 5, 9)),
                expense(500.0, date(2023, 1, 1)),
            ],
            ..StatsInput::default()
        };

        let out = stats(&input, TimeRange::SixMonths, date(2024, 6, 1)).unwrap();
        assert_eq!(out["total_spent"], json!(100.0));
        assert_eq!(out["average_monthly"], json!(50.0));
        assert_eq!(out["by_category"][0]["name"], json!("Food"));
        assert_eq!(out["by_month"].as_array().unwrap().len(), 12);
        assert_eq!(out["savings"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_stats_rejects_bad_amount() {
        let input: StatsInput = serde_json::from_value(json!({
            "expenses": [{
                "id": Uuid::new_v4(),
                "user_id": UserId::random(),
                "amount": -5.0,
                "date": "2024-01-01",
                "created_at": "2024-01-01T00:00:00Z"
            }]
        }))
        .unwrap();

        let result = stats(&input, TimeRange::All, date(2024, 2, 1));
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::InvalidInput);
    }
}
