//! # XP Rewards
//!
//! Fixed rewards granted by client actions. Amounts can be overridden
//! through a [`RewardTable`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Actions that grant XP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpReward {
    /// Logging an expense
    LogExpense,
    /// Completing a daily challenge
    CompleteChallenge,
    /// Creating a first budget
    CreateBudget,
}

impl XpReward {
    /// Default XP for this reward
    pub fn default_amount(&self) -> u64 {
        match self {
            XpReward::LogExpense => 10,
            XpReward::CompleteChallenge => 50,
            XpReward::CreateBudget => 100,
        }
    }

    /// Reason shown with the gain notification
    pub fn reason(&self) -> &'static str {
        match self {
            XpReward::LogExpense => "Logging an expense",
            XpReward::CompleteChallenge => "Completing a challenge",
            XpReward::CreateBudget => "Creating a budget",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            XpReward::LogExpense => "log-expense",
            XpReward::CompleteChallenge => "complete-challenge",
            XpReward::CreateBudget => "create-budget",
        }
    }
}

impl fmt::Display for XpReward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for XpReward {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log-expense" => Ok(XpReward::LogExpense),
            "complete-challenge" => Ok(XpReward::CompleteChallenge),
            "create-budget" => Ok(XpReward::CreateBudget),
            other => Err(format!("unknown reward '{}'", other)),
        }
    }
}

/// XP amounts per reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTable {
    #[serde(default = "default_log_expense")]
    pub log_expense: u64,
    #[serde(default = "default_complete_challenge")]
    pub complete_challenge: u64,
    #[serde(default = "default_create_budget")]
    pub create_budget: u64,
}

fn default_log_expense() -> u64 {
    XpReward::LogExpense.default_amount()
}
fn default_complete_challenge() -> u64 {
    XpReward::CompleteChallenge.default_amount()
}
fn default_create_budget() -> u64 {
    XpReward::CreateBudget.default_amount()
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            log_expense: default_log_expense(),
            complete_challenge: default_complete_challenge(),
            create_budget: default_create_budget(),
        }
    }
}

impl RewardTable {
    /// XP granted for `reward`
    pub fn amount(&self, reward: XpReward) -> u64 {
        match reward {
            XpReward::LogExpense => self.log_expense,
            XpReward::CompleteChallenge => self.complete_challenge,
            XpReward::CreateBudget => self.create_budget,
        }
    }

    /// First reward configured with zero XP, if any
    pub fn zero_reward(&self) -> Option<XpReward> {
        [
            XpReward::LogExpense,
            XpReward::CompleteChallenge,
            XpReward::CreateBudget,
        ]
        .into_iter()
        .find(|r| self.amount(*r) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_amounts() {
        let table = RewardTable::default();
        assert_eq!(table.amount(XpReward::LogExpense), 10);
        assert_eq!(table.amount(XpReward::CompleteChallenge), 50);
        assert_eq!(table.amount(XpReward::CreateBudget), 100);
        assert_eq!(table.zero_reward(), None);
    }

    #[test]
    fn test_partial_table_from_json() {
        let table: RewardTable = serde_json::from_str(r#"{"log_expense": 25}"#).unwrap();
        assert_eq!(table.log_expense, 25);
        assert_eq!(table.create_budget, 100);
    }

    #[test]
    fn test_reward_parse() {
        assert_eq!("log-expense".parse::<XpReward>().unwrap(), XpReward::LogExpense);
        assert_eq!(XpReward::CreateBudget.to_string(), "create-budget");
        assert!("sleep".parse::<XpReward>().is_err());
    }
}
