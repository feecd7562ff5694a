//! # Savings Goals

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{FinanceError, FinanceResult};
use crate::auth::UserId;

/// A savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: f64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    /// New goal with nothing saved yet
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        target_amount: f64,
        deadline: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> FinanceResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FinanceError::EmptyGoalName);
        }
        super::expense::validate_amount(target_amount)?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            target_amount,
            current_amount: 0.0,
            deadline,
            created_at: now,
        })
    }

    /// Percentage saved, clamped to [0, 100]
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).clamp(0.0, 100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.target_amount > 0.0 && self.current_amount >= self.target_amount
    }

    /// True once `today` is past the deadline and the goal is not met
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.deadline.is_some_and(|d| d < today) && !self.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(target: f64, current: f64) -> SavingsGoal {
        let mut goal =
            SavingsGoal::new(UserId::random(), "Bike", target.max(1.0), None, Utc::now()).unwrap();
        goal.target_amount = target;
        goal.current_amount = current;
        goal
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(goal(200.0, 50.0).progress_percent(), 25.0);
        assert_eq!(goal(200.0, 500.0).progress_percent(), 100.0);
        assert_eq!(goal(0.0, 50.0).progress_percent(), 0.0);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let user = UserId::random();
        assert_eq!(
            SavingsGoal::new(user, "  ", 10.0, None, Utc::now()),
            Err(FinanceError::EmptyGoalName)
        );
        assert!(SavingsGoal::new(user, "Trip", 0.0, None, Utc::now()).is_err());
    }

    #[test]
    fn test_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut g = goal(100.0, 10.0);
        assert!(!g.is_overdue(today));

        g.deadline = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert!(g.is_overdue(today));

        g.current_amount = 100.0;
        assert!(!g.is_overdue(today));
    }
}
