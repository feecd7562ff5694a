//! # Expenses

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{FinanceError, FinanceResult};
use crate::auth::UserId;

/// Longest accepted description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Expense category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Stored expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: UserId,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Expense as entered by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

pub(crate) fn validate_amount(amount: f64) -> FinanceResult<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(FinanceError::InvalidAmount(amount))
    }
}

fn validate_description(description: Option<&str>) -> FinanceResult<()> {
    let len = description.map_or(0, |d| d.chars().count());
    if len > MAX_DESCRIPTION_LEN {
        return Err(FinanceError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

impl NewExpense {
    pub fn validate(&self) -> FinanceResult<()> {
        validate_amount(self.amount)?;
        validate_description(self.description.as_deref())
    }
}

impl Expense {
    /// Validate `new` and stamp it with an ID and creation time
    pub fn from_new(user_id: UserId, new: NewExpense, now: DateTime<Utc>) -> FinanceResult<Self> {
        new.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            category_id: new.category_id,
            amount: new.amount,
            description: new.description.filter(|d| !d.trim().is_empty()),
            date: new.date,
            created_at: now,
        })
    }
}

impl ExpenseUpdate {
    /// Apply to `expense`. Nothing is changed if validation fails.
    pub fn apply(&self, expense: &mut Expense) -> FinanceResult<()> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        validate_description(self.description.as_deref())?;

        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(category_id) = self.category_id {
            expense.category_id = Some(category_id);
        }
        if let Some(description) = &self.description {
            expense.description = Some(description.clone());
        }
        if let Some(date) = self.date {
            expense.date = date;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_expense(amount: f64) -> NewExpense {
        NewExpense {
            category_id: None,
            amount,
            description: Some("Groceries".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
        }
    }

    #[test]
    fn test_validate_amount() {
        assert!(new_expense(12.5).validate().is_ok());
        assert_eq!(new_expense(0.0).validate(), Err(FinanceError::InvalidAmount(0.0)));
        assert!(new_expense(-3.0).validate().is_err());
        assert!(new_expense(f64::NAN).validate().is_err());
        assert!(new_expense(f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_validate_description_length() {
        let mut expense = new_expense(1.0);
        expense.description = Some("x".repeat(MAX_DESCRIPTION_LEN + 1));
        assert_eq!(
            expense.validate(),
            Err(FinanceError::DescriptionTooLong {
                len: 501,
                max: MAX_DESCRIPTION_LEN
            })
        );
    }

    #[test]
    fn test_from_new_drops_blank_description() {
        let user = UserId::random();
        let mut new = new_expense(4.0);
        new.description = Some("   ".to_string());

        let expense = Expense::from_new(user, new, Utc::now()).unwrap();
        assert_eq!(expense.user_id, user);
        assert!(expense.description.is_none());
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let mut expense = Expense::from_new(UserId::random(), new_expense(10.0), Utc::now()).unwrap();

        let bad = ExpenseUpdate {
            amount: Some(-1.0),
            description: Some("Rent".to_string()),
            ..ExpenseUpdate::default()
        };
        assert!(bad.apply(&mut expense).is_err());
        assert_eq!(expense.amount, 10.0);
        assert_eq!(expense.description.as_deref(), Some("Groceries"));

        let good = ExpenseUpdate {
            amount: Some(800.0),
            description: Some("Rent".to_string()),
            ..ExpenseUpdate::default()
        };
        good.apply(&mut expense).unwrap();
        assert_eq!(expense.amount, 800.0);
        assert_eq!(expense.description.as_deref(), Some("Rent"));
    }
}
