//! # Finance
//!
//! Expense and savings-goal records with the aggregations shown on the
//! stats views.

mod errors;
mod expense;
mod savings;
mod stats;

pub use errors::{FinanceError, FinanceResult};
pub use expense::{Category, Expense, ExpenseUpdate, NewExpense, MAX_DESCRIPTION_LEN};
pub use savings::SavingsGoal;
pub use stats::{
    average_monthly_spending, average_savings, filter_expenses, savings_change, savings_trend,
    spending_by_category, spending_by_month, CategoryTotal, MonthTotal, SavingsPoint, TimeRange,
};
