//! # Spending and Savings Statistics
//!
//! Aggregations behind the stats views. Every function takes `today`
//! explicitly so results are reproducible.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use super::errors::FinanceError;
use super::expense::Expense;
use super::savings::SavingsGoal;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const OTHER_CATEGORY: &str = "Other";

/// Window the stats are computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    SixMonths,
    OneYear,
    All,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::SixMonths => "6months",
            TimeRange::OneYear => "1year",
            TimeRange::All => "all",
        }
    }

    /// First day included, or `None` for no lower bound
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeRange::SixMonths => today.checked_sub_months(Months::new(6)),
            TimeRange::OneYear => today.checked_sub_months(Months::new(12)),
            TimeRange::All => None,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "6months" => Ok(TimeRange::SixMonths),
            "1year" => Ok(TimeRange::OneYear),
            "all" => Ok(TimeRange::All),
            other => Err(FinanceError::UnknownTimeRange(other.to_string())),
        }
    }
}

/// Spending in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub name: &'static str,
    pub amount: f64,
}

/// Spending under one category name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub amount: f64,
}

/// Savings against goals at the end of one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsPoint {
    pub label: String,
    pub savings: f64,
    pub goal: f64,
}

/// Expenses dated within `range`
pub fn filter_expenses(expenses: &[Expense], range: TimeRange, today: NaiveDate) -> Vec<&Expense> {
    match range.start(today) {
        Some(start) => expenses.iter().filter(|e| e.date >= start).collect(),
        None => expenses.iter().collect(),
    }
}

/// Totals per calendar month, Jan..Dec. Years are folded together.
pub fn spending_by_month<'a, I>(expenses: I) -> Vec<MonthTotal>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut totals = [0.0_f64; 12];
    for expense in expenses {
        totals[expense.date.month0() as usize] += expense.amount;
    }

    MONTH_NAMES
        .into_iter()
        .zip(totals)
        .map(|(name, amount)| MonthTotal { name, amount })
        .collect()
}

/// Totals per category, largest first.
///
/// The name comes from `categories`, else the expense description, else
/// "Other".
pub fn spending_by_category<'a, I>(
    expenses: I,
    categories: &HashMap<Uuid, String>,
) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut totals: HashMap<String, f64> = HashMap::new();
    for expense in expenses {
        let name = expense
            .category_id
            .and_then(|id| categories.get(&id))
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .or(expense.description.as_deref().filter(|d| !d.is_empty()))
            .unwrap_or(OTHER_CATEGORY);
        *totals.entry(name.to_string()).or_insert(0.0) += expense.amount;
    }

    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(name, amount)| CategoryTotal { name, amount })
        .collect();
    totals.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    totals
}

/// Total divided by the number of distinct months with spending
pub fn average_monthly_spending<'a, I>(expenses: I) -> f64
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut months = BTreeSet::new();
    let mut total = 0.0;
    for expense in expenses {
        months.insert((expense.date.year(), expense.date.month()));
        total += expense.amount;
    }
    total / months.len().max(1) as f64
}

/// One point per month from the range start to `today`
pub fn savings_trend(goals: &[SavingsGoal], range: TimeRange, today: NaiveDate) -> Vec<SavingsPoint> {
    let start = match range.start(today) {
        Some(start) => start,
        None => goals
            .iter()
            .map(|g| g.created_at.date_naive())
            .min()
            .unwrap_or(today)
            .min(today),
    };

    let mut points = Vec::new();
    let mut month = first_of_month(start);
    while let Some(current) = month.filter(|m| *m <= today) {
        let next = current.checked_add_months(Months::new(1));
        let point = next
            .and_then(|n| n.pred_opt())
            .map_or(today, |end| end.min(today));

        let created: Vec<&SavingsGoal> = goals
            .iter()
            .filter(|g| g.created_at.date_naive() <= point)
            .collect();
        let savings = created.iter().map(|g| g.current_amount).sum();
        let goal = created
            .iter()
            .filter(|g| g.deadline.map_or(true, |d| d >= point))
            .map(|g| g.target_amount)
            .sum();

        points.push(SavingsPoint {
            label: month_label(current, today),
            savings,
            goal,
        });
        month = next;
    }
    points
}

/// Mean savings over all points, 0 when empty
pub fn average_savings(points: &[SavingsPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.savings).sum::<f64>() / points.len() as f64
}

/// Percent change of the later half of the points against the earlier half.
///
/// The later half takes the middle point when the count is odd. Fewer than
/// two points give 0; an earlier half averaging 0 gives 100.
pub fn savings_change(points: &[SavingsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let previous = average_savings(&points[..points.len() / 2]);
    let current = average_savings(&points[points.len() / 2..]);
    if previous == 0.0 {
        return 100.0;
    }
    (current - previous) / previous * 100.0
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

fn month_label(month: NaiveDate, today: NaiveDate) -> String {
    let name = MONTH_NAMES[month.month0() as usize];
    if month.year() == today.year() {
        name.to_string()
    } else {
        format!("{} {}", name, month.year())
    }
}
