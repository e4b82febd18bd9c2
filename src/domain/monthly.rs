//! Monthly aggregation: turning a flat transaction list into an ordered
//! calendar-month time series.
//!
//! Series are sparse by design: a month with no qualifying transactions is
//! simply absent, never interpolated with a zero entry.

use chrono::{DateTime, Datelike, FixedOffset};
use std::collections::BTreeMap;

use crate::domain::commands::forecast::MonthlyPoint;
use crate::domain::models::transaction::{Transaction, TransactionType};

/// What each transaction contributes to its month bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationMode {
    /// Raw expense amounts; income entries are ignored.
    Spending,
    /// Income minus expense per month.
    NetSavings,
}

/// `YYYY-MM` bucket key for a transaction date, in the date's own offset.
pub fn month_key(date: &DateTime<FixedOffset>) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// The `YYYY-MM` key of the calendar month following `key`.
pub fn next_month_key(key: &str) -> Result<String, String> {
    let (year, month) = key
        .split_once('-')
        .ok_or_else(|| format!("invalid month key: {}", key))?;
    let year: i32 = year
        .parse()
        .map_err(|_| format!("invalid year in month key: {}", key))?;
    let month: u32 = month
        .parse()
        .map_err(|_| format!("invalid month in month key: {}", key))?;
    if !(1..=12).contains(&month) {
        return Err(format!("month out of range in key: {}", key));
    }
    if month == 12 {
        Ok(format!("{:04}-01", year + 1))
    } else {
        Ok(format!("{:04}-{:02}", year, month + 1))
    }
}

/// Group transactions into calendar-month buckets and return the series in
/// ascending month order.
pub fn monthly_series(transactions: &[Transaction], mode: AggregationMode) -> Vec<MonthlyPoint> {
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for transaction in transactions {
        let contribution = match mode {
            AggregationMode::Spending => match transaction.transaction_type {
                TransactionType::Expense => transaction.amount,
                TransactionType::Income => continue,
            },
            AggregationMode::NetSavings => transaction.signed_amount(),
        };
        *buckets.entry(month_key(&transaction.date)).or_insert(0.0) += contribution;
    }
    buckets
        .into_iter()
        .map(|(month, amount)| MonthlyPoint { month, amount })
        .collect()
}

/// Arithmetic mean of the last `window` points (or all of them when the
/// series is shorter). `None` for an empty series.
pub fn trailing_mean(series: &[MonthlyPoint], window: usize) -> Option<f64> {
    if series.is_empty() || window == 0 {
        return None;
    }
    let tail_start = series.len().saturating_sub(window);
    let tail = &series[tail_start..];
    Some(tail.iter().map(|p| p.amount).sum::<f64>() / tail.len() as f64)
}
