//! Forecast output: one dated point-and-interval row per forecast date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Point estimate with its prediction interval for one date.
///
/// Invariant: `lower <= point <= upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastRow {
    pub fn is_ordered(&self) -> bool {
        self.lower <= self.point && self.point <= self.upper
    }
}

/// Forecast covering the training span plus a future horizon.
///
/// Rows are sorted by date with no duplicates. The first `history_len` rows
/// cover the training dates; the remaining `horizon` rows are future dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    item: String,
    rows: Vec<ForecastRow>,
    history_len: usize,
    horizon: usize,
}

impl Forecast {
    pub fn new(item: impl Into<String>, rows: Vec<ForecastRow>, history_len: usize) -> Self {
        let history_len = history_len.min(rows.len());
        let horizon = rows.len() - history_len;
        Self {
            item: item.into(),
            rows,
            history_len,
            horizon,
        }
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn history_rows(&self) -> &[ForecastRow] {
        &self.rows[..self.history_len]
    }

    pub fn future_rows(&self) -> &[ForecastRow] {
        &self.rows[self.history_len..]
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Row for an exact date.
    pub fn row_for(&self, date: NaiveDate) -> Option<&ForecastRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Last `n` rows (the window a forecast table view shows).
    pub fn tail(&self, n: usize) -> &[ForecastRow] {
        let n = n.min(self.rows.len());
        &self.rows[self.rows.len() - n..]
    }
}
