//! ItemSeries: the cleaned, chronologically ordered series of one item.

use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::observation::Observation;

/// Ordered (date, quantity) observations for exactly one item.
///
/// Dates are non-decreasing; construction sorts stably so rows sharing a date
/// keep their input order. Index 0 is always the earliest observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSeries {
    item: String,
    observations: Vec<Observation>,
}

impl ItemSeries {
    pub fn new(item: impl Into<String>, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.date);
        Self {
            item: item.into(),
            observations,
        }
    }

    pub fn empty(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            observations: Vec::new(),
        }
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.observations.iter().map(|o| o.date)
    }

    pub fn quantities(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|o| o.quantity)
    }

    /// Distinct dates in ascending order.
    pub fn distinct_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.dates().collect();
        dates.dedup();
        dates
    }

    /// Contiguous sub-series over `range` (clamped to the series bounds).
    pub fn slice(&self, range: Range<usize>) -> ItemSeries {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Self {
            item: self.item.clone(),
            observations: self.observations[start..end].to_vec(),
        }
    }

    /// First `n` observations.
    pub fn head(&self, n: usize) -> &[Observation] {
        &self.observations[..n.min(self.len())]
    }

    /// Last `n` observations.
    pub fn tail(&self, n: usize) -> &[Observation] {
        let n = n.min(self.len());
        &self.observations[self.len() - n..]
    }
}
