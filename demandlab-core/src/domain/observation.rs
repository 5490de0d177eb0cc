//! Input rows and validated observations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the input table after header resolution.
///
/// Date and quantity stay optional here: absent cells are legal at load time
/// and only get dropped when a series is cleaned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub item: String,
    pub date: Option<NaiveDate>,
    pub quantity: Option<f64>,
    /// Columns the pipeline does not use, keyed by their original header.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub passthrough: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(item: impl Into<String>, date: Option<NaiveDate>, quantity: Option<f64>) -> Self {
        Self {
            item: item.into(),
            date,
            quantity,
            passthrough: BTreeMap::new(),
        }
    }

    /// The (date, quantity) pair, if both are present and the quantity is finite.
    pub fn observation(&self) -> Option<Observation> {
        match (self.date, self.quantity) {
            (Some(date), Some(quantity)) if quantity.is_finite() => {
                Some(Observation { date, quantity })
            }
            _ => None,
        }
    }
}

/// A single dated quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub quantity: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, quantity: f64) -> Self {
        Self { date, quantity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn observation_requires_both_fields() {
        assert!(RawRow::new("A", Some(day(1)), Some(3.0)).observation().is_some());
        assert!(RawRow::new("A", None, Some(3.0)).observation().is_none());
        assert!(RawRow::new("A", Some(day(1)), None).observation().is_none());
    }

    #[test]
    fn non_finite_quantity_is_not_an_observation() {
        assert!(RawRow::new("A", Some(day(1)), Some(f64::NAN)).observation().is_none());
        assert!(RawRow::new("A", Some(day(1)), Some(f64::INFINITY))
            .observation()
            .is_none());
    }
}
