//! Synthetic sales sample used as the built-in fallback table.
//!
//! Each item gets a deterministic daily series (level + linear drift + weekly
//! profile + multiplicative noise) seeded from its identifier, so the same
//! `SampleSpec` always produces byte-identical output. Sample data is tagged with
//! `DataOrigin::Synthetic` when loaded.

use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::ingest::{parse_csv, DataOrigin, RawTable};
use crate::domain::RawRow;
use crate::error::PipelineError;

/// Relative demand by weekday, Monday first.
const WEEKLY_PROFILE: [f64; 7] = [0.92, 0.95, 0.97, 1.0, 1.08, 1.22, 0.86];

/// Shape of the generated sample.
#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub items: Vec<String>,
    pub start: NaiveDate,
    pub days: usize,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            items: vec!["SKU-001".into(), "SKU-002".into(), "SKU-003".into()],
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            days: 365,
        }
    }
}

/// Generate sample rows for every item in `spec`, item-major, date ascending.
pub fn generate_rows(spec: &SampleSpec) -> Vec<RawRow> {
    let mut rows = Vec::with_capacity(spec.items.len() * spec.days);
    for item in &spec.items {
        let seed: [u8; 32] = *blake3::hash(item.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let level: f64 = rng.gen_range(20.0..80.0);
        let drift: f64 = rng.gen_range(-0.02..0.08);

        for offset in 0..spec.days {
            let date = spec.start + Duration::days(offset as i64);
            let weekday = date.weekday().num_days_from_monday() as usize;
            let noise: f64 = rng.gen_range(-0.15..0.15);
            let qty = (level + drift * offset as f64) * WEEKLY_PROFILE[weekday] * (1.0 + noise);
            rows.push(RawRow::new(item.clone(), Some(date), Some(qty.max(0.0).round())));
        }
    }
    rows
}

/// Serialize sample rows with the dashboard's headers (`SKU, Date, Sales_Qty`).
pub fn to_csv_bytes(rows: &[RawRow]) -> Result<Vec<u8>, PipelineError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["SKU", "Date", "Sales_Qty"])?;
    for row in rows {
        wtr.write_record([
            row.item.clone(),
            row.date.map(|d| d.to_string()).unwrap_or_default(),
            row.quantity.map(|q| q.to_string()).unwrap_or_default(),
        ])?;
    }
    wtr.into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))
}

/// Build a loaded table straight from a sample spec.
pub fn sample_table(spec: &SampleSpec) -> Result<RawTable, PipelineError> {
    let bytes = to_csv_bytes(&generate_rows(spec))?;
    parse_csv(&bytes, DataOrigin::Synthetic)
}
