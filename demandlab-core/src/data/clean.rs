//! SeriesCleaner: projects one item's rows to a strict date/quantity series.

use tracing::debug;

use crate::data::ingest::GroupedRows;
use crate::domain::{ItemSeries, Observation, RawRow};
use crate::error::PipelineError;

/// Outcome of cleaning one item's rows.
#[derive(Debug, Clone)]
pub struct CleanedSeries {
    pub series: ItemSeries,
    /// Rows dropped for a missing date or quantity.
    pub dropped_rows: usize,
}

pub struct SeriesCleaner;

impl SeriesCleaner {
    /// Keep only rows with both a date and a finite quantity, ordered by date.
    ///
    /// Fails with `EmptySeries` when nothing survives; callers must not move
    /// on to splitting or training in that case.
    pub fn clean(item: &str, rows: &[RawRow]) -> Result<CleanedSeries, PipelineError> {
        let observations: Vec<Observation> = rows
            .iter()
            .filter(|r| r.item == item)
            .filter_map(RawRow::observation)
            .collect();

        let considered = rows.iter().filter(|r| r.item == item).count();
        let dropped_rows = considered - observations.len();

        if observations.is_empty() {
            return Err(PipelineError::EmptySeries {
                item: item.to_string(),
            });
        }

        let series = ItemSeries::new(item, observations);
        debug!(item, rows = series.len(), dropped_rows, "cleaned series");

        Ok(CleanedSeries {
            series,
            dropped_rows,
        })
    }

    /// Clean the group of `item` from a grouped table.
    pub fn clean_item(grouped: &GroupedRows, item: &str) -> Result<CleanedSeries, PipelineError> {
        Self::clean(item, grouped.rows_for(item)?)
    }
}
