//! SeriesLoader: raw table ingestion and per-item grouping.
//!
//! Source resolution follows a fixed fallback policy:
//! 1. an uploaded table, when one is supplied
//! 2. the fallback sample file, when it exists
//! 3. otherwise fail with `MissingDataSource`
//!
//! Loading is all-or-nothing: a table either parses completely or the load
//! fails, there is no partial result.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::schema::ColumnMap;
use crate::domain::{DatasetHash, RawRow};
use crate::error::PipelineError;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const ABSENT_MARKERS: &[&str] = &["na", "n/a", "nan", "nat", "null", "none"];

/// Where a table comes from.
#[derive(Debug, Clone)]
pub enum TableSource {
    /// A delimited file on disk.
    File(PathBuf),
    /// An in-memory upload.
    Bytes { name: String, bytes: Vec<u8> },
}

impl TableSource {
    pub fn name(&self) -> String {
        match self {
            TableSource::File(path) => path.display().to_string(),
            TableSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// Provenance of a loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataOrigin {
    Upload,
    Fallback,
    Synthetic,
}

/// A fully parsed input table.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
    pub columns: Vec<String>,
    pub dataset_hash: DatasetHash,
    pub origin: DataOrigin,
    /// Rows dropped at load because their item identifier was empty.
    pub skipped_rows: usize,
}

impl RawTable {
    /// Group rows by item identifier.
    pub fn group(&self) -> GroupedRows {
        GroupedRows::from_rows(self.rows.iter().cloned())
    }
}

/// Loads input tables with an optional fallback sample.
#[derive(Debug, Clone, Default)]
pub struct SeriesLoader {
    fallback: Option<PathBuf>,
}

impl SeriesLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `path` when no table is uploaded.
    pub fn with_fallback(path: impl Into<PathBuf>) -> Self {
        Self {
            fallback: Some(path.into()),
        }
    }

    pub fn fallback(&self) -> Option<&Path> {
        self.fallback.as_deref()
    }

    /// Pick the table to load according to the fallback policy.
    pub fn resolve(
        &self,
        upload: Option<TableSource>,
    ) -> Result<(TableSource, DataOrigin), PipelineError> {
        if let Some(source) = upload {
            return Ok((source, DataOrigin::Upload));
        }
        match &self.fallback {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "no upload, using fallback sample");
                Ok((TableSource::File(path.clone()), DataOrigin::Fallback))
            }
            _ => Err(PipelineError::MissingDataSource),
        }
    }

    /// Resolve and read a table.
    pub fn load(&self, upload: Option<TableSource>) -> Result<RawTable, PipelineError> {
        let (source, origin) = self.resolve(upload)?;
        let table = match source {
            TableSource::File(ref path) => {
                let bytes = std::fs::read(path)?;
                parse_csv(&bytes, origin)?
            }
            TableSource::Bytes { ref bytes, .. } => parse_csv(bytes, origin)?,
        };
        info!(
            source = %source.name(),
            rows = table.rows.len(),
            skipped = table.skipped_rows,
            dataset = %table.dataset_hash.short(),
            "loaded table"
        );
        Ok(table)
    }
}

/// Parse a delimited table with a header row.
pub fn parse_csv(bytes: &[u8], origin: DataOrigin) -> Result<RawTable, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    let map = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    let mut skipped_rows = 0;

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        let item = cell(map.item);
        if is_absent(item) {
            skipped_rows += 1;
            continue;
        }

        let date = parse_date_cell(cell(map.date), line)?;
        let quantity = parse_quantity_cell(cell(map.quantity), line)?;

        let passthrough = map
            .passthrough
            .iter()
            .map(|(idx, name)| (name.clone(), cell(*idx).to_string()))
            .collect();

        rows.push(RawRow {
            item: item.to_string(),
            date,
            quantity,
            passthrough,
        });
    }

    if skipped_rows > 0 {
        warn!(skipped_rows, "dropped rows with empty item identifier");
    }

    Ok(RawTable {
        rows,
        columns: headers.iter().map(|h| h.trim().to_string()).collect(),
        dataset_hash: DatasetHash::from_bytes(bytes),
        origin,
        skipped_rows,
    })
}

fn is_absent(cell: &str) -> bool {
    cell.is_empty() || ABSENT_MARKERS.contains(&cell.to_ascii_lowercase().as_str())
}

fn parse_date_cell(cell: &str, line: u64) -> Result<Option<NaiveDate>, PipelineError> {
    if is_absent(cell) {
        return Ok(None);
    }
    parse_date(cell)
        .map(Some)
        .ok_or_else(|| PipelineError::InvalidDate {
            line,
            value: cell.to_string(),
        })
}

fn parse_quantity_cell(cell: &str, line: u64) -> Result<Option<f64>, PipelineError> {
    if is_absent(cell) {
        return Ok(None);
    }
    cell.parse::<f64>()
        .map(Some)
        .map_err(|_| PipelineError::InvalidQuantity {
            line,
            value: cell.to_string(),
        })
}

/// Parse a calendar date, truncating date-time forms to their date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Rows grouped by item identifier, each group sorted by date ascending.
///
/// Rows without a date sort after dated rows; ties keep input order.
#[derive(Debug, Clone, Default)]
pub struct GroupedRows {
    groups: BTreeMap<String, Vec<RawRow>>,
}

impl GroupedRows {
    pub fn from_rows(rows: impl IntoIterator<Item = RawRow>) -> Self {
        let mut groups: BTreeMap<String, Vec<RawRow>> = BTreeMap::new();
        for row in rows {
            groups.entry(row.item.clone()).or_default().push(row);
        }
        for group in groups.values_mut() {
            group.sort_by_key(|r| (r.date.is_none(), r.date));
        }
        Self { groups }
    }

    /// Distinct item identifiers in ascending order.
    pub fn item_ids(&self) -> Vec<&str> {
        self.groups.keys().map(|k| k.as_str()).collect()
    }

    /// First identifier in sorted order, the default selection.
    pub fn first_item(&self) -> Option<&str> {
        self.groups.keys().next().map(|k| k.as_str())
    }

    pub fn rows_for(&self, item: &str) -> Result<&[RawRow], PipelineError> {
        self.groups
            .get(item)
            .map(|rows| rows.as_slice())
            .ok_or_else(|| PipelineError::UnknownItem(item.to_string()))
    }

    pub fn item_count(&self) -> usize {
        self.groups.len()
    }

    pub fn row_count(&self) -> usize {
        self.groups.values().map(|g| g.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const TABLE: &str = "\
 SKU , Date ,Sales_Qty,Store
B,2024-01-02,5,north
A,2024-01-03,7,south
A,2024-01-01,3,south
B,2024-01-01,,north
,2024-01-01,9,west
A,,4,south
";

    #[test]
    fn parses_and_normalizes_headers() {
        let table = parse_csv(TABLE.as_bytes(), DataOrigin::Upload).unwrap();
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.skipped_rows, 1);
        assert_eq!(table.columns, vec!["SKU", "Date", "Sales_Qty", "Store"]);
        assert_eq!(table.rows[0].passthrough["Store"], "north");
        assert_eq!(table.rows[3].quantity, None);
        assert_eq!(table.rows[4].date, None);
    }

    #[test]
    fn groups_sorted_by_item_then_date() {
        let table = parse_csv(TABLE.as_bytes(), DataOrigin::Upload).unwrap();
        let grouped = table.group();
        assert_eq!(grouped.item_ids(), vec!["A", "B"]);
        assert_eq!(grouped.first_item(), Some("A"));

        let a = grouped.rows_for("A").unwrap();
        assert_eq!(a[0].date, Some(d(2024, 1, 1)));
        assert_eq!(a[1].date, Some(d(2024, 1, 3)));
        assert_eq!(a[2].date, None);
        assert_eq!(grouped.row_count(), 5);
    }

    #[test]
    fn unknown_item_is_an_error() {
        let grouped = parse_csv(TABLE.as_bytes(), DataOrigin::Upload).unwrap().group();
        assert!(matches!(
            grouped.rows_for("Z"),
            Err(PipelineError::UnknownItem(_))
        ));
    }

    #[test]
    fn invalid_cells_name_their_line() {
        let bad_date = "Item,Date,Quantity\nA,2024-01-01,1\nA,someday,2\n";
        match parse_csv(bad_date.as_bytes(), DataOrigin::Upload) {
            Err(PipelineError::InvalidDate { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "someday");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }

        let bad_qty = "Item,Date,Quantity\nA,2024-01-01,lots\n";
        assert!(matches!(
            parse_csv(bad_qty.as_bytes(), DataOrigin::Upload),
            Err(PipelineError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn absent_markers_become_none() {
        let table = "Item,Date,Quantity\nA,NaT,NaN\nA,2024-01-01,null\n";
        let parsed = parse_csv(table.as_bytes(), DataOrigin::Upload).unwrap();
        assert_eq!(parsed.rows[0].date, None);
        assert_eq!(parsed.rows[0].quantity, None);
        assert_eq!(parsed.rows[1].quantity, None);
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("2024-02-29"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("2024/02/29"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("02/29/2024"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("29.02.2024"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("2024-02-29 13:45:00"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("2024-02-29T13:45:00"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("2024-02-29T13:45:00+02:00"), Some(d(2024, 2, 29)));
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn missing_required_column_fails() {
        let table = "Item,Day,Quantity\nA,2024-01-01,1\n";
        assert!(matches!(
            parse_csv(table.as_bytes(), DataOrigin::Upload),
            Err(PipelineError::MissingColumn(_))
        ));
    }

    #[test]
    fn resolve_without_upload_or_fallback_fails() {
        let loader = SeriesLoader::new();
        assert!(matches!(
            loader.resolve(None),
            Err(PipelineError::MissingDataSource)
        ));

        let loader = SeriesLoader::with_fallback("/definitely/not/here.csv");
        assert!(matches!(
            loader.load(None),
            Err(PipelineError::MissingDataSource)
        ));
    }

    #[test]
    fn upload_takes_precedence() {
        let loader = SeriesLoader::with_fallback("/definitely/not/here.csv");
        let upload = TableSource::Bytes {
            name: "upload.csv".into(),
            bytes: b"Item,Date,Quantity\nA,2024-01-01,1\n".to_vec(),
        };
        let table = loader.load(Some(upload)).unwrap();
        assert_eq!(table.origin, DataOrigin::Upload);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let a = parse_csv(b"Item,Date,Quantity\nA,2024-01-01,1\n", DataOrigin::Upload).unwrap();
        let b = parse_csv(b"Item,Date,Quantity\nA,2024-01-01,2\n", DataOrigin::Upload).unwrap();
        assert_ne!(a.dataset_hash, b.dataset_hash);
    }
}
