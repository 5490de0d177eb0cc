//! Data ingestion, cleaning, and the built-in sample table

pub mod clean;
pub mod ingest;
pub mod sample;
pub mod schema;

pub use clean::{CleanedSeries, SeriesCleaner};
pub use ingest::{parse_csv, DataOrigin, GroupedRows, RawTable, SeriesLoader, TableSource};
pub use sample::{sample_table, SampleSpec};
pub use schema::{ColumnMap, ColumnRole};
