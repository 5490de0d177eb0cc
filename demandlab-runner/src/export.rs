//! Forecast export: delimited text and a single-sheet workbook.
//!
//! Both formats carry the same projection of the forecast:
//! `Date, Forecast, Lower, Upper`. Delimited output is byte-identical for the
//! same forecast; numbers use Rust's shortest round-trip formatting.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use serde::{Deserialize, Serialize};

use demandlab_core::domain::Forecast;

/// Column headers of every export.
pub const EXPORT_COLUMNS: [&str; 4] = ["Date", "Forecast", "Lower", "Upper"];

/// Name of the data sheet in the workbook.
pub const SHEET_NAME: &str = "Forecast";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Forecast")]
    pub forecast: f64,
    #[serde(rename = "Lower")]
    pub lower: f64,
    #[serde(rename = "Upper")]
    pub upper: f64,
}

/// Export projection of one item's forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    item: String,
    rows: Vec<ExportRow>,
}

/// Files written by [`ExportTable::write_to_dir`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

impl ExportTable {
    /// Project the full forecast: training span plus horizon.
    pub fn from_forecast(forecast: &Forecast) -> Self {
        Self {
            item: forecast.item().to_string(),
            rows: forecast
                .rows()
                .iter()
                .map(|r| ExportRow {
                    date: r.date,
                    forecast: r.point,
                    lower: r.lower,
                    upper: r.upper,
                })
                .collect(),
        }
    }

    /// Keep only the last `n` rows.
    pub fn tail(mut self, n: usize) -> Self {
        let start = self.rows.len().saturating_sub(n);
        self.rows.drain(..start);
        self
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn rows(&self) -> &[ExportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // ─── Delimited text ─────────────────────────────────────────────

    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(EXPORT_COLUMNS)?;
        for r in &self.rows {
            wtr.write_record([
                &r.date.to_string(),
                &r.forecast.to_string(),
                &r.lower.to_string(),
                &r.upper.to_string(),
            ])?;
        }
        let data = wtr.into_inner().context("failed to flush CSV writer")?;
        String::from_utf8(data).context("CSV output is not valid UTF-8")
    }

    // ─── Workbook ───────────────────────────────────────────────────

    pub fn to_xlsx(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *name, &header)?;
        }
        sheet.set_column_width(0, 12)?;

        for (i, r) in self.rows.iter().enumerate() {
            let row = i as u32 + 1;
            let date = excel_date(r.date)?;
            sheet.write_datetime_with_format(row, 0, &date, &date_format)?;
            sheet.write_number(row, 1, r.forecast)?;
            sheet.write_number(row, 2, r.lower)?;
            sheet.write_number(row, 3, r.upper)?;
        }

        workbook
            .save_to_buffer()
            .context("failed to serialize workbook")
    }

    // ─── Files ──────────────────────────────────────────────────────

    /// Write `{item}_forecast.csv` and `{item}_forecast.xlsx` under `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> Result<ExportPaths> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let csv_path = dir.join(file_name(&self.item, "csv"));
        std::fs::write(&csv_path, self.to_csv()?)
            .with_context(|| format!("failed to write {}", csv_path.display()))?;

        let xlsx_path = dir.join(file_name(&self.item, "xlsx"));
        std::fs::write(&xlsx_path, self.to_xlsx()?)
            .with_context(|| format!("failed to write {}", xlsx_path.display()))?;

        Ok(ExportPaths {
            csv: csv_path,
            xlsx: xlsx_path,
        })
    }
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime> {
    let year = u16::try_from(date.year()).context("year outside workbook date range")?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)
        .with_context(|| format!("date {date} outside workbook date range"))
}

/// `{item}_forecast.{ext}`, with characters unsafe in file names replaced.
pub fn file_name(item: &str, ext: &str) -> String {
    let safe: String = item
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{safe}_forecast.{ext}")
}
