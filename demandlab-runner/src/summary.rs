//! Run summary: what a pipeline run produced, for printing or `--json`.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use demandlab_core::data::DataOrigin;
use demandlab_core::domain::RunParameters;
use demandlab_core::Evaluation;

use crate::export::{ExportPaths, ExportRow};

/// Current schema version of serialized summaries.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub item: String,
    pub dataset_hash: String,
    pub origin: DataOrigin,
    pub items_available: usize,
    /// Rows kept for the item after cleaning.
    pub rows: usize,
    pub dropped_rows: usize,
    pub train_rows: usize,
    pub eval_rows: usize,
    pub parameters: RunParameters,
    pub model: String,
    pub fingerprint: String,
    pub forecast_rows: usize,
    pub forecast_start: Option<NaiveDate>,
    pub forecast_end: Option<NaiveDate>,
    pub evaluation: Evaluation,
    /// Last `horizon + 5` forecast rows.
    pub preview: Vec<ExportRow>,
    pub exports: Option<ExportPaths>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Multi-line human-readable report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let p = &self.parameters;

        let _ = writeln!(out, "Item:        {}", self.item);
        let _ = writeln!(
            out,
            "Dataset:     {} ({:?}, {} items)",
            &self.dataset_hash[..self.dataset_hash.len().min(12)],
            self.origin,
            self.items_available
        );
        let _ = writeln!(
            out,
            "Rows:        {} kept, {} dropped",
            self.rows, self.dropped_rows
        );
        let _ = writeln!(
            out,
            "Split:       {} train / {} eval",
            self.train_rows, self.eval_rows
        );
        let _ = writeln!(
            out,
            "Parameters:  horizon {}d, confidence {:.0}%, hold-out {}, trend {}",
            p.horizon_days(),
            p.confidence() * 100.0,
            p.hold_out(),
            p.trend()
        );
        let _ = writeln!(out, "Model:       {}", self.model);
        if let (Some(start), Some(end)) = (self.forecast_start, self.forecast_end) {
            let _ = writeln!(
                out,
                "Forecast:    {} rows, {start} .. {end}",
                self.forecast_rows
            );
        }

        match &self.evaluation {
            Evaluation::Skipped => {
                let _ = writeln!(out, "Accuracy:    skipped (no hold-out)");
            }
            Evaluation::NoOverlap { eval_row_count } => {
                let _ = writeln!(
                    out,
                    "Accuracy:    no forecast dates overlap the last {eval_row_count} days"
                );
            }
            Evaluation::Scored(report) => {
                let _ = writeln!(
                    out,
                    "Accuracy:    MAPE {:.2}% over last {} days ({} matched), MAE {:.2}",
                    report.mean_absolute_percentage_error,
                    report.eval_row_count,
                    report.scored_row_count,
                    report.mean_absolute_error
                );
            }
        }

        if !self.preview.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{:<12} {:>12} {:>12} {:>12}",
                "Date", "Forecast", "Lower", "Upper"
            );
            for r in &self.preview {
                let _ = writeln!(
                    out,
                    "{:<12} {:>12.2} {:>12.2} {:>12.2}",
                    r.date.to_string(),
                    r.forecast,
                    r.lower,
                    r.upper
                );
            }
        }

        if let Some(paths) = &self.exports {
            let _ = writeln!(out);
            let _ = writeln!(out, "Wrote {}", paths.csv.display());
            let _ = writeln!(out, "Wrote {}", paths.xlsx.display());
        }
        out
    }
}
