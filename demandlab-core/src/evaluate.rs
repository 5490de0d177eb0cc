//! Evaluator: scores a forecast against the held-out tail of the series.
//!
//! Eval rows are inner-joined to forecast rows by exact date; unmatched eval
//! dates shrink the scored sample instead of failing. Percentage error uses
//! `|actual - predicted| / actual`, with an actual of exactly zero replaced by
//! one in the denominator.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Forecast, ItemSeries};

/// Accuracy of a forecast over the matched eval rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Eval rows whose date appears in the forecast.
    pub scored_row_count: usize,
    /// All eval rows, matched or not.
    pub eval_row_count: usize,
    pub mean_absolute_error: f64,
    /// Mean percentage error, times 100.
    pub mean_absolute_percentage_error: f64,
}

impl AccuracyReport {
    pub fn unmatched_row_count(&self) -> usize {
        self.eval_row_count - self.scored_row_count
    }
}

/// What an evaluation produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Evaluation {
    /// No hold-out was taken.
    Skipped,
    /// Eval rows exist but none share a date with the forecast.
    NoOverlap { eval_row_count: usize },
    Scored(AccuracyReport),
}

impl Evaluation {
    pub fn report(&self) -> Option<&AccuracyReport> {
        match self {
            Evaluation::Scored(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Evaluation::Skipped)
    }
}

pub struct Evaluator;

impl Evaluator {
    pub fn evaluate(eval: &ItemSeries, forecast: &Forecast) -> Evaluation {
        if eval.is_empty() {
            return Evaluation::Skipped;
        }

        let mut abs_sum = 0.0;
        let mut pct_sum = 0.0;
        let mut matched = 0usize;
        for obs in eval.observations() {
            let Some(row) = forecast.row_for(obs.date) else {
                continue;
            };
            let abs_err = (obs.quantity - row.point).abs();
            let denominator = if obs.quantity == 0.0 { 1.0 } else { obs.quantity };
            abs_sum += abs_err;
            pct_sum += abs_err / denominator;
            matched += 1;
        }

        debug!(
            item = eval.item(),
            eval_rows = eval.len(),
            matched,
            "evaluated forecast"
        );

        if matched == 0 {
            return Evaluation::NoOverlap {
                eval_row_count: eval.len(),
            };
        }

        let n = matched as f64;
        Evaluation::Scored(AccuracyReport {
            scored_row_count: matched,
            eval_row_count: eval.len(),
            mean_absolute_error: abs_sum / n,
            mean_absolute_percentage_error: pct_sum / n * 100.0,
        })
    }
}
