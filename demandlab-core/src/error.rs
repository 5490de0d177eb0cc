//! Pipeline error taxonomy.
//!
//! Every variant is terminal for the action that raised it and is meant to be
//! shown to whoever drives the pipeline (CLI, dashboard). Nothing here is
//! retried automatically.

use thiserror::Error;

use crate::domain::params::ParameterError;

/// Errors raised by the pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no input table supplied and no fallback sample available")]
    MissingDataSource,

    #[error("series for item '{item}' has no usable rows after cleaning")]
    EmptySeries { item: String },

    #[error("input table has no item rows")]
    NoItems,

    #[error("no series selected: choose an item first")]
    NoSeriesSelected,

    #[error("model training failed: {0}")]
    TrainingFailure(String),

    #[error("no trained model: train before forecasting")]
    NotTrained,

    #[error("nothing to export: no forecast has been produced")]
    NothingToExport,

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("invalid date '{value}' on line {line}")]
    InvalidDate { line: u64, value: String },

    #[error("invalid quantity '{value}' on line {line}")]
    InvalidQuantity { line: u64, value: String },

    #[error("unknown item identifier: {0}")]
    UnknownItem(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
