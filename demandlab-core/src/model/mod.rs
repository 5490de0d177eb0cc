//! The forecasting capability: a fit/predict contract plus one concrete model.
//!
//! Everything outside this module talks to models only through
//! [`ForecastModel`], so any algorithm can be swapped in behind a
//! [`ModelFactory`] without touching the rest of the pipeline.

pub mod linalg;
pub mod seasonal_trend;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ForecastRow, ItemSeries, TrendMode};

pub use seasonal_trend::{SeasonalTrendFactory, SeasonalTrendModel};

/// Errors reported by a forecasting model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("need at least 2 distinct dates to fit, got {distinct_dates}")]
    InsufficientData { distinct_dates: usize },

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    #[error("design matrix is singular")]
    Singular,

    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("model has not been fitted")]
    NotFitted,
}

/// Per-run model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Width of the prediction interval as a probability mass in (0, 1).
    pub interval_width: f64,
    pub trend: TrendMode,
    pub daily_seasonality: bool,
    pub weekly_seasonality: bool,
    pub yearly_seasonality: bool,
}

impl ModelConfig {
    /// Configuration used by pipeline runs: daily and weekly seasonality on,
    /// yearly off.
    pub fn for_run(interval_width: f64, trend: TrendMode) -> Self {
        Self {
            interval_width,
            trend,
            daily_seasonality: true,
            weekly_seasonality: true,
            yearly_seasonality: false,
        }
    }
}

/// A forecasting model: fit once on a history, then predict any dates.
pub trait ForecastModel: Send + Sync {
    /// Human-readable model name.
    fn name(&self) -> &str;

    /// Fit on a history ordered by date.
    fn fit(&mut self, history: &ItemSeries) -> Result<(), ModelError>;

    /// Point estimate and prediction interval for each date, in input order.
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastRow>, ModelError>;
}

/// Builds a fresh, unfitted model for a configuration.
pub trait ModelFactory: Send + Sync {
    fn create(&self, config: &ModelConfig) -> Box<dyn ForecastModel>;
}
