//! ForecastEngine: owns the lifecycle of one fitted model per training call.
//!
//! Training is explicit and possibly slow; forecasting is cheap and is
//! re-derived from the trained model, so a horizon change never refits.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::domain::{Forecast, ItemSeries, TrendMode};
use crate::error::PipelineError;
use crate::model::{ForecastModel, ModelConfig, ModelFactory, SeasonalTrendFactory};

/// Fits models through a pluggable [`ModelFactory`].
#[derive(Clone)]
pub struct ForecastEngine {
    factory: Arc<dyn ModelFactory>,
}

impl ForecastEngine {
    pub fn new(factory: impl ModelFactory + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    pub fn with_factory(factory: Arc<dyn ModelFactory>) -> Self {
        Self { factory }
    }

    /// Fit a new model on `train`.
    ///
    /// The model is configured with interval width `confidence`, the given
    /// trend mode, daily and weekly seasonality on, yearly seasonality off.
    /// Any rejection by the model surfaces as `TrainingFailure`.
    pub fn train(
        &self,
        train: &ItemSeries,
        confidence: f64,
        trend: TrendMode,
    ) -> Result<TrainedModel, PipelineError> {
        let config = ModelConfig::for_run(confidence, trend);
        let mut model = self.factory.create(&config);

        let started = Instant::now();
        info!(
            item = train.item(),
            rows = train.len(),
            model = model.name(),
            confidence,
            trend = %trend,
            "training model"
        );

        model.fit(train).map_err(|e| {
            warn!(item = train.item(), error = %e, "training failed");
            PipelineError::TrainingFailure(e.to_string())
        })?;

        info!(
            item = train.item(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model trained"
        );

        Ok(TrainedModel {
            item: train.item().to_string(),
            history_dates: train.distinct_dates(),
            config,
            model: Arc::from(model),
        })
    }
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new(SeasonalTrendFactory)
    }
}

impl fmt::Debug for ForecastEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastEngine").finish_non_exhaustive()
    }
}

/// A successfully fitted model and the training dates it covers.
#[derive(Clone)]
pub struct TrainedModel {
    item: String,
    history_dates: Vec<NaiveDate>,
    config: ModelConfig,
    model: Arc<dyn ForecastModel>,
}

impl TrainedModel {
    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Distinct training dates, ascending.
    pub fn history_dates(&self) -> &[NaiveDate] {
        &self.history_dates
    }

    /// Forecast every training date plus `horizon_days` consecutive days
    /// after the last one.
    ///
    /// A model that fitted but fails to predict reports
    /// `TrainingFailure("prediction failed: ...")`; the run has to be
    /// retrained before it can forecast.
    pub fn forecast(&self, horizon_days: u32) -> Result<Forecast, PipelineError> {
        let dates = forecast_dates(&self.history_dates, horizon_days);
        let rows = self
            .model
            .predict(&dates)
            .map_err(|e| PipelineError::TrainingFailure(format!("prediction failed: {e}")))?;

        info!(
            item = %self.item,
            rows = rows.len(),
            horizon_days,
            "forecast produced"
        );
        Ok(Forecast::new(self.item.clone(), rows, self.history_dates.len()))
    }
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("item", &self.item)
            .field("model", &self.model.name())
            .field("history_dates", &self.history_dates.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Training dates followed by `horizon_days` daily steps past the last one.
pub fn forecast_dates(history: &[NaiveDate], horizon_days: u32) -> Vec<NaiveDate> {
    let mut dates = history.to_vec();
    if let Some(&last) = history.last() {
        dates.extend((1..=horizon_days as i64).map(|i| last + Duration::days(i)));
    }
    dates
}
