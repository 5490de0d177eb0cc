//! PipelineState: immutable snapshot of a single active forecasting run.
//!
//! Stages: `Empty → Cleaned → Split → Trained → Forecasted`.
//!
//! Every transition borrows the current snapshot and returns a new one; the
//! caller decides which snapshot survives. Heavy artifacts (series, split,
//! trained model, forecast) sit behind `Arc`, so snapshots are cheap to clone
//! and a failed transition leaves the previous snapshot untouched.
//!
//! Selecting a new series discards every downstream artifact. Parameter
//! changes re-plan the split and, when only the horizon moved, re-derive the
//! forecast from the trained model. Other parameter changes leave the trained
//! model in place; [`PipelineState::is_model_stale`] reports the mismatch
//! until the next explicit `train`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::CleanedSeries;
use crate::domain::{max_hold_out, DatasetHash, Forecast, ItemSeries, RunFingerprint, RunParameters};
use crate::engine::{ForecastEngine, TrainedModel};
use crate::error::PipelineError;
use crate::evaluate::{Evaluation, Evaluator};
use crate::split::{SplitPlanner, SplitResult};

/// Position of a snapshot in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Empty,
    Cleaned,
    Split,
    Trained,
    Forecasted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Empty => "empty",
            Stage::Cleaned => "cleaned",
            Stage::Split => "split",
            Stage::Trained => "trained",
            Stage::Forecasted => "forecasted",
        };
        f.write_str(s)
    }
}

/// Loaded series for the selected item, with the table it came from.
#[derive(Debug, Clone)]
struct Selection {
    dataset: DatasetHash,
    cleaned: CleanedSeries,
}

/// A trained model together with the inputs it was fit on.
#[derive(Debug)]
pub struct TrainedRun {
    pub model: TrainedModel,
    pub split: SplitResult,
    pub fingerprint: RunFingerprint,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    params: RunParameters,
    selection: Option<Arc<Selection>>,
    split: Option<Arc<SplitResult>>,
    trained: Option<Arc<TrainedRun>>,
    forecast: Option<Arc<Forecast>>,
}

impl PipelineState {
    pub fn new(params: RunParameters) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────

    pub fn stage(&self) -> Stage {
        if self.forecast.is_some() {
            Stage::Forecasted
        } else if self.trained.is_some() {
            Stage::Trained
        } else if self.split.is_some() {
            Stage::Split
        } else if self.selection.is_some() {
            Stage::Cleaned
        } else {
            Stage::Empty
        }
    }

    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    pub fn dataset(&self) -> Option<&DatasetHash> {
        self.selection.as_ref().map(|s| &s.dataset)
    }

    pub fn series(&self) -> Option<&ItemSeries> {
        self.selection.as_ref().map(|s| &s.cleaned.series)
    }

    pub fn dropped_rows(&self) -> usize {
        self.selection.as_ref().map_or(0, |s| s.cleaned.dropped_rows)
    }

    pub fn split(&self) -> Option<&SplitResult> {
        self.split.as_deref()
    }

    pub fn trained(&self) -> Option<&TrainedRun> {
        self.trained.as_deref()
    }

    pub fn forecast(&self) -> Result<&Forecast, PipelineError> {
        self.forecast.as_deref().ok_or(PipelineError::NotTrained)
    }

    /// Hold-out actually applied to the selected series: the requested length
    /// capped at `max_hold_out(series length)`.
    pub fn effective_hold_out(&self) -> usize {
        match self.series() {
            Some(series) => self.params.hold_out().min(max_hold_out(series.len())),
            None => self.params.hold_out(),
        }
    }

    /// Fingerprint of the current inputs, if a series is selected.
    pub fn current_fingerprint(&self) -> Option<RunFingerprint> {
        let selection = self.selection.as_ref()?;
        Some(RunFingerprint::new(
            selection.dataset.clone(),
            selection.cleaned.series.item(),
            self.params.with_hold_out(self.effective_hold_out()),
        ))
    }

    /// True when the trained model no longer matches the current inputs.
    pub fn is_model_stale(&self) -> bool {
        match (&self.trained, self.current_fingerprint()) {
            (Some(run), Some(current)) => run.fingerprint.requires_refit(&current),
            _ => false,
        }
    }

    // ─── Transitions ─────────────────────────────────────────────────

    /// Back to `Empty`, keeping the parameters.
    pub fn reset(&self) -> Self {
        Self::new(self.params)
    }

    /// Select a freshly cleaned series. Discards split, model and forecast,
    /// then plans the split for the new series.
    pub fn select_series(&self, dataset: DatasetHash, cleaned: CleanedSeries) -> Self {
        if self.trained.is_some() || self.forecast.is_some() {
            debug!(
                previous = self.series().map(|s| s.item()).unwrap_or_default(),
                next = cleaned.series.item(),
                "discarding downstream artifacts"
            );
        }
        let cleaned_state = Self {
            params: self.params,
            selection: Some(Arc::new(Selection { dataset, cleaned })),
            split: None,
            trained: None,
            forecast: None,
        };
        cleaned_state.replanned()
    }

    /// Apply new run parameters.
    ///
    /// The split is re-planned. When a model is trained and only the horizon
    /// changed relative to the current forecast, the forecast is re-derived
    /// without refitting.
    pub fn with_parameters(&self, params: RunParameters) -> Result<Self, PipelineError> {
        let mut next = Self {
            params,
            ..self.clone()
        }
        .replanned();

        if let Some(run) = &next.trained {
            let horizon_changed = self
                .forecast
                .as_ref()
                .map_or(true, |f| f.horizon() != params.horizon_days() as usize);
            if horizon_changed {
                let forecast = run.model.forecast(params.horizon_days())?;
                next.forecast = Some(Arc::new(forecast));
            }
        }
        if next.is_model_stale() {
            info!("parameters changed since training; retrain to apply them");
        }
        Ok(next)
    }

    /// Explicit training action: fit on the current split, then forecast the
    /// current horizon. On failure the current snapshot stays valid.
    pub fn train(&self, engine: &ForecastEngine) -> Result<Self, PipelineError> {
        let fingerprint = self
            .current_fingerprint()
            .ok_or(PipelineError::NoSeriesSelected)?;
        let split = match &self.split {
            Some(split) => Arc::clone(split),
            None => return Err(PipelineError::NoSeriesSelected),
        };

        let model = engine.train(&split.train, self.params.confidence(), self.params.trend())?;
        let forecast = model.forecast(self.params.horizon_days())?;

        let run_hash = fingerprint.hash();
        info!(
            item = model.item(),
            fingerprint = &run_hash[..12],
            rows = forecast.len(),
            "pipeline trained"
        );

        Ok(Self {
            params: self.params,
            selection: self.selection.clone(),
            split: Some(Arc::clone(&split)),
            trained: Some(Arc::new(TrainedRun {
                model,
                split: split.as_ref().clone(),
                fingerprint,
            })),
            forecast: Some(Arc::new(forecast)),
        })
    }

    /// Score the current forecast against the eval tail the model was trained
    /// alongside.
    pub fn evaluate(&self) -> Result<Evaluation, PipelineError> {
        let run = self.trained.as_ref().ok_or(PipelineError::NotTrained)?;
        let forecast = self.forecast()?;
        Ok(Evaluator::evaluate(&run.split.eval, forecast))
    }

    /// The forecast to hand to an exporter.
    pub fn export_ready(&self) -> Result<&Forecast, PipelineError> {
        self.forecast
            .as_deref()
            .ok_or(PipelineError::NothingToExport)
    }

    fn replanned(mut self) -> Self {
        let hold_out = self.effective_hold_out();
        if hold_out < self.params.hold_out() {
            warn!(
                requested = self.params.hold_out(),
                applied = hold_out,
                "hold-out capped for series length"
            );
        }
        self.split = self
            .series()
            .map(|series| Arc::new(SplitPlanner::plan(series, hold_out)));
        self
    }
}
