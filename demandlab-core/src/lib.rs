//! DemandLab Core: single-item demand forecasting pipeline.
//!
//! This crate contains the staged pipeline:
//! - Table ingestion with column aliasing and per-item grouping
//! - Series cleaning (drop incomplete rows, order by date)
//! - Train/eval split with a held-out tail
//! - Forecast engine behind a pluggable fit/predict contract
//! - Accuracy scoring against the held-out tail
//! - Immutable pipeline snapshots gating re-use of trained models

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod split;
pub mod state;

pub use engine::{ForecastEngine, TrainedModel};
pub use error::PipelineError;
pub use evaluate::{AccuracyReport, Evaluation, Evaluator};
pub use split::{SplitPlanner, SplitResult};
pub use state::{PipelineState, Stage, TrainedRun};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline artifacts can cross thread boundaries.
    ///
    /// A dashboard or server front end trains on a worker thread and hands the
    /// resulting snapshot back; this breaks the build if that stops working.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::ItemSeries>();
        require_sync::<domain::ItemSeries>();
        require_send::<domain::Forecast>();
        require_sync::<domain::Forecast>();
        require_send::<domain::RunParameters>();
        require_sync::<domain::RunParameters>();
        require_send::<domain::RunFingerprint>();
        require_sync::<domain::RunFingerprint>();

        // Data types
        require_send::<data::RawTable>();
        require_sync::<data::RawTable>();
        require_send::<data::CleanedSeries>();
        require_sync::<data::CleanedSeries>();

        // Pipeline types
        require_send::<SplitResult>();
        require_sync::<SplitResult>();
        require_send::<ForecastEngine>();
        require_sync::<ForecastEngine>();
        require_send::<TrainedModel>();
        require_sync::<TrainedModel>();
        require_send::<Evaluation>();
        require_sync::<Evaluation>();
        require_send::<PipelineState>();
        require_sync::<PipelineState>();
    }

    /// Architecture contract: models only ever see a single item's series.
    #[test]
    fn forecast_model_fit_takes_one_series() {
        fn _check_trait_object_builds(
            model: &mut dyn model::ForecastModel,
            history: &domain::ItemSeries,
        ) -> Result<(), model::ModelError> {
            model.fit(history)
        }
    }
}
