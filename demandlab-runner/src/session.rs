//! Session orchestration: wires loading, cleaning, state transitions,
//! evaluation, and export into one run.
//!
//! A [`Session`] owns the loaded table and the current [`PipelineState`]
//! snapshot. Each action swaps in the snapshot the transition returned; a
//! failed action leaves the previous snapshot in place.
//!
//! [`run_pipeline`] is the one-shot entry point used by the CLI.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use demandlab_core::data::{
    sample_table, GroupedRows, RawTable, SampleSpec, SeriesCleaner, SeriesLoader, TableSource,
};
use demandlab_core::domain::RunParameters;
use demandlab_core::{Evaluation, ForecastEngine, PipelineError, PipelineState};

use crate::export::{ExportPaths, ExportTable};
use crate::preset::{PresetDefaults, PresetFile};
use crate::summary::{RunSummary, SCHEMA_VERSION};

/// Extra rows shown in the preview beyond the horizon.
pub const PREVIEW_EXTRA_ROWS: usize = 5;

/// Default fallback table, relative to the working directory.
pub const DEFAULT_FALLBACK: &str = "data/synthetic_sales_dataset.csv";

/// Where the input table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputChoice {
    /// Explicit file, loaded as an upload; never falls back.
    File(PathBuf),
    /// No upload: use the fallback file.
    Fallback,
    /// Generate the built-in synthetic sample.
    Synthetic,
}

/// Everything a one-shot run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: InputChoice,
    pub fallback: PathBuf,
    /// Item to forecast; the first item in sorted order when absent.
    pub item: Option<String>,
    pub preset: Option<PathBuf>,
    /// Values given explicitly by the caller; these win over the preset.
    pub overrides: PresetDefaults,
    /// Write `{item}_forecast.csv` / `.xlsx` here when set.
    pub output_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            input: InputChoice::Fallback,
            fallback: PathBuf::from(DEFAULT_FALLBACK),
            item: None,
            preset: None,
            overrides: PresetDefaults::default(),
            output_dir: None,
        }
    }
}

impl RunOptions {
    /// Built-in defaults layered with the preset and then the overrides.
    pub fn resolve_parameters(&self) -> Result<RunParameters> {
        let preset = match &self.preset {
            Some(path) => PresetFile::from_file(path)?.defaults,
            None => PresetDefaults::default(),
        };
        let merged = preset.overlay(&self.overrides);
        Ok(merged.resolve(&RunParameters::default())?)
    }

    /// Load the table this run reads.
    pub fn load_table(&self) -> Result<RawTable> {
        let table = match &self.input {
            InputChoice::Synthetic => sample_table(&SampleSpec::default())?,
            InputChoice::File(path) => SeriesLoader::with_fallback(&self.fallback)
                .load(Some(TableSource::File(path.clone())))
                .with_context(|| format!("failed to load {}", path.display()))?,
            InputChoice::Fallback => SeriesLoader::with_fallback(&self.fallback).load(None)?,
        };
        Ok(table)
    }
}

/// One loaded table and the pipeline snapshot for its selected item.
#[derive(Debug)]
pub struct Session {
    table: RawTable,
    grouped: GroupedRows,
    engine: ForecastEngine,
    state: PipelineState,
}

impl Session {
    pub fn new(table: RawTable, params: RunParameters) -> Self {
        Self::with_engine(table, params, ForecastEngine::default())
    }

    pub fn with_engine(table: RawTable, params: RunParameters, engine: ForecastEngine) -> Self {
        let grouped = table.group();
        Self {
            table,
            grouped,
            engine,
            state: PipelineState::new(params),
        }
    }

    pub fn table(&self) -> &RawTable {
        &self.table
    }

    pub fn items(&self) -> Vec<&str> {
        self.grouped.item_ids()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Select an item, discarding any model or forecast of the previous one.
    pub fn select(&mut self, item: &str) -> Result<(), PipelineError> {
        let cleaned = SeriesCleaner::clean_item(&self.grouped, item)?;
        info!(
            item,
            rows = cleaned.series.len(),
            dropped = cleaned.dropped_rows,
            "selected item"
        );
        self.state = self
            .state
            .select_series(self.table.dataset_hash.clone(), cleaned);
        Ok(())
    }

    /// Select `item`, or the first item when `None`.
    pub fn select_or_first(&mut self, item: Option<&str>) -> Result<String, PipelineError> {
        let chosen = match item {
            Some(item) => item.to_string(),
            None => self
                .grouped
                .first_item()
                .ok_or(PipelineError::NoItems)?
                .to_string(),
        };
        self.select(&chosen)?;
        Ok(chosen)
    }

    pub fn set_parameters(&mut self, params: RunParameters) -> Result<(), PipelineError> {
        self.state = self.state.with_parameters(params)?;
        Ok(())
    }

    pub fn train(&mut self) -> Result<(), PipelineError> {
        self.state = self.state.train(&self.engine)?;
        Ok(())
    }

    pub fn evaluate(&self) -> Result<Evaluation, PipelineError> {
        self.state.evaluate()
    }

    /// Export projection of the current forecast.
    pub fn export_table(&self) -> Result<ExportTable, PipelineError> {
        Ok(ExportTable::from_forecast(self.state.export_ready()?))
    }

    pub fn export_to(&self, dir: &std::path::Path) -> Result<ExportPaths> {
        let paths = self.export_table()?.write_to_dir(dir)?;
        info!(csv = %paths.csv.display(), xlsx = %paths.xlsx.display(), "exported forecast");
        Ok(paths)
    }

    /// Summary of the current snapshot.
    pub fn summary(&self, exports: Option<ExportPaths>) -> Result<RunSummary> {
        let state = &self.state;
        let series = state.series().ok_or(PipelineError::NoSeriesSelected)?;
        let split = state.split().ok_or(PipelineError::NoSeriesSelected)?;
        let run = state.trained().ok_or(PipelineError::NotTrained)?;
        let forecast = state.forecast()?;
        let params = state.params().with_hold_out(state.effective_hold_out());
        let preview_rows = params.horizon_days() as usize + PREVIEW_EXTRA_ROWS;

        Ok(RunSummary {
            schema_version: SCHEMA_VERSION,
            item: series.item().to_string(),
            dataset_hash: self.table.dataset_hash.0.clone(),
            origin: self.table.origin,
            items_available: self.grouped.item_count(),
            rows: series.len(),
            dropped_rows: state.dropped_rows(),
            train_rows: split.train.len(),
            eval_rows: split.eval.len(),
            parameters: params,
            model: run.model.model_name().to_string(),
            fingerprint: run.fingerprint.hash(),
            forecast_rows: forecast.len(),
            forecast_start: forecast.first_date(),
            forecast_end: forecast.last_date(),
            evaluation: state.evaluate()?,
            preview: ExportTable::from_forecast(forecast)
                .tail(preview_rows)
                .rows()
                .to_vec(),
            exports,
        })
    }
}

/// Load, select, train, evaluate, and optionally export in one go.
pub fn run_pipeline(options: &RunOptions) -> Result<RunSummary> {
    let params = options.resolve_parameters()?;
    let table = options.load_table()?;

    let mut session = Session::new(table, params);
    let item = session.select_or_first(options.item.as_deref())?;
    let _span = info_span!("run", item = %item).entered();

    if let (Some(hold_out), Some(series)) =
        (options.overrides.test_tail_days, session.state().series())
    {
        params
            .with_hold_out(hold_out)
            .check_hold_out(series.len())
            .map_err(PipelineError::from)?;
    }

    session.train()?;
    if let Some(report) = session.evaluate()?.report() {
        info!(
            mape = report.mean_absolute_percentage_error,
            matched = report.scored_row_count,
            "scored hold-out"
        );
    }

    let exports = match &options.output_dir {
        Some(dir) => Some(session.export_to(dir)?),
        None => None,
    };
    session.summary(exports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use demandlab_core::data::{parse_csv, DataOrigin};

    fn table(days: usize) -> RawTable {
        let mut csv = String::from("Item,Date,Quantity\n");
        for item in ["B", "A"] {
            for i in 0..days {
                csv.push_str(&format!("{item},2024-01-{:02},{}\n", i + 1, 10 + i % 4));
            }
        }
        parse_csv(csv.as_bytes(), DataOrigin::Upload).unwrap()
    }

    #[test]
    fn first_item_is_selected_by_default() {
        let mut session = Session::new(table(20), RunParameters::default());
        assert_eq!(session.select_or_first(None).unwrap(), "A");
        assert_eq!(session.items(), vec!["A", "B"]);
    }

    #[test]
    fn empty_table_and_unselected_session_name_the_real_cause() {
        let empty = parse_csv(b"Item,Date,Quantity\n", DataOrigin::Upload).unwrap();
        let mut session = Session::new(empty, RunParameters::default());
        assert!(matches!(
            session.select_or_first(None),
            Err(PipelineError::NoItems)
        ));
        assert!(matches!(
            session.train(),
            Err(PipelineError::NoSeriesSelected)
        ));
        let err = session.summary(None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoSeriesSelected)
        ));
    }

    #[test]
    fn export_before_training_is_nothing_to_export() {
        let mut session = Session::new(table(20), RunParameters::default());
        session.select("A").unwrap();
        assert!(matches!(
            session.export_table(),
            Err(PipelineError::NothingToExport)
        ));
    }

    #[test]
    fn summary_reflects_the_trained_run() {
        let params = RunParameters::from_surface(7, 90, 5, Default::default()).unwrap();
        let mut session = Session::new(table(28), params);
        session.select("B").unwrap();
        session.train().unwrap();

        let summary = session.summary(None).unwrap();
        assert_eq!(summary.item, "B");
        assert_eq!(summary.train_rows, 23);
        assert_eq!(summary.eval_rows, 5);
        assert_eq!(summary.forecast_rows, 23 + 7);
        assert_eq!(summary.preview.len(), 12);
        assert!(summary.evaluation.report().is_some());
    }

    #[test]
    fn failed_selection_keeps_the_current_snapshot() {
        let mut session = Session::new(table(20), RunParameters::default());
        session.select("A").unwrap();
        session.train().unwrap();
        assert!(session.select("Z").is_err());
        assert_eq!(session.state().forecast().unwrap().item(), "A");
    }
}
