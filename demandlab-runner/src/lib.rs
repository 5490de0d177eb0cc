//! DemandLab Runner: session orchestration, presets, export, run summaries.
//!
//! This crate builds on `demandlab-core` to provide:
//! - Input selection (upload, fallback file, or synthetic sample)
//! - Parameter presets in JSON or TOML with explicit overrides on top
//! - A session that drives the pipeline snapshot through its stages
//! - CSV and workbook export of the forecast
//! - Serializable run summaries

pub mod export;
pub mod preset;
pub mod session;
pub mod summary;

pub use export::{file_name, ExportPaths, ExportRow, ExportTable};
pub use preset::{PresetDefaults, PresetError, PresetFile};
pub use session::{run_pipeline, InputChoice, RunOptions, Session};
pub use summary::RunSummary;
