//! Parameter presets: a `defaults` table in JSON or TOML.
//!
//! ```toml
//! [defaults]
//! horizon_days = 90
//! conf_pct = 80
//! test_tail_days = 21
//! trend_mode = "flat"
//! ```
//!
//! Layering is built-in defaults ← preset file ← explicit overrides. Every
//! key is optional; the merged values are validated against the parameter
//! surface bounds only once, after layering.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use demandlab_core::domain::{ParameterError, RunParameters, TrendMode};

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("failed to read preset {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("parse preset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse preset TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported preset extension '{0}' (expected .json or .toml)")]
    UnsupportedExtension(String),

    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

/// Optional parameter values, as found in a preset or on the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conf_pct: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_tail_days: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_mode: Option<String>,
}

impl PresetDefaults {
    /// Values from `over` win where present.
    pub fn overlay(&self, over: &PresetDefaults) -> PresetDefaults {
        PresetDefaults {
            horizon_days: over.horizon_days.or(self.horizon_days),
            conf_pct: over.conf_pct.or(self.conf_pct),
            test_tail_days: over.test_tail_days.or(self.test_tail_days),
            trend_mode: over.trend_mode.clone().or_else(|| self.trend_mode.clone()),
        }
    }

    /// Fill gaps from `base` and validate against the surface bounds.
    pub fn resolve(&self, base: &RunParameters) -> Result<RunParameters, ParameterError> {
        let trend = match &self.trend_mode {
            Some(raw) => raw.parse::<TrendMode>()?,
            None => base.trend(),
        };
        RunParameters::from_surface(
            self.horizon_days.unwrap_or(base.horizon_days()),
            self.conf_pct
                .unwrap_or_else(|| (base.confidence() * 100.0).round() as u32),
            self.test_tail_days.unwrap_or(base.hold_out()),
            trend,
        )
    }
}

/// A preset file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetFile {
    #[serde(default)]
    pub defaults: PresetDefaults,
}

impl PresetFile {
    /// Load a preset, picking the format from the file extension.
    pub fn from_file(path: &Path) -> Result<Self, PresetError> {
        let content = std::fs::read_to_string(path).map_err(|source| PresetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Self::from_json(&content),
            "toml" => Self::from_toml(&content),
            other => Err(PresetError::UnsupportedExtension(other.to_string())),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, PresetError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
