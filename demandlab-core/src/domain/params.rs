//! Run parameters and the bounds of the parameter surface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest horizon offered on the parameter surface (days).
pub const HORIZON_MIN_DAYS: u32 = 7;
/// Largest horizon offered on the parameter surface (days).
pub const HORIZON_MAX_DAYS: u32 = 180;
/// Lowest confidence offered on the parameter surface (percent).
pub const CONFIDENCE_MIN_PCT: u32 = 50;
/// Highest confidence offered on the parameter surface (percent).
pub const CONFIDENCE_MAX_PCT: u32 = 99;
/// Absolute cap on the hold-out tail regardless of series length.
pub const HOLD_OUT_CAP: usize = 60;
/// Series shorter than this never get a hold-out tail.
pub const MIN_ROWS_FOR_HOLD_OUT: usize = 3;

/// Growth assumption of the trend component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMode {
    #[default]
    Linear,
    Flat,
}

impl TrendMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendMode::Linear => "linear",
            TrendMode::Flat => "flat",
        }
    }
}

impl fmt::Display for TrendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendMode {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(TrendMode::Linear),
            "flat" => Ok(TrendMode::Flat),
            other => Err(ParameterError::UnknownTrendMode(other.to_string())),
        }
    }
}

/// Parameter validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("horizon {value} outside [{min}, {max}] days")]
    HorizonOutOfRange { value: u32, min: u32, max: u32 },

    #[error("confidence {value}% outside [{min}, {max}]%")]
    ConfidenceOutOfRange { value: u32, min: u32, max: u32 },

    #[error("confidence fraction {0} must lie strictly between 0 and 1")]
    ConfidenceFraction(f64),

    #[error("hold-out {value} exceeds the maximum of {max} rows for this series")]
    HoldOutOutOfRange { value: usize, max: usize },

    #[error("unknown trend mode '{0}' (expected 'linear' or 'flat')")]
    UnknownTrendMode(String),
}

/// Parameters of one pipeline run.
///
/// `confidence` is a fraction in (0, 1). Values are immutable once built;
/// change a parameter by building a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRunParameters")]
pub struct RunParameters {
    horizon_days: u32,
    confidence: f64,
    hold_out: usize,
    trend: TrendMode,
}

/// Wire shape of [`RunParameters`]; deserialized values pass through
/// [`RunParameters::new`].
#[derive(Deserialize)]
struct RawRunParameters {
    horizon_days: u32,
    confidence: f64,
    hold_out: usize,
    trend: TrendMode,
}

impl TryFrom<RawRunParameters> for RunParameters {
    type Error = ParameterError;

    fn try_from(raw: RawRunParameters) -> Result<Self, Self::Error> {
        Self::new(raw.horizon_days, raw.confidence, raw.hold_out, raw.trend)
    }
}

impl RunParameters {
    /// Build parameters with core-level checks only: positive horizon and a
    /// confidence fraction strictly inside (0, 1).
    pub fn new(
        horizon_days: u32,
        confidence: f64,
        hold_out: usize,
        trend: TrendMode,
    ) -> Result<Self, ParameterError> {
        if horizon_days == 0 {
            return Err(ParameterError::HorizonOutOfRange {
                value: 0,
                min: 1,
                max: u32::MAX,
            });
        }
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(ParameterError::ConfidenceFraction(confidence));
        }
        Ok(Self {
            horizon_days,
            confidence,
            hold_out,
            trend,
        })
    }

    /// Build parameters from the values of the parameter surface, enforcing
    /// its bounds. Confidence is given in percent.
    ///
    /// The hold-out bound depends on the series, so it is checked separately
    /// with [`RunParameters::check_hold_out`].
    pub fn from_surface(
        horizon_days: u32,
        confidence_pct: u32,
        hold_out: usize,
        trend: TrendMode,
    ) -> Result<Self, ParameterError> {
        if !(HORIZON_MIN_DAYS..=HORIZON_MAX_DAYS).contains(&horizon_days) {
            return Err(ParameterError::HorizonOutOfRange {
                value: horizon_days,
                min: HORIZON_MIN_DAYS,
                max: HORIZON_MAX_DAYS,
            });
        }
        if !(CONFIDENCE_MIN_PCT..=CONFIDENCE_MAX_PCT).contains(&confidence_pct) {
            return Err(ParameterError::ConfidenceOutOfRange {
                value: confidence_pct,
                min: CONFIDENCE_MIN_PCT,
                max: CONFIDENCE_MAX_PCT,
            });
        }
        Self::new(horizon_days, confidence_pct as f64 / 100.0, hold_out, trend)
    }

    /// Verify the hold-out against the surface bound for a series of
    /// `series_len` rows.
    pub fn check_hold_out(&self, series_len: usize) -> Result<(), ParameterError> {
        let max = max_hold_out(series_len);
        if self.hold_out > max {
            return Err(ParameterError::HoldOutOutOfRange {
                value: self.hold_out,
                max,
            });
        }
        Ok(())
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn hold_out(&self) -> usize {
        self.hold_out
    }

    pub fn trend(&self) -> TrendMode {
        self.trend
    }

    pub fn with_horizon(self, horizon_days: u32) -> Result<Self, ParameterError> {
        Self::new(horizon_days, self.confidence, self.hold_out, self.trend)
    }

    pub fn with_confidence(self, confidence: f64) -> Result<Self, ParameterError> {
        Self::new(self.horizon_days, confidence, self.hold_out, self.trend)
    }

    pub fn with_hold_out(self, hold_out: usize) -> Self {
        Self { hold_out, ..self }
    }

    pub fn with_trend(self, trend: TrendMode) -> Self {
        Self { trend, ..self }
    }
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            horizon_days: 60,
            confidence: 0.90,
            hold_out: 14,
            trend: TrendMode::Linear,
        }
    }
}

/// Largest hold-out the surface offers for a series of `series_len` rows:
/// `min(60, len / 3)`, and zero for series under three rows.
pub fn max_hold_out(series_len: usize) -> usize {
    if series_len < MIN_ROWS_FOR_HOLD_OUT {
        return 0;
    }
    HOLD_OUT_CAP.min(series_len / 3)
}
