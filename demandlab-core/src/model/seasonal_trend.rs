//! Additive trend + Fourier seasonality regression.
//!
//! y(t) = trend(t) + weekly(t) + yearly(t) + ε, with t in days since the first
//! training date. Trend is `a + b·t/span` (linear) or `a` (flat). Seasonal
//! terms are sin/cos pairs of the given period and order. Coefficients come
//! from ridge-stabilized least squares, so very short histories still fit.
//!
//! Prediction interval: point ± z·σ·√(1 + d/n), σ the residual standard
//! deviation, z the normal quantile for the interval width, d the days past
//! the training end and n the number of training rows.

use std::f64::consts::PI;

use chrono::NaiveDate;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use super::linalg::least_squares;
use super::{ForecastModel, ModelConfig, ModelError, ModelFactory};
use crate::domain::{ForecastRow, ItemSeries, TrendMode};

const WEEKLY_PERIOD: f64 = 7.0;
const WEEKLY_ORDER: usize = 3;
const YEARLY_PERIOD: f64 = 365.25;
const YEARLY_ORDER: usize = 10;
const RIDGE: f64 = 1e-6;

#[derive(Debug, Clone)]
struct FittedState {
    origin: NaiveDate,
    last_date: NaiveDate,
    span_days: f64,
    coefficients: Vec<f64>,
    sigma: f64,
    z: f64,
    rows: usize,
}

/// Trend + seasonality regression model.
#[derive(Debug, Clone)]
pub struct SeasonalTrendModel {
    config: ModelConfig,
    fitted: Option<FittedState>,
}

impl SeasonalTrendModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Residual standard deviation of the last fit.
    pub fn residual_sigma(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.sigma)
    }

    fn features(&self, t: f64, span_days: f64) -> Vec<f64> {
        let mut x = vec![1.0];
        if self.config.trend == TrendMode::Linear {
            x.push(t / span_days);
        }
        if self.config.weekly_seasonality {
            push_fourier(&mut x, t, WEEKLY_PERIOD, WEEKLY_ORDER);
        }
        if self.config.yearly_seasonality {
            push_fourier(&mut x, t, YEARLY_PERIOD, YEARLY_ORDER);
        }
        x
    }
}

fn push_fourier(x: &mut Vec<f64>, t: f64, period: f64, order: usize) {
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * t / period;
        x.push(angle.sin());
        x.push(angle.cos());
    }
}

fn interval_z(width: f64) -> Result<f64, ModelError> {
    if !(width > 0.0 && width < 1.0) {
        return Err(ModelError::InvalidConfig(format!(
            "interval width {width} must lie strictly between 0 and 1"
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| ModelError::InvalidConfig(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + width / 2.0))
}

impl ForecastModel for SeasonalTrendModel {
    fn name(&self) -> &str {
        "seasonal_trend"
    }

    fn fit(&mut self, history: &ItemSeries) -> Result<(), ModelError> {
        let distinct_dates = history.distinct_dates().len();
        if distinct_dates < 2 {
            return Err(ModelError::InsufficientData { distinct_dates });
        }
        if history.quantities().any(|q| !q.is_finite()) {
            return Err(ModelError::NonFinite("training quantities"));
        }
        let z = interval_z(self.config.interval_width)?;

        let (origin, last_date) = match (history.first_date(), history.last_date()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ModelError::InsufficientData { distinct_dates }),
        };
        let span_days = ((last_date - origin).num_days() as f64).max(1.0);

        if self.config.daily_seasonality {
            debug!("daily seasonality has no sub-daily cycle to fit on date-granular data");
        }

        let design: Vec<Vec<f64>> = history
            .dates()
            .map(|d| self.features((d - origin).num_days() as f64, span_days))
            .collect();
        let y: Vec<f64> = history.quantities().collect();

        let coefficients = least_squares(&design, &y, RIDGE).ok_or(ModelError::Singular)?;

        let rss: f64 = design
            .iter()
            .zip(&y)
            .map(|(x, &target)| {
                let fitted: f64 = x.iter().zip(&coefficients).map(|(a, b)| a * b).sum();
                (target - fitted).powi(2)
            })
            .sum();
        let dof = y.len().saturating_sub(coefficients.len()).max(1);
        let sigma = (rss / dof as f64).sqrt();

        if !sigma.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonFinite("fitted coefficients"));
        }

        debug!(
            rows = y.len(),
            params = coefficients.len(),
            sigma,
            trend = %self.config.trend,
            "fitted seasonal trend model"
        );

        self.fitted = Some(FittedState {
            origin,
            last_date,
            span_days,
            coefficients,
            sigma,
            z,
            rows: y.len(),
        });
        Ok(())
    }

    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ForecastRow>, ModelError> {
        let state = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;

        dates
            .iter()
            .map(|&date| {
                let t = (date - state.origin).num_days() as f64;
                let x = self.features(t, state.span_days);
                let point: f64 = x.iter().zip(&state.coefficients).map(|(a, b)| a * b).sum();

                let ahead = (date - state.last_date).num_days().max(0) as f64;
                let half = state.z * state.sigma * (1.0 + ahead / state.rows as f64).sqrt();

                if !point.is_finite() || !half.is_finite() {
                    return Err(ModelError::NonFinite("prediction"));
                }
                Ok(ForecastRow {
                    date,
                    point,
                    lower: point - half,
                    upper: point + half,
                })
            })
            .collect()
    }
}

/// Factory producing [`SeasonalTrendModel`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonalTrendFactory;

impl ModelFactory for SeasonalTrendFactory {
    fn create(&self, config: &ModelConfig) -> Box<dyn ForecastModel> {
        Box::new(SeasonalTrendModel::new(*config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;
    use chrono::{Datelike, Duration};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn series_from(f: impl Fn(usize, NaiveDate) -> f64, n: usize) -> ItemSeries {
        ItemSeries::new(
            "SKU1",
            (0..n)
                .map(|i| {
                    let d = start() + Duration::days(i as i64);
                    Observation::new(d, f(i, d))
                })
                .collect(),
        )
    }

    fn dates(n: usize) -> Vec<NaiveDate> {
        (0..n).map(|i| start() + Duration::days(i as i64)).collect()
    }

    #[test]
    fn recovers_linear_trend() {
        let history = series_from(|i, _| 10.0 + 2.0 * i as f64, 60);
        let mut model = SeasonalTrendModel::new(ModelConfig::for_run(0.9, TrendMode::Linear));
        model.fit(&history).unwrap();

        let future = [start() + Duration::days(70)];
        let row = model.predict(&future).unwrap()[0];
        assert!((row.point - 150.0).abs() < 0.5, "point {}", row.point);
        assert!(row.is_ordered());
    }

    #[test]
    fn flat_trend_predicts_the_level() {
        let history = series_from(|i, _| if i % 2 == 0 { 9.0 } else { 11.0 }, 56);
        let mut config = ModelConfig::for_run(0.8, TrendMode::Flat);
        config.weekly_seasonality = false;
        let mut model = SeasonalTrendModel::new(config);
        model.fit(&history).unwrap();

        let row = model.predict(&[start() + Duration::days(200)]).unwrap()[0];
        assert!((row.point - 10.0).abs() < 1e-6);
        assert!(row.upper > row.lower);
    }

    #[test]
    fn captures_weekly_pattern() {
        let history = series_from(
            |_, d| if d.weekday().num_days_from_monday() >= 5 { 30.0 } else { 10.0 },
            84,
        );
        let mut model = SeasonalTrendModel::new(ModelConfig::for_run(0.9, TrendMode::Flat));
        model.fit(&history).unwrap();

        let rows = model.predict(&dates(84)).unwrap();
        let weekend: Vec<f64> = rows
            .iter()
            .filter(|r| r.date.weekday().num_days_from_monday() >= 5)
            .map(|r| r.point)
            .collect();
        let weekday: Vec<f64> = rows
            .iter()
            .filter(|r| r.date.weekday().num_days_from_monday() < 5)
            .map(|r| r.point)
            .collect();
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        assert!(mean(&weekend) > mean(&weekday) + 10.0);
    }

    #[test]
    fn interval_widens_with_confidence_and_distance() {
        let history = series_from(|i, _| 20.0 + ((i * 7) % 5) as f64, 40);
        let mut narrow = SeasonalTrendModel::new(ModelConfig::for_run(0.5, TrendMode::Linear));
        let mut wide = SeasonalTrendModel::new(ModelConfig::for_run(0.99, TrendMode::Linear));
        narrow.fit(&history).unwrap();
        wide.fit(&history).unwrap();

        let when = [start() + Duration::days(45), start() + Duration::days(120)];
        let n = narrow.predict(&when).unwrap();
        let w = wide.predict(&when).unwrap();
        assert!(w[0].upper - w[0].lower > n[0].upper - n[0].lower);
        assert!(n[1].upper - n[1].lower > n[0].upper - n[0].lower);
    }

    #[test]
    fn rejects_single_distinct_date() {
        let d = start();
        let history = ItemSeries::new(
            "SKU1",
            vec![Observation::new(d, 1.0), Observation::new(d, 2.0)],
        );
        let mut model = SeasonalTrendModel::new(ModelConfig::for_run(0.9, TrendMode::Linear));
        assert_eq!(
            model.fit(&history),
            Err(ModelError::InsufficientData { distinct_dates: 1 })
        );
        assert!(!model.is_fitted());
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = SeasonalTrendModel::new(ModelConfig::for_run(0.9, TrendMode::Linear));
        assert_eq!(model.predict(&dates(1)), Err(ModelError::NotFitted));
    }

    #[test]
    fn two_points_fit_with_seasonality_enabled() {
        let history = series_from(|i, _| 5.0 + i as f64, 2);
        let mut model = SeasonalTrendModel::new(ModelConfig::for_run(0.9, TrendMode::Linear));
        model.fit(&history).unwrap();
        let rows = model.predict(&dates(10)).unwrap();
        assert!(rows.iter().all(ForecastRow::is_ordered));
    }

    #[test]
    fn factory_builds_unfitted_models() {
        let model = SeasonalTrendFactory.create(&ModelConfig::for_run(0.9, TrendMode::Linear));
        assert_eq!(model.name(), "seasonal_trend");
        assert!(model.predict(&dates(1)).is_err());
    }
}
