//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. Split lengths: train + eval equals the source, eval never covers it all
//! 2. Forecast shape: one row per training date plus the horizon
//! 3. Interval ordering: lower <= point <= upper on every row
//! 4. Accuracy scoring: perfect predictions score zero, zero actuals divide by one

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use demandlab_core::domain::{max_hold_out, Forecast, ForecastRow, ItemSeries, Observation, TrendMode};
use demandlab_core::{Evaluation, Evaluator, ForecastEngine, SplitPlanner};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_quantities(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((0.0..500.0_f64).prop_map(|q| q.round()), 1..max_len)
}

fn series_of(quantities: &[f64]) -> ItemSeries {
    let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
    ItemSeries::new(
        "SKU1",
        quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| Observation::new(start + Duration::days(i as i64), q))
            .collect(),
    )
}

// ── 1. Split lengths ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn split_partitions_the_series(quantities in arb_quantities(200), hold_out in 0usize..250) {
        let series = series_of(&quantities);
        let split = SplitPlanner::plan(&series, hold_out);

        prop_assert_eq!(split.train.len() + split.eval.len(), series.len());
        prop_assert!(split.eval.len() < series.len());
        if hold_out > 0 && hold_out < series.len() {
            prop_assert_eq!(split.eval.len(), hold_out);
        } else {
            prop_assert!(split.eval.is_empty());
        }
    }

    #[test]
    fn capped_hold_out_always_leaves_training_rows(len in 0usize..400) {
        let cap = max_hold_out(len);
        prop_assert!(cap <= 60);
        prop_assert!(cap == 0 || cap < len);
    }
}

// ── 2 & 3. Forecast shape and interval ordering ──────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn forecast_rows_cover_train_plus_horizon(
        quantities in arb_quantities(120).prop_filter("two dates", |q| q.len() >= 2),
        horizon in 7u32..=180,
        confidence in 0.5..0.99_f64,
        flat in any::<bool>(),
    ) {
        let series = series_of(&quantities);
        let trend = if flat { TrendMode::Flat } else { TrendMode::Linear };
        let trained = ForecastEngine::default().train(&series, confidence, trend).unwrap();
        let forecast = trained.forecast(horizon).unwrap();

        prop_assert_eq!(forecast.len(), series.len() + horizon as usize);
        prop_assert_eq!(forecast.first_date(), series.first_date());
        prop_assert_eq!(
            forecast.last_date().unwrap(),
            series.last_date().unwrap() + Duration::days(horizon as i64)
        );
        for row in forecast.rows() {
            prop_assert!(row.is_ordered(), "unordered row {:?}", row);
        }
        for pair in forecast.rows().windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }
}

// ── 4. Accuracy scoring ──────────────────────────────────────────────

fn echo_forecast(series: &ItemSeries, offset: f64) -> Forecast {
    let rows = series
        .observations()
        .iter()
        .map(|o| ForecastRow {
            date: o.date,
            point: o.quantity + offset,
            lower: o.quantity + offset - 1.0,
            upper: o.quantity + offset + 1.0,
        })
        .collect();
    Forecast::new(series.item(), rows, series.len())
}

proptest! {
    #[test]
    fn perfect_predictions_score_zero(quantities in arb_quantities(60)) {
        let eval = series_of(&quantities);
        let outcome = Evaluator::evaluate(&eval, &echo_forecast(&eval, 0.0));
        let report = outcome.report().unwrap();
        prop_assert_eq!(report.scored_row_count, eval.len());
        prop_assert_eq!(report.mean_absolute_percentage_error, 0.0);
        prop_assert_eq!(report.mean_absolute_error, 0.0);
    }

    #[test]
    fn zero_actuals_score_the_raw_miss(n in 1usize..30, miss in 1.0..50.0_f64) {
        let eval = series_of(&vec![0.0; n]);
        let outcome = Evaluator::evaluate(&eval, &echo_forecast(&eval, miss));
        let report = outcome.report().unwrap();
        prop_assert!((report.mean_absolute_percentage_error - miss * 100.0).abs() < 1e-6);
    }

    #[test]
    fn empty_eval_is_always_skipped(quantities in arb_quantities(30)) {
        let series = series_of(&quantities);
        let outcome = Evaluator::evaluate(&ItemSeries::empty("SKU1"), &echo_forecast(&series, 0.0));
        prop_assert_eq!(outcome, Evaluation::Skipped);
    }
}
