//! Property tests for the export projection and parameter layering.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use demandlab_core::domain::{Forecast, ForecastRow, RunParameters};
use demandlab_runner::{ExportTable, PresetDefaults};

fn forecast(len: usize) -> Forecast {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let rows = (0..len)
        .map(|i| {
            let point = (i as f64 * 0.37).sin() * 20.0 + 50.0;
            ForecastRow {
                date: start + Duration::days(i as i64),
                point,
                lower: point - 3.5,
                upper: point + 3.5,
            }
        })
        .collect();
    Forecast::new("SKU1", rows, len / 2)
}

proptest! {
    #[test]
    fn export_covers_every_forecast_row(len in 0usize..300) {
        let f = forecast(len);
        let table = ExportTable::from_forecast(&f);
        prop_assert_eq!(table.len(), f.len());
        let csv = table.to_csv().unwrap();
        prop_assert_eq!(csv.lines().count(), len + 1);
    }

    #[test]
    fn tail_window_is_the_suffix(len in 0usize..200, n in 0usize..250) {
        let f = forecast(len);
        let full = ExportTable::from_forecast(&f);
        let tail = full.clone().tail(n);
        prop_assert_eq!(tail.len(), n.min(len));
        prop_assert_eq!(tail.rows(), &full.rows()[len - n.min(len)..]);
    }

    #[test]
    fn surface_values_always_resolve(
        horizon in 7u32..=180,
        conf in 50u32..=99,
        hold_out in 0usize..=60,
        flat in any::<bool>(),
    ) {
        let values = PresetDefaults {
            horizon_days: Some(horizon),
            conf_pct: Some(conf),
            test_tail_days: Some(hold_out),
            trend_mode: Some(if flat { "flat" } else { "linear" }.to_string()),
        };
        let params = values.resolve(&RunParameters::default()).unwrap();
        prop_assert_eq!(params.horizon_days(), horizon);
        prop_assert_eq!(params.hold_out(), hold_out);
        prop_assert!((params.confidence() * 100.0 - conf as f64).abs() < 1e-9);
    }
}
