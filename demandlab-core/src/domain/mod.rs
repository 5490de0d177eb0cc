//! Domain types for demand forecasting runs.

pub mod forecast;
pub mod ids;
pub mod observation;
pub mod params;
pub mod series;

pub use forecast::{Forecast, ForecastRow};
pub use ids::{DatasetHash, RunFingerprint};
pub use observation::{Observation, RawRow};
pub use params::{max_hold_out, ParameterError, RunParameters, TrendMode};
pub use series::ItemSeries;

/// Item identifier type alias
pub type ItemId = String;
