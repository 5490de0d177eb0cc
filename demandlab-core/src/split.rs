//! SplitPlanner: partitions a cleaned series into a training prefix and a
//! hold-out tail used for accuracy scoring.
//!
//! Policy: with `0 < hold_out < len` the last `hold_out` rows become the eval
//! tail; otherwise the whole series trains and eval is empty. An empty eval
//! means "no hold-out evaluation", never an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ItemSeries, Observation};

/// Training prefix and evaluation suffix of one series.
///
/// Invariants: `train.len() + eval.len()` equals the source length, and
/// `eval.len()` is strictly smaller than the source length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    pub train: ItemSeries,
    pub eval: ItemSeries,
}

impl SplitResult {
    pub fn has_eval(&self) -> bool {
        !self.eval.is_empty()
    }

    pub fn source_len(&self) -> usize {
        self.train.len() + self.eval.len()
    }

    /// First rows of the training prefix.
    pub fn train_head(&self, n: usize) -> &[Observation] {
        self.train.head(n)
    }

    /// Last rows of the evaluation suffix.
    pub fn eval_tail(&self, n: usize) -> &[Observation] {
        self.eval.tail(n)
    }
}

pub struct SplitPlanner;

impl SplitPlanner {
    /// Split `series`, holding out its last `hold_out` rows when feasible.
    pub fn plan(series: &ItemSeries, hold_out: usize) -> SplitResult {
        let len = series.len();
        let split = if hold_out > 0 && hold_out < len {
            let cut = len - hold_out;
            SplitResult {
                train: series.slice(0..cut),
                eval: series.slice(cut..len),
            }
        } else {
            SplitResult {
                train: series.clone(),
                eval: ItemSeries::empty(series.item()),
            }
        };
        debug!(
            item = series.item(),
            hold_out,
            train = split.train.len(),
            eval = split.eval.len(),
            "planned split"
        );
        split
    }
}
