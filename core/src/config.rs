//! Report engine configuration.

use crate::period::Period;
use serde::{Deserialize, Serialize};

/// The insurance program's launch month: the one month whose beginning
/// balance is an externally supplied fact rather than a derived value.
/// Everything after it is rolled forward from here.
pub const DEFAULT_EPOCH: Period = Period {
    year: 2024,
    month: 6,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollforwardConfig {
    /// Anchor month for the balance rollforward.
    pub epoch: Period,
    /// Upper bound on how far past the epoch a report may reach. Each month
    /// of distance costs one extra pair of grouped aggregate queries, so the
    /// acceptable range is an explicit setting rather than an implicit
    /// recursion limit.
    pub max_horizon_months: i64,
}

impl Default for RollforwardConfig {
    fn default() -> Self {
        Self {
            epoch: DEFAULT_EPOCH,
            max_horizon_months: 120,
        }
    }
}
