use crate::period::Period;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Period {requested} precedes epoch {epoch}: no balance facts exist before the epoch")]
    PeriodBeforeEpoch { requested: Period, epoch: Period },

    #[error("Period {requested} is {distance} months past epoch {epoch}, beyond the configured horizon of {max_months}")]
    HorizonExceeded {
        requested: Period,
        epoch: Period,
        distance: i64,
        max_months: i64,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type MetricsResult<T> = Result<T, MetricsError>;
