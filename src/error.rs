//! Error types for the sensor query engine.

use chrono::{DateTime, Utc};

use crate::models::SensorId;

/// Result type for query engine operations.
pub type Result<T> = std::result::Result<T, SensorError>;

/// Errors surfaced to callers of [`SensorService`](crate::service::SensorService).
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// Reading is missing a required field or the store rejected the write.
    #[error("cannot save reading for sensor {}: {reason}", sensor_label(.sensor_id))]
    Save {
        sensor_id: Option<SensorId>,
        reason: String,
    },

    /// A query matched zero readings.
    #[error("no readings found: {0}")]
    NotFound(String),

    /// End bound precedes start bound after normalization.
    #[error("end date cannot be before start date: start = {start}, end = {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Caller supplied a parameter that could not be interpreted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Statistic could not be computed for a specific sensor during aggregation.
    #[error("failed to calculate {statistic} metrics for sensor {sensor_id}: {source}")]
    Aggregation {
        sensor_id: SensorId,
        statistic: String,
        #[source]
        source: CalculationError,
    },

    /// A reading could not be turned into its projected view.
    #[error("cannot process readings: {0}")]
    Processing(String),

    /// Backing store failed while answering a query.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn sensor_label(sensor_id: &Option<SensorId>) -> String {
    sensor_id
        .as_ref()
        .map_or_else(|| "<missing>".to_string(), SensorId::to_string)
}

/// Errors from the statistics engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationError {
    #[error("cannot calculate {statistic} of an empty value set")]
    Empty { statistic: String },

    #[error("invalid statistic: {0}")]
    UnknownStatistic(String),

    #[error("{statistic} is not a finite number: {value}")]
    NonFinite { statistic: String, value: f64 },
}

/// Errors raised by a [`ReadingStore`](crate::store::ReadingStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
