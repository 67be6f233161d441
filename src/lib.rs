//! Query and aggregation engine for weather sensor readings.
//!
//! Readings (temperature, humidity, wind speed per sensor) are ingested with a
//! server-assigned timestamp and can then be retrieved raw, projected onto a
//! subset of metrics, filtered by time range, or reduced to min/max/sum/avg per
//! sensor.
//!
//! Module boundaries follow the Explicit Module Boundary Pattern (EMBP): the
//! binary in `main.rs` only talks to `config`, `schema`, `store` and `routes`,
//! and the route handlers only talk to [`SensorService`].

pub mod config;
pub mod error;
pub mod models;
pub mod projection;
pub mod routes;
pub mod schema;
pub mod service;
pub mod stats;
pub mod store;
pub mod validation;

pub use config::{Config, StoreBackend};
pub use error::{CalculationError, SensorError, StoreError};
pub use models::{
    AggregationResult, Metric, MetricSelection, NewReading, PendingReading, ProjectedReading,
    Reading, SensorId, TimeRange,
};
pub use service::{Clock, SensorService};
pub use stats::Statistic;
pub use store::{InMemoryReadingStore, PgReadingStore, ReadingStore};
