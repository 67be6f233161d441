//! Reading persistence boundary.
//!
//! The query engine only needs to insert a reading and look readings up by
//! sensor id and/or inclusive time range. This gateway module exposes the
//! [`ReadingStore`] trait and its two backends (EMBP):
//! - [`PgReadingStore`] backed by PostgreSQL through `sqlx`
//! - [`InMemoryReadingStore`] for tests and database-less runs
//!
//! A single `save` is atomic in both backends; the engine adds no locking of
//! its own around writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{PendingReading, Reading, SensorId};

mod memory;
mod postgres;

pub use memory::InMemoryReadingStore;
pub use postgres::PgReadingStore;

// ---

/// Storage contract consumed by [`SensorService`](crate::service::SensorService).
///
/// All range lookups treat both bounds as inclusive and return readings
/// ordered by timestamp, then id.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Insert a reading, returning it with its assigned identifier.
    async fn save(&self, reading: PendingReading) -> Result<Reading, StoreError>;

    async fn find_all(&self) -> Result<Vec<Reading>, StoreError>;

    async fn find_by_sensor_id(&self, sensor_id: &SensorId) -> Result<Vec<Reading>, StoreError>;

    async fn find_by_sensor_id_and_timestamp_between(
        &self,
        sensor_id: &SensorId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError>;

    async fn find_by_sensor_ids_and_timestamp_between(
        &self,
        sensor_ids: &[SensorId],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError>;
}
