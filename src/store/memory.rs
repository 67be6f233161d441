//! In-process [`ReadingStore`] kept behind an async `RwLock`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::ReadingStore;
use crate::error::StoreError;
use crate::models::{PendingReading, Reading, SensorId};

// ---

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    readings: Vec<Reading>,
}

/// Volatile reading store. Ids start at 1 and increase monotonically.
#[derive(Debug, Default)]
pub struct InMemoryReadingStore {
    inner: RwLock<Inner>,
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, keep: F) -> Vec<Reading>
    where
        F: Fn(&Reading) -> bool,
    {
        // ---
        let inner = self.inner.read().await;
        let mut found: Vec<Reading> = inner.readings.iter().filter(|r| keep(r)).cloned().collect();
        found.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        found
    }
}

#[async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn save(&self, reading: PendingReading) -> Result<Reading, StoreError> {
        // ---
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let stored = Reading::from_pending(inner.next_id, reading);
        inner.readings.push(stored.clone());
        Ok(stored)
    }

    async fn find_all(&self) -> Result<Vec<Reading>, StoreError> {
        Ok(self.select(|_| true).await)
    }

    async fn find_by_sensor_id(&self, sensor_id: &SensorId) -> Result<Vec<Reading>, StoreError> {
        Ok(self.select(|r| &r.sensor_id == sensor_id).await)
    }

    async fn find_by_sensor_id_and_timestamp_between(
        &self,
        sensor_id: &SensorId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        // ---
        Ok(self
            .select(|r| &r.sensor_id == sensor_id && start <= r.timestamp && r.timestamp <= end)
            .await)
    }

    async fn find_by_sensor_ids_and_timestamp_between(
        &self,
        sensor_ids: &[SensorId],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        // ---
        Ok(self
            .select(|r| {
                sensor_ids.contains(&r.sensor_id) && start <= r.timestamp && r.timestamp <= end
            })
            .await)
    }
}
