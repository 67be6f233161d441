//! PostgreSQL-backed [`ReadingStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::ReadingStore;
use crate::error::StoreError;
use crate::models::{PendingReading, Reading, SensorId};

// ---

const SELECT_READINGS: &str = r#"
    SELECT id, sensor_id, timestamp, temperature, humidity, wind_speed
    FROM sensor_readings
"#;

/// Reading store over the `sensor_readings` table created by
/// [`schema::create_schema`](crate::schema::create_schema).
#[derive(Debug, Clone)]
pub struct PgReadingStore {
    pool: PgPool,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn save(&self, reading: PendingReading) -> Result<Reading, StoreError> {
        // ---
        let stored = sqlx::query_as::<_, Reading>(
            r#"
            INSERT INTO sensor_readings (sensor_id, timestamp, temperature, humidity, wind_speed)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, sensor_id, timestamp, temperature, humidity, wind_speed
            "#,
        )
        .bind(&reading.sensor_id)
        .bind(reading.timestamp)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.wind_speed)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn find_all(&self) -> Result<Vec<Reading>, StoreError> {
        // ---
        let sql = format!("{SELECT_READINGS} ORDER BY timestamp, id");
        Ok(sqlx::query_as::<_, Reading>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_sensor_id(&self, sensor_id: &SensorId) -> Result<Vec<Reading>, StoreError> {
        // ---
        let sql = format!("{SELECT_READINGS} WHERE sensor_id = $1 ORDER BY timestamp, id");
        Ok(sqlx::query_as::<_, Reading>(&sql)
            .bind(sensor_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_sensor_id_and_timestamp_between(
        &self,
        sensor_id: &SensorId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        // ---
        let sql = format!(
            "{SELECT_READINGS} WHERE sensor_id = $1 AND timestamp BETWEEN $2 AND $3 \
             ORDER BY timestamp, id"
        );
        Ok(sqlx::query_as::<_, Reading>(&sql)
            .bind(sensor_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_sensor_ids_and_timestamp_between(
        &self,
        sensor_ids: &[SensorId],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        // ---
        let ids: Vec<String> = sensor_ids.iter().map(SensorId::to_string).collect();
        let sql = format!(
            "{SELECT_READINGS} WHERE sensor_id = ANY($1) AND timestamp BETWEEN $2 AND $3 \
             ORDER BY timestamp, id"
        );
        Ok(sqlx::query_as::<_, Reading>(&sql)
            .bind(ids)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?)
    }
}
