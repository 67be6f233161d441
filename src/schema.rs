//! Database schema management for `weather-sensorflow`.
//!
//! Ensures the readings table and its lookup index exist before serving
//! requests. Applied once on startup from `main.rs` (EMBP: single gateway call)
//! when the PostgreSQL store is selected.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the database schema (idempotent).
///
/// Metric columns are nullable so rows written before all three metrics were
/// mandatory can still be read; new writes always fill them.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_readings (
            id          BIGSERIAL PRIMARY KEY,
            sensor_id   TEXT             NOT NULL,
            timestamp   TIMESTAMPTZ      NOT NULL,
            temperature DOUBLE PRECISION,
            humidity    DOUBLE PRECISION,
            wind_speed  DOUBLE PRECISION
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Every range query filters on sensor then timestamp
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_readings_sensor_ts
            ON sensor_readings (sensor_id, timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
