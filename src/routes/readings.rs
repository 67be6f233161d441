//! Ingestion and raw retrieval endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::{parse_sensor_ids, parse_timestamp, ApiJson, ApiQuery};
use crate::{NewReading, Reading, SensorError, SensorId, SensorService};

// ---

pub fn router() -> Router<SensorService> {
    // ---
    Router::new()
        .route("/sensors/create-reading", post(create_reading))
        .route("/sensors/get-all", get(get_all))
        .route("/sensors/get-readings", get(get_readings))
        .route("/sensors/get-readings-in-range", get(get_readings_in_range))
        .route("/sensors/get-readings-for-sensors", get(get_readings_for_sensors))
}

/// Handle `POST /sensors/create-reading`. The timestamp is assigned here on
/// the server; any client-side value is ignored.
async fn create_reading(
    State(service): State<SensorService>,
    ApiJson(reading): ApiJson<NewReading>,
) -> Result<(StatusCode, Json<Reading>), SensorError> {
    // ---
    info!("POST /sensors/create-reading - sensor {:?}", reading.sensor_id);
    let stored = service.save_reading(reading).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn get_all(State(service): State<SensorService>) -> Result<Json<Vec<Reading>>, SensorError> {
    // ---
    info!("GET /sensors/get-all");
    Ok(Json(service.get_all_readings().await?))
}

#[derive(Debug, Deserialize)]
struct SensorQuery {
    sensor_id: SensorId,
}

async fn get_readings(
    State(service): State<SensorService>,
    ApiQuery(params): ApiQuery<SensorQuery>,
) -> Result<Json<Vec<Reading>>, SensorError> {
    // ---
    info!("GET /sensors/get-readings - {:?}", params);
    Ok(Json(service.get_readings_for_sensor(&params.sensor_id).await?))
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    sensor_id: SensorId,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn get_readings_in_range(
    State(service): State<SensorService>,
    ApiQuery(params): ApiQuery<RangeQuery>,
) -> Result<Json<Vec<Reading>>, SensorError> {
    // ---
    info!("GET /sensors/get-readings-in-range - {:?}", params);
    let start = parse_timestamp("start_date", params.start_date.as_deref())?;
    let end = parse_timestamp("end_date", params.end_date.as_deref())?;

    let readings = service
        .get_readings_in_range(&params.sensor_id, start, end)
        .await?;
    Ok(Json(readings))
}

#[derive(Debug, Deserialize)]
struct MultiRangeQuery {
    sensor_ids: String,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn get_readings_for_sensors(
    State(service): State<SensorService>,
    ApiQuery(params): ApiQuery<MultiRangeQuery>,
) -> Result<Json<Vec<Reading>>, SensorError> {
    // ---
    info!("GET /sensors/get-readings-for-sensors - {:?}", params);
    let sensor_ids = parse_sensor_ids(&params.sensor_ids)?;
    let start = parse_timestamp("start_date", params.start_date.as_deref())?;
    let end = parse_timestamp("end_date", params.end_date.as_deref())?;

    let readings = service
        .get_readings_for_sensors_in_range(&sensor_ids, start, end)
        .await?;
    Ok(Json(readings))
}
