//! Per-field projection endpoints.

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::{parse_timestamp, ApiQuery};
use crate::{MetricSelection, ProjectedReading, SensorError, SensorId, SensorService};

// ---

pub fn router() -> Router<SensorService> {
    // ---
    Router::new()
        .route("/sensors/get-metrics", get(get_metrics))
        .route("/sensors/get-metrics-and-time-period", get(get_metrics_in_range))
}

/// Query parameters shared by both projection endpoints. Metric flags default
/// to `false`; dates are only read by the time-period variant.
#[derive(Debug, Deserialize)]
struct MetricsQuery {
    sensor_id: SensorId,
    #[serde(default)]
    temperature: bool,
    #[serde(default)]
    humidity: bool,
    #[serde(default)]
    wind: bool,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl MetricsQuery {
    fn selection(&self) -> MetricSelection {
        MetricSelection::new(self.temperature, self.humidity, self.wind)
    }
}

async fn get_metrics(
    State(service): State<SensorService>,
    ApiQuery(params): ApiQuery<MetricsQuery>,
) -> Result<Json<Vec<ProjectedReading>>, SensorError> {
    // ---
    info!("GET /sensors/get-metrics - {:?}", params);
    let projected = service
        .get_metrics_for_sensor(&params.sensor_id, params.selection())
        .await?;
    Ok(Json(projected))
}

async fn get_metrics_in_range(
    State(service): State<SensorService>,
    ApiQuery(params): ApiQuery<MetricsQuery>,
) -> Result<Json<Vec<ProjectedReading>>, SensorError> {
    // ---
    info!("GET /sensors/get-metrics-and-time-period - {:?}", params);
    let start = parse_timestamp("start_date", params.start_date.as_deref())?;
    let end = parse_timestamp("end_date", params.end_date.as_deref())?;

    let projected = service
        .get_metrics_in_range(&params.sensor_id, params.selection(), start, end)
        .await?;
    Ok(Json(projected))
}
