//! Cross-sensor statistics endpoint.

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::{parse_sensor_ids, parse_timestamp, ApiQuery};
use crate::{AggregationResult, MetricSelection, SensorError, SensorService};

// ---

pub fn router() -> Router<SensorService> {
    // ---
    Router::new().route(
        "/sensors/get-metrics-and-time-period-with-constraint",
        get(aggregate),
    )
}

fn default_statistic() -> String {
    "avg".to_string()
}

#[derive(Debug, Deserialize)]
struct AggregateQuery {
    /// Comma separated, e.g. `11,12`.
    sensor_ids: String,
    #[serde(default)]
    temperature: bool,
    #[serde(default)]
    humidity: bool,
    #[serde(default)]
    wind: bool,
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default = "default_statistic")]
    statistic: String,
}

impl AggregateQuery {
    fn selection(&self) -> MetricSelection {
        MetricSelection::new(self.temperature, self.humidity, self.wind)
    }
}

async fn aggregate(
    State(service): State<SensorService>,
    ApiQuery(params): ApiQuery<AggregateQuery>,
) -> Result<Json<Vec<AggregationResult>>, SensorError> {
    // ---
    info!(
        "GET /sensors/get-metrics-and-time-period-with-constraint - {:?}",
        params
    );
    let sensor_ids = parse_sensor_ids(&params.sensor_ids)?;
    let start = parse_timestamp("start_date", params.start_date.as_deref())?;
    let end = parse_timestamp("end_date", params.end_date.as_deref())?;

    let results = service
        .aggregate(&sensor_ids, params.selection(), start, end, &params.statistic)
        .await?;
    Ok(Json(results))
}
