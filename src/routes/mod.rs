//! HTTP gateway for the sensor service (EMBP).
//!
//! Sibling modules each export a subrouter; this gateway merges them, attaches
//! the shared [`SensorService`] state and owns the mapping from
//! [`SensorError`] to HTTP responses.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::{SensorError, SensorId, SensorService};

mod aggregate;
mod health;
mod metrics;
mod readings;

// ---

pub fn router(service: SensorService) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(metrics::router())
        .merge(aggregate::router())
        .merge(health::router())
        .with_state(service)
}

/// JSON body returned for every failed request.
#[derive(Serialize)]
struct ErrorBody {
    timestamp: DateTime<Utc>,
    error: &'static str,
    message: String,
}

impl SensorError {
    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            SensorError::Save { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "Sensor Save Error"),
            SensorError::Processing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Processing Error"),
            SensorError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Store Error"),
            SensorError::NotFound(_) => (StatusCode::NOT_FOUND, "Sensor Not Found"),
            SensorError::InvalidRange { .. } => (StatusCode::BAD_REQUEST, "Invalid Range"),
            SensorError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid Input"),
            SensorError::Aggregation { .. } => {
                (StatusCode::BAD_REQUEST, "Metric Calculation Error")
            }
        }
    }
}

impl IntoResponse for SensorError {
    fn into_response(self) -> Response {
        // ---
        let (status, label) = self.status_and_label();
        if status.is_server_error() {
            tracing::error!("{}: {}", label, self);
        } else {
            tracing::debug!("{}: {}", label, self);
        }

        let body = ErrorBody {
            timestamp: Utc::now(),
            error: label,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// `Query` extractor whose rejection is a JSON [`SensorError::InvalidInput`]
/// instead of axum's plain-text body.
struct ApiQuery<T>(T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SensorError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // ---
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| SensorError::InvalidInput(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// `Json` body extractor with the same error shape as [`ApiQuery`].
struct ApiJson<T>(T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = SensorError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // ---
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| SensorError::InvalidInput(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// Parse an optional date query parameter. Accepts RFC 3339 or a zone-less
/// ISO date-time, which is taken as UTC.
fn parse_timestamp(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, SensorError> {
    // ---
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| SensorError::InvalidInput(format!("{name} '{raw}': {e}")))
}

/// Parse a comma separated sensor id list such as `11,12`.
fn parse_sensor_ids(raw: &str) -> Result<Vec<SensorId>, SensorError> {
    // ---
    let ids: Vec<SensorId> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SensorId::from)
        .collect();

    if ids.is_empty() {
        return Err(SensorError::InvalidInput("sensor_ids must not be empty".into()));
    }
    Ok(ids)
}
