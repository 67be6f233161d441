//! Data models for the weather sensor service.
//!
//! Stored readings, the projected views derived from them, and the per-sensor
//! aggregation records returned by the query engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Opaque sensor identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct SensorId(String);

impl SensorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SensorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Reading as submitted by a client. Every field is optional on the wire;
/// `validation::validate_for_save` decides whether it may be stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReading {
    // ---
    pub sensor_id: Option<SensorId>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Validated reading stamped with its server-side ingestion time, ready to be
/// handed to a [`ReadingStore`](crate::store::ReadingStore).
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReading {
    // ---
    pub sensor_id: SensorId,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
}

/// Stored sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Reading {
    // ---
    pub id: i64,
    pub sensor_id: SensorId,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
}

impl Reading {
    /// Build the stored form of a pending reading once the store has assigned
    /// its identifier.
    pub fn from_pending(id: i64, pending: PendingReading) -> Self {
        // ---
        Reading {
            id,
            sensor_id: pending.sensor_id,
            timestamp: pending.timestamp,
            temperature: Some(pending.temperature),
            humidity: Some(pending.humidity),
            wind_speed: Some(pending.wind_speed),
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::WindSpeed => self.wind_speed,
        }
    }
}

/// The three measured quantities of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
    WindSpeed,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Temperature, Metric::Humidity, Metric::WindSpeed];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::WindSpeed => "wind_speed",
        }
    }
}

/// Which metrics a caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricSelection {
    // ---
    pub temperature: bool,
    pub humidity: bool,
    pub wind: bool,
}

impl MetricSelection {
    pub fn new(temperature: bool, humidity: bool, wind: bool) -> Self {
        Self {
            temperature,
            humidity,
            wind,
        }
    }

    pub fn all() -> Self {
        Self::new(true, true, true)
    }

    pub fn wants(&self, metric: Metric) -> bool {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::WindSpeed => self.wind,
        }
    }

    /// Requested metrics in their canonical order.
    pub fn requested(&self) -> impl Iterator<Item = Metric> + '_ {
        Metric::ALL.into_iter().filter(|m| self.wants(*m))
    }
}

/// Read-only view of a [`Reading`] exposing only the requested metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedReading {
    // ---
    pub id: i64,
    pub sensor_id: SensorId,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
}

/// Normalized, inclusive time range. Construct through
/// [`validation::normalize_range`](crate::validation::normalize_range).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Statistic computed for one sensor over one time range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    // ---
    pub sensor_id: SensorId,
    pub statistic: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
}

impl AggregationResult {
    pub fn new(sensor_id: SensorId, statistic: &str, range: TimeRange) -> Self {
        // ---
        AggregationResult {
            sensor_id,
            statistic: statistic.to_string(),
            start: range.start,
            end: range.end,
            temperature: None,
            humidity: None,
            wind_speed: None,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Temperature => self.temperature = Some(value),
            Metric::Humidity => self.humidity = Some(value),
            Metric::WindSpeed => self.wind_speed = Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn create_test_reading() -> Reading {
        // ---
        Reading {
            id: 7,
            sensor_id: SensorId::from("11"),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
            temperature: Some(0.0),
            humidity: None,
            wind_speed: Some(12.5),
        }
    }

    #[test]
    fn test_absent_metrics_are_omitted_from_json() {
        // ---
        let json = serde_json::to_value(create_test_reading()).unwrap();

        assert_eq!(json["sensor_id"], "11");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["wind_speed"], 12.5);
        assert!(json.get("humidity").is_none());
    }

    #[test]
    fn test_new_reading_accepts_partial_payload() {
        // ---
        let raw: NewReading =
            serde_json::from_str(r#"{"sensor_id":"11","humidity":-4.0}"#).unwrap();

        assert_eq!(raw.sensor_id, Some(SensorId::from("11")));
        assert_eq!(raw.humidity, Some(-4.0));
        assert!(raw.temperature.is_none());
        assert!(raw.wind_speed.is_none());
    }

    #[test]
    fn test_metric_selection_order() {
        // ---
        let selection = MetricSelection::new(true, false, true);
        let requested: Vec<Metric> = selection.requested().collect();

        assert_eq!(requested, vec![Metric::Temperature, Metric::WindSpeed]);
        assert_eq!(MetricSelection::default().requested().count(), 0);
    }

    #[test]
    fn test_aggregation_result_starts_empty() {
        // ---
        let range = TimeRange {
            start: DateTime::<Utc>::UNIX_EPOCH,
            end: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        };
        let mut result = AggregationResult::new(SensorId::from("11"), "AVG", range);
        result.set(Metric::WindSpeed, 3.0);

        assert_eq!(result.statistic, "AVG");
        assert_eq!(result.temperature, None);
        assert_eq!(result.humidity, None);
        assert_eq!(result.wind_speed, Some(3.0));
    }
}
