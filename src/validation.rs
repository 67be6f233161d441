//! Input validation and time range normalization.
//!
//! Writes are checked for required fields only. Metric values are not range
//! checked: a negative humidity is stored as given.

use chrono::{DateTime, Utc};

use crate::error::{Result, SensorError};
use crate::models::{NewReading, PendingReading, TimeRange};

// ---

/// Check that a submitted reading carries a sensor id and all three metrics,
/// and stamp it with the server-side ingestion time.
pub fn validate_for_save(reading: &NewReading, timestamp: DateTime<Utc>) -> Result<PendingReading> {
    // ---
    let missing = |field: &str| SensorError::Save {
        sensor_id: reading.sensor_id.clone(),
        reason: format!("{field} is needed to create reading"),
    };

    let sensor_id = reading.sensor_id.clone().ok_or_else(|| missing("sensor_id"))?;
    let temperature = reading.temperature.ok_or_else(|| missing("temperature"))?;
    let humidity = reading.humidity.ok_or_else(|| missing("humidity"))?;
    let wind_speed = reading.wind_speed.ok_or_else(|| missing("wind_speed"))?;

    Ok(PendingReading {
        sensor_id,
        timestamp,
        temperature,
        humidity,
        wind_speed,
    })
}

/// Fill in open range bounds and reject inverted ranges, evaluating an open
/// end against the current time.
pub fn normalize_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<TimeRange> {
    normalize_range_at(start, end, Utc::now())
}

/// Same as [`normalize_range`] with an explicit "now". An unset start becomes
/// the Unix epoch, an unset end becomes `now`. Bounds are never swapped.
pub fn normalize_range_at(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<TimeRange> {
    // ---
    let start = start.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let end = end.unwrap_or(now);

    if end < start {
        return Err(SensorError::InvalidRange { start, end });
    }

    Ok(TimeRange { start, end })
}
