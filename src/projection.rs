//! Per-field projection of stored readings.

use crate::error::{Result, SensorError};
use crate::models::{Metric, MetricSelection, ProjectedReading, Reading};

// ---

/// Project each reading onto the selected metrics, preserving order.
///
/// Unselected metrics are absent in the output. The batch is all-or-nothing:
/// a requested metric holding a non-finite value fails the whole call, since
/// it cannot be told apart from an absent field once serialized.
pub fn project(readings: &[Reading], selection: MetricSelection) -> Result<Vec<ProjectedReading>> {
    // ---
    if readings.is_empty() {
        return Err(SensorError::NotFound(
            "no sensor readings to project metrics from".to_string(),
        ));
    }

    readings.iter().map(|r| project_one(r, selection)).collect()
}

fn project_one(reading: &Reading, selection: MetricSelection) -> Result<ProjectedReading> {
    // ---
    let pick = |metric: Metric| -> Result<Option<f64>> {
        if !selection.wants(metric) {
            return Ok(None);
        }
        match reading.metric(metric) {
            Some(v) if !v.is_finite() => Err(SensorError::Processing(format!(
                "reading {} for sensor {} has non-finite {}: {}",
                reading.id,
                reading.sensor_id,
                metric.name(),
                v
            ))),
            value => Ok(value),
        }
    };

    Ok(ProjectedReading {
        id: reading.id,
        sensor_id: reading.sensor_id.clone(),
        timestamp: reading.timestamp,
        temperature: pick(Metric::Temperature)?,
        humidity: pick(Metric::Humidity)?,
        wind_speed: pick(Metric::WindSpeed)?,
    })
}
