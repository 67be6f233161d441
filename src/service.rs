//! Query and aggregation orchestrator.
//!
//! [`SensorService`] composes validation, the reading store, projection and
//! the statistics engine. It holds no mutable state of its own: every
//! operation is a function of its inputs and the store's current contents.
//! Empty results are always reported as [`SensorError::NotFound`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{Result, SensorError};
use crate::models::{
    AggregationResult, MetricSelection, NewReading, ProjectedReading, Reading, SensorId, TimeRange,
};
use crate::projection::project;
use crate::stats::calculate;
use crate::store::ReadingStore;
use crate::validation::{normalize_range_at, validate_for_save};

/// Source of "now" for ingestion timestamps and open range ends.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// ---

#[derive(Clone)]
pub struct SensorService {
    store: Arc<dyn ReadingStore>,
    clock: Clock,
}

impl SensorService {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self::with_clock(store, Arc::new(Utc::now))
    }

    pub fn with_clock(store: Arc<dyn ReadingStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    fn range(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<TimeRange> {
        normalize_range_at(start, end, (self.clock)())
    }

    /// Validate and store a new reading, stamping it with the server time.
    pub async fn save_reading(&self, reading: NewReading) -> Result<Reading> {
        // ---
        let pending = validate_for_save(&reading, (self.clock)())?;
        let sensor_id = pending.sensor_id.clone();

        let stored = self.store.save(pending).await.map_err(|e| {
            warn!("Store rejected reading for sensor {}: {}", sensor_id, e);
            SensorError::Save {
                sensor_id: Some(sensor_id.clone()),
                reason: e.to_string(),
            }
        })?;

        info!("Saved reading {} for sensor {}", stored.id, stored.sensor_id);
        Ok(stored)
    }

    pub async fn get_all_readings(&self) -> Result<Vec<Reading>> {
        // ---
        let readings = self.store.find_all().await?;
        non_empty(readings, || "no sensor readings in database".to_string())
    }

    pub async fn get_readings_for_sensor(&self, sensor_id: &SensorId) -> Result<Vec<Reading>> {
        // ---
        let readings = self.store.find_by_sensor_id(sensor_id).await?;
        non_empty(readings, || format!("no readings for sensor {sensor_id}"))
    }

    pub async fn get_metrics_for_sensor(
        &self,
        sensor_id: &SensorId,
        selection: MetricSelection,
    ) -> Result<Vec<ProjectedReading>> {
        // ---
        let readings = self.get_readings_for_sensor(sensor_id).await?;
        project(&readings, selection)
    }

    pub async fn get_readings_in_range(
        &self,
        sensor_id: &SensorId,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Reading>> {
        // ---
        let range = self.range(start, end)?;
        self.fetch_in_range(sensor_id, range).await
    }

    /// Readings of several sensors in one inclusive range, ordered by timestamp.
    pub async fn get_readings_for_sensors_in_range(
        &self,
        sensor_ids: &[SensorId],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Reading>> {
        // ---
        let range = self.range(start, end)?;
        let readings = self
            .store
            .find_by_sensor_ids_and_timestamp_between(sensor_ids, range.start, range.end)
            .await?;

        non_empty(readings, || {
            let ids: Vec<&str> = sensor_ids.iter().map(SensorId::as_str).collect();
            format!(
                "no readings for sensors [{}] between {} and {}",
                ids.join(", "),
                range.start,
                range.end
            )
        })
    }

    pub async fn get_metrics_in_range(
        &self,
        sensor_id: &SensorId,
        selection: MetricSelection,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProjectedReading>> {
        // ---
        let readings = self.get_readings_in_range(sensor_id, start, end).await?;
        project(&readings, selection)
    }

    /// Compute `statistic` over each requested metric, one result per sensor in
    /// input order.
    ///
    /// Sensors are processed sequentially and the first failure aborts the
    /// call: later sensors are never fetched and no partial results are
    /// returned.
    pub async fn aggregate(
        &self,
        sensor_ids: &[SensorId],
        selection: MetricSelection,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        statistic: &str,
    ) -> Result<Vec<AggregationResult>> {
        // ---
        let range = self.range(start, end)?;
        debug!(
            "Aggregating {} over {} sensor(s) between {} and {}",
            statistic,
            sensor_ids.len(),
            range.start,
            range.end
        );

        let mut results = Vec::with_capacity(sensor_ids.len());
        for sensor_id in sensor_ids {
            let readings = self.fetch_in_range(sensor_id, range).await?;
            let mut result = AggregationResult::new(sensor_id.clone(), statistic, range);

            for metric in selection.requested() {
                let values: Vec<f64> = readings.iter().filter_map(|r| r.metric(metric)).collect();
                let value = calculate(&values, statistic).map_err(|source| {
                    SensorError::Aggregation {
                        sensor_id: sensor_id.clone(),
                        statistic: statistic.to_string(),
                        source,
                    }
                })?;
                result.set(metric, value);
            }

            results.push(result);
        }

        info!("Aggregation complete, returning {} result(s)", results.len());
        Ok(results)
    }

    async fn fetch_in_range(&self, sensor_id: &SensorId, range: TimeRange) -> Result<Vec<Reading>> {
        // ---
        let readings = self
            .store
            .find_by_sensor_id_and_timestamp_between(sensor_id, range.start, range.end)
            .await?;

        non_empty(readings, || {
            format!(
                "no readings for sensor {} between {} and {}",
                sensor_id, range.start, range.end
            )
        })
    }
}

fn non_empty<F>(readings: Vec<Reading>, describe: F) -> Result<Vec<Reading>>
where
    F: FnOnce() -> String,
{
    if readings.is_empty() {
        let msg = describe();
        debug!("Empty result: {}", msg);
        return Err(SensorError::NotFound(msg));
    }
    Ok(readings)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::{CalculationError, StoreError};
    use crate::models::PendingReading;
    use crate::store::InMemoryReadingStore;
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    fn fixed_clock(now: DateTime<Utc>) -> Clock {
        Arc::new(move || now)
    }

    fn new_reading(sensor: &str, temp: f64, humidity: f64, wind: f64) -> NewReading {
        NewReading {
            sensor_id: Some(sensor.into()),
            temperature: Some(temp),
            humidity: Some(humidity),
            wind_speed: Some(wind),
        }
    }

    /// Service with sensor "11" holding (10,20,5) at 01:00 and (30,40,15) at 02:00.
    async fn seeded_service() -> SensorService {
        // ---
        let store = Arc::new(InMemoryReadingStore::new());
        for (hour, t, h, w) in [(1, 10.0, 20.0, 5.0), (2, 30.0, 40.0, 15.0)] {
            let svc = SensorService::with_clock(store.clone(), fixed_clock(at(hour)));
            svc.save_reading(new_reading("11", t, h, w)).await.unwrap();
        }
        SensorService::with_clock(store, fixed_clock(at(12)))
    }

    struct FailingStore;

    #[async_trait]
    impl ReadingStore for FailingStore {
        async fn save(&self, _: PendingReading) -> std::result::Result<Reading, StoreError> {
            Err(StoreError::Unavailable("DB FAILED".into()))
        }
        async fn find_all(&self) -> std::result::Result<Vec<Reading>, StoreError> {
            Err(StoreError::Unavailable("DB FAILED".into()))
        }
        async fn find_by_sensor_id(
            &self,
            _: &SensorId,
        ) -> std::result::Result<Vec<Reading>, StoreError> {
            Err(StoreError::Unavailable("DB FAILED".into()))
        }
        async fn find_by_sensor_id_and_timestamp_between(
            &self,
            _: &SensorId,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> std::result::Result<Vec<Reading>, StoreError> {
            Err(StoreError::Unavailable("DB FAILED".into()))
        }
        async fn find_by_sensor_ids_and_timestamp_between(
            &self,
            _: &[SensorId],
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> std::result::Result<Vec<Reading>, StoreError> {
            Err(StoreError::Unavailable("DB FAILED".into()))
        }
    }

    #[tokio::test]
    async fn test_save_reading_assigns_id_and_server_timestamp() {
        // ---
        let store = Arc::new(InMemoryReadingStore::new());
        let svc = SensorService::with_clock(store, fixed_clock(at(9)));

        let stored = svc.save_reading(new_reading("11", 20.0, 60.0, 5.0)).await.unwrap();

        assert_eq!(stored.id, 1);
        assert_eq!(stored.sensor_id.as_str(), "11");
        assert_eq!(stored.timestamp, at(9));
        assert_eq!(stored.temperature, Some(20.0));
        assert_eq!(stored.humidity, Some(60.0));
        assert_eq!(stored.wind_speed, Some(5.0));
    }

    #[tokio::test]
    async fn test_save_reading_missing_field_never_reaches_store() {
        // ---
        let store = Arc::new(InMemoryReadingStore::new());
        let svc = SensorService::new(store.clone());

        let mut reading = new_reading("11", 20.0, 60.0, 5.0);
        reading.humidity = None;

        let err = svc.save_reading(reading).await.unwrap_err();
        assert!(matches!(err, SensorError::Save { .. }));
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_reading_wraps_store_failure() {
        // ---
        let svc = SensorService::new(Arc::new(FailingStore));

        let err = svc.save_reading(new_reading("11", 20.0, 60.0, 5.0)).await.unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, SensorError::Save { .. }));
        assert!(msg.contains("11") && msg.contains("DB FAILED"), "{msg}");
    }

    #[tokio::test]
    async fn test_query_store_failure_is_surfaced() {
        // ---
        let svc = SensorService::new(Arc::new(FailingStore));
        let err = svc.get_all_readings().await.unwrap_err();
        assert!(matches!(err, SensorError::Store(_)));
    }

    #[tokio::test]
    async fn test_empty_store_is_not_found() {
        // ---
        let svc = SensorService::new(Arc::new(InMemoryReadingStore::new()));

        assert!(matches!(
            svc.get_all_readings().await,
            Err(SensorError::NotFound(_))
        ));
        assert!(matches!(
            svc.get_readings_for_sensor(&"1".into()).await,
            Err(SensorError::NotFound(_))
        ));
        assert!(matches!(
            svc.get_metrics_for_sensor(&"1".into(), MetricSelection::all()).await,
            Err(SensorError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_metrics_for_sensor_projects() {
        // ---
        let svc = seeded_service().await;
        let projected = svc
            .get_metrics_for_sensor(&"11".into(), MetricSelection::new(true, false, false))
            .await
            .unwrap();

        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].temperature, Some(10.0));
        assert_eq!(projected[0].humidity, None);
        assert_eq!(projected[1].wind_speed, None);
    }

    #[tokio::test]
    async fn test_readings_in_range_filters_and_names_query() {
        // ---
        let svc = seeded_service().await;

        let found = svc
            .get_readings_in_range(&"11".into(), Some(at(2)), None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].temperature, Some(30.0));

        let err = svc
            .get_readings_in_range(&"11".into(), Some(at(3)), Some(at(4)))
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::NotFound(ref m) if m.contains("11")));
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected_before_fetch() {
        // ---
        let svc = SensorService::new(Arc::new(FailingStore));
        let err = svc
            .get_metrics_in_range(&"11".into(), MetricSelection::all(), Some(at(5)), Some(at(4)))
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn test_metrics_in_range_projects_humidity_only() {
        // ---
        let svc = seeded_service().await;
        let projected = svc
            .get_metrics_in_range(
                &"11".into(),
                MetricSelection::new(false, true, false),
                None,
                None,
            )
            .await
            .unwrap();

        let humidity: Vec<Option<f64>> = projected.iter().map(|p| p.humidity).collect();
        assert_eq!(humidity, vec![Some(20.0), Some(40.0)]);
        assert!(projected.iter().all(|p| p.temperature.is_none() && p.wind_speed.is_none()));
    }

    #[tokio::test]
    async fn test_readings_for_several_sensors() {
        // ---
        let svc = seeded_service().await;
        let ids = [SensorId::from("11"), SensorId::from("99")];

        let found = svc.get_readings_for_sensors_in_range(&ids, None, None).await.unwrap();
        assert_eq!(found.len(), 2);

        let err = svc
            .get_readings_for_sensors_in_range(&[SensorId::from("99")], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::NotFound(ref m) if m.contains("99")));
    }

    #[tokio::test]
    async fn test_aggregate_each_statistic() {
        // ---
        let svc = seeded_service().await;
        let ids = [SensorId::from("11")];

        let cases = [
            ("avg", 20.0, 30.0, 10.0),
            ("sum", 40.0, 60.0, 20.0),
            ("min", 10.0, 20.0, 5.0),
            ("max", 30.0, 40.0, 15.0),
        ];
        for (stat, t, h, w) in cases {
            let results = svc
                .aggregate(&ids, MetricSelection::all(), Some(at(0)), Some(at(3)), stat)
                .await
                .unwrap();

            assert_eq!(results.len(), 1, "{stat}");
            let r = &results[0];
            assert_eq!(r.sensor_id.as_str(), "11");
            assert_eq!(r.statistic, stat);
            assert_eq!(r.start, at(0));
            assert_eq!(r.end, at(3));
            assert_eq!(r.temperature, Some(t), "{stat}");
            assert_eq!(r.humidity, Some(h), "{stat}");
            assert_eq!(r.wind_speed, Some(w), "{stat}");
        }
    }

    #[tokio::test]
    async fn test_aggregate_fails_on_first_sensor_without_data() {
        // ---
        let svc = seeded_service().await;
        let ids = [SensorId::from("11"), SensorId::from("12")];

        let err = svc
            .aggregate(&ids, MetricSelection::all(), None, None, "avg")
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::NotFound(ref m) if m.contains("12")));
    }

    /// Delegates to an in-memory store and records every per-sensor range
    /// lookup in call order.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryReadingStore,
        range_lookups: std::sync::Mutex<Vec<SensorId>>,
    }

    impl RecordingStore {
        fn range_lookups(&self) -> Vec<SensorId> {
            self.range_lookups.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReadingStore for RecordingStore {
        async fn save(&self, reading: PendingReading) -> std::result::Result<Reading, StoreError> {
            self.inner.save(reading).await
        }
        async fn find_all(&self) -> std::result::Result<Vec<Reading>, StoreError> {
            self.inner.find_all().await
        }
        async fn find_by_sensor_id(
            &self,
            sensor_id: &SensorId,
        ) -> std::result::Result<Vec<Reading>, StoreError> {
            self.inner.find_by_sensor_id(sensor_id).await
        }
        async fn find_by_sensor_id_and_timestamp_between(
            &self,
            sensor_id: &SensorId,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> std::result::Result<Vec<Reading>, StoreError> {
            self.range_lookups.lock().unwrap().push(sensor_id.clone());
            self.inner
                .find_by_sensor_id_and_timestamp_between(sensor_id, start, end)
                .await
        }
        async fn find_by_sensor_ids_and_timestamp_between(
            &self,
            sensor_ids: &[SensorId],
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> std::result::Result<Vec<Reading>, StoreError> {
            self.inner
                .find_by_sensor_ids_and_timestamp_between(sensor_ids, start, end)
                .await
        }
    }

    #[tokio::test]
    async fn test_aggregate_never_fetches_sensors_after_a_missing_one() {
        // ---
        let store = Arc::new(RecordingStore::default());
        let svc = SensorService::with_clock(store.clone(), fixed_clock(at(1)));
        svc.save_reading(new_reading("11", 10.0, 20.0, 5.0)).await.unwrap();

        let ids = [SensorId::from("12"), SensorId::from("11")];
        let err = svc
            .aggregate(&ids, MetricSelection::all(), None, None, "avg")
            .await
            .unwrap_err();

        assert!(matches!(err, SensorError::NotFound(ref m) if m.contains("12")));
        assert_eq!(store.range_lookups(), vec![SensorId::from("12")]);
    }

    #[tokio::test]
    async fn test_aggregate_avg_of_huge_values() {
        // ---
        let store = Arc::new(InMemoryReadingStore::new());
        let svc = SensorService::with_clock(store, fixed_clock(at(1)));
        for _ in 0..2 {
            svc.save_reading(new_reading("11", 1e308, 1.0, 1.0)).await.unwrap();
        }
        let ids = [SensorId::from("11")];
        let temp_only = MetricSelection::new(true, false, false);

        let results = svc.aggregate(&ids, temp_only, None, None, "avg").await.unwrap();
        assert_eq!(results[0].temperature, Some(1e308));

        let err = svc.aggregate(&ids, temp_only, None, None, "sum").await.unwrap_err();
        assert!(matches!(
            err,
            SensorError::Aggregation {
                source: CalculationError::NonFinite { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_aggregate_wind_only() {
        // ---
        let svc = seeded_service().await;
        let results = svc
            .aggregate(
                &[SensorId::from("11")],
                MetricSelection::new(false, false, true),
                None,
                None,
                "avg",
            )
            .await
            .unwrap();

        assert_eq!(results[0].temperature, None);
        assert_eq!(results[0].humidity, None);
        assert_eq!(results[0].wind_speed, Some(10.0));
    }

    #[tokio::test]
    async fn test_aggregate_unknown_statistic_names_sensor() {
        // ---
        let svc = seeded_service().await;
        let err = svc
            .aggregate(&[SensorId::from("11")], MetricSelection::all(), None, None, "median")
            .await
            .unwrap_err();

        match err {
            SensorError::Aggregation {
                sensor_id,
                statistic,
                source,
            } => {
                assert_eq!(sensor_id.as_str(), "11");
                assert_eq!(statistic, "median");
                assert_eq!(source, CalculationError::UnknownStatistic("median".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Store serving a fixed set of rows, standing in for legacy data with
    /// null metric columns.
    struct FixedStore(Vec<Reading>);

    #[async_trait]
    impl ReadingStore for FixedStore {
        async fn save(&self, _: PendingReading) -> std::result::Result<Reading, StoreError> {
            Err(StoreError::Unavailable("read only".into()))
        }
        async fn find_all(&self) -> std::result::Result<Vec<Reading>, StoreError> {
            Ok(self.0.clone())
        }
        async fn find_by_sensor_id(
            &self,
            _: &SensorId,
        ) -> std::result::Result<Vec<Reading>, StoreError> {
            Ok(self.0.clone())
        }
        async fn find_by_sensor_id_and_timestamp_between(
            &self,
            _: &SensorId,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> std::result::Result<Vec<Reading>, StoreError> {
            Ok(self.0.clone())
        }
        async fn find_by_sensor_ids_and_timestamp_between(
            &self,
            _: &[SensorId],
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> std::result::Result<Vec<Reading>, StoreError> {
            Ok(self.0.clone())
        }
    }

    fn legacy_row(id: i64, temperature: Option<f64>, humidity: Option<f64>) -> Reading {
        Reading {
            id,
            sensor_id: "11".into(),
            timestamp: at(1),
            temperature,
            humidity,
            wind_speed: None,
        }
    }

    #[tokio::test]
    async fn test_aggregate_skips_absent_stored_values() {
        // ---
        let store = FixedStore(vec![
            legacy_row(1, Some(10.0), None),
            legacy_row(2, None, Some(40.0)),
            legacy_row(3, Some(50.0), Some(20.0)),
        ]);
        let svc = SensorService::new(Arc::new(store));

        let results = svc
            .aggregate(
                &[SensorId::from("11")],
                MetricSelection::new(true, true, false),
                None,
                None,
                "avg",
            )
            .await
            .unwrap();
        assert_eq!(results[0].temperature, Some(30.0));
        assert_eq!(results[0].humidity, Some(30.0));
    }

    #[tokio::test]
    async fn test_aggregate_all_absent_column_is_calculation_error() {
        // ---
        let svc = SensorService::new(Arc::new(FixedStore(vec![legacy_row(1, Some(1.0), None)])));

        let err = svc
            .aggregate(&[SensorId::from("11")], MetricSelection::all(), None, None, "sum")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SensorError::Aggregation {
                source: CalculationError::Empty { .. },
                ..
            }
        ));
    }
}
