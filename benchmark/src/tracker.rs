//! @ai:module:intent Benchmark run lifecycle and query operations
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkTracker
//! @ai:module:stateless false

use crate::error::{Result, TrackerError};
use crate::model::run::require_non_blank;
use crate::model::{
    validate_measurements, Benchmark, BenchmarkRun, Measurement, PageRequest, RunKey, RunState,
    TimeRange,
};
use crate::store::BenchmarkRunStore;
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;

/// @ai:intent Current UTC time at storage precision (microseconds)
/// @ai:effects time
fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// @ai:intent Records run and execution start/finish transitions and answers queries
pub struct BenchmarkTracker<S: BenchmarkRunStore> {
    store: Arc<S>,
}

impl<S: BenchmarkRunStore> BenchmarkTracker<S> {
    /// @ai:intent Create a tracker over a store
    /// @ai:effects pure
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// @ai:intent Start a new run of a named benchmark
    /// @ai:pre (name, sequence_id) has not been started before
    /// @ai:post run exists with started set, ended absent
    /// @ai:effects db:write, time
    pub fn start_benchmark_run(&self, name: &str, sequence_id: &str) -> Result<()> {
        let key = RunKey::new(name, sequence_id)?;
        let started = now_utc();

        self.store.insert_run(&key, started)?;

        tracing::info!("Started benchmark run {} at {}", key, started.to_rfc3339());
        Ok(())
    }

    /// @ai:intent Finish a running run and attach its measurements
    /// @ai:pre run is running, measurement names are unique
    /// @ai:post run has ended set and exactly the given measurements
    /// @ai:effects db:write, time
    pub fn finish_benchmark_run(
        &self,
        name: &str,
        sequence_id: &str,
        measurements: &[Measurement],
    ) -> Result<()> {
        let key = RunKey::new(name, sequence_id)?;
        validate_measurements(measurements)?;
        let ended = now_utc();

        self.store.finish_run(&key, ended, measurements)?;

        tracing::info!(
            "Finished benchmark run {} with {} measurements",
            key,
            measurements.len()
        );
        Ok(())
    }

    /// @ai:intent Start an execution inside a running run
    /// @ai:pre run is running, execution_sequence_id is new within the run
    /// @ai:effects db:write, time
    pub fn start_execution(
        &self,
        name: &str,
        sequence_id: &str,
        execution_sequence_id: &str,
    ) -> Result<()> {
        let key = RunKey::new(name, sequence_id)?;
        require_non_blank("execution sequence id", execution_sequence_id)?;
        let started = now_utc();

        self.store
            .insert_execution(&key, execution_sequence_id, started)?;

        tracing::info!("Started execution {} of benchmark run {}", execution_sequence_id, key);
        Ok(())
    }

    /// @ai:intent Finish a running execution and attach its measurements
    /// @ai:pre execution is running, measurement names are unique
    /// @ai:effects db:write, time
    pub fn finish_execution(
        &self,
        name: &str,
        sequence_id: &str,
        execution_sequence_id: &str,
        measurements: &[Measurement],
    ) -> Result<()> {
        let key = RunKey::new(name, sequence_id)?;
        require_non_blank("execution sequence id", execution_sequence_id)?;
        validate_measurements(measurements)?;
        let ended = now_utc();

        self.store
            .finish_execution(&key, execution_sequence_id, ended, measurements)?;

        tracing::info!(
            "Finished execution {} of benchmark run {} with {} measurements",
            execution_sequence_id,
            key,
            measurements.len()
        );
        Ok(())
    }

    /// @ai:intent Load a run with its executions and measurements
    /// @ai:effects db:read
    pub fn find_benchmark_run(&self, name: &str, sequence_id: &str) -> Result<BenchmarkRun> {
        let key = RunKey::new(name, sequence_id)?;
        tracing::debug!("Looking up benchmark run {}", key);

        self.store
            .find_run(&key)?
            .ok_or_else(|| TrackerError::NotFound(format!("benchmark run {}", key)))
    }

    /// @ai:intent Runs of one benchmark started within range, newest first
    /// @ai:effects db:read
    pub fn find_benchmark(
        &self,
        name: &str,
        range: &TimeRange,
        page: &PageRequest,
    ) -> Result<Benchmark> {
        require_non_blank("benchmark name", name)?;

        let runs = self.store.find_runs(name, range, page)?;
        tracing::debug!(
            "Found {} runs of {} (page={}, size={})",
            runs.len(),
            name,
            page.page,
            page.size
        );

        Ok(Benchmark {
            name: name.to_string(),
            runs,
        })
    }

    /// @ai:intent Most recent run of every distinct benchmark
    /// @ai:effects db:read
    pub fn find_latest(&self, page: &PageRequest) -> Result<Vec<BenchmarkRun>> {
        let runs = self.store.find_latest(page)?;
        tracing::debug!("Found {} latest runs (page={}, size={})", runs.len(), page.page, page.size);
        Ok(runs)
    }

    /// @ai:intent Lifecycle state of a run; NotStarted when it does not exist
    /// @ai:effects db:read
    pub fn run_state(&self, name: &str, sequence_id: &str) -> Result<RunState> {
        let key = RunKey::new(name, sequence_id)?;
        Ok(self
            .store
            .find_run(&key)?
            .map(|run| run.state())
            .unwrap_or(RunState::NotStarted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MeasurementUnit;
    use crate::store::SqliteStore;
    use pretty_assertions::assert_eq;

    fn tracker() -> BenchmarkTracker<SqliteStore> {
        BenchmarkTracker::new(Arc::new(SqliteStore::open_in_memory().unwrap()))
    }

    fn execution_measurements() -> Vec<Measurement> {
        vec![
            Measurement::new("duration", 12.34, MeasurementUnit::Milliseconds),
            Measurement::new("bytes", 56789.0, MeasurementUnit::Bytes),
        ]
    }

    #[test]
    fn test_started_run_is_empty() {
        let tracker = tracker();
        let before = Utc::now();
        tracker.start_benchmark_run("bench", "seq").unwrap();

        let run = tracker.find_benchmark_run("bench", "seq").unwrap();
        assert_eq!(run.name, "bench");
        assert_eq!(run.sequence_id, "seq");
        assert!(run.measurements.is_empty());
        assert!(run.executions.is_empty());
        assert!(run.started >= before.trunc_subsecs(6));
        assert_eq!(run.ended, None);
    }

    #[test]
    fn test_second_start_is_duplicate() {
        let tracker = tracker();
        tracker.start_benchmark_run("bench", "seq").unwrap();

        let err = tracker.start_benchmark_run("bench", "seq").unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateKey(_)));
    }

    #[test]
    fn test_finish_requires_start_and_happens_once() {
        let tracker = tracker();

        let err = tracker.finish_benchmark_run("bench", "seq", &[]).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));

        tracker.start_benchmark_run("bench", "seq").unwrap();
        tracker
            .finish_benchmark_run("bench", "seq", &execution_measurements())
            .unwrap();

        let err = tracker.finish_benchmark_run("bench", "seq", &[]).unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyFinished(_)));

        let run = tracker.find_benchmark_run("bench", "seq").unwrap();
        assert_eq!(run.measurements, execution_measurements());
        let ended = run.ended.unwrap();
        assert!(ended >= run.started);
    }

    #[test]
    fn test_duplicate_measurement_names_are_rejected_before_write() {
        let tracker = tracker();
        tracker.start_benchmark_run("bench", "seq").unwrap();

        let measurements = vec![
            Measurement::new("duration", 1.0, MeasurementUnit::Milliseconds),
            Measurement::new("duration", 2.0, MeasurementUnit::Milliseconds),
        ];
        let err = tracker
            .finish_benchmark_run("bench", "seq", &measurements)
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));

        assert_eq!(tracker.run_state("bench", "seq").unwrap(), RunState::Running);
    }

    #[test]
    fn test_execution_nesting() {
        let tracker = tracker();

        let err = tracker.start_execution("bench", "seq", "exec").unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));

        tracker.start_benchmark_run("bench", "seq").unwrap();
        tracker.start_execution("bench", "seq", "exec").unwrap();

        let run = tracker.find_benchmark_run("bench", "seq").unwrap();
        assert_eq!(run.executions.len(), 1);
        assert_eq!(run.executions[0].sequence_id, "exec");
        assert!(run.executions[0].measurements.is_empty());

        let err = tracker.start_execution("bench", "seq", "exec").unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateKey(_)));

        let err = tracker
            .finish_execution("bench", "seq", "other", &[])
            .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));

        tracker
            .finish_execution("bench", "seq", "exec", &execution_measurements())
            .unwrap();
        let err = tracker
            .finish_execution("bench", "seq", "exec", &[])
            .unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyFinished(_)));
    }

    #[test]
    fn test_blank_identifiers_are_rejected() {
        let tracker = tracker();
        assert!(matches!(
            tracker.start_benchmark_run("", "seq"),
            Err(TrackerError::Validation(_))
        ));
        tracker.start_benchmark_run("bench", "seq").unwrap();
        assert!(matches!(
            tracker.start_execution("bench", "seq", " "),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_find_benchmark_time_range() {
        let tracker = tracker();
        let before = Utc::now() - chrono::Duration::hours(1);

        tracker.start_benchmark_run("bench", "1").unwrap();
        tracker.start_benchmark_run("bench", "2").unwrap();
        tracker.start_benchmark_run("other", "1").unwrap();
        let after = Utc::now() + chrono::Duration::hours(1);

        let range = TimeRange::new(Some(before), Some(after)).unwrap();
        let benchmark = tracker
            .find_benchmark("bench", &range, &PageRequest::default())
            .unwrap();
        assert_eq!(benchmark.name, "bench");
        assert_eq!(benchmark.runs.len(), 2);
        assert!(benchmark.runs.iter().all(|r| r.name == "bench"));

        let earlier = TimeRange::new(None, Some(before)).unwrap();
        let empty = tracker
            .find_benchmark("bench", &earlier, &PageRequest::default())
            .unwrap();
        assert!(empty.runs.is_empty());
    }

    #[test]
    fn test_find_latest_and_run_state() {
        let tracker = tracker();
        assert_eq!(tracker.run_state("bench", "1").unwrap(), RunState::NotStarted);

        tracker.start_benchmark_run("bench", "1").unwrap();
        tracker.start_benchmark_run("other", "1").unwrap();
        tracker.finish_benchmark_run("bench", "1", &[]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        tracker.start_benchmark_run("bench", "2").unwrap();

        let latest = tracker.find_latest(&PageRequest::default()).unwrap();
        assert_eq!(latest.len(), 2);
        let bench = latest.iter().find(|r| r.name == "bench").unwrap();
        assert_eq!(bench.sequence_id, "2");

        assert_eq!(tracker.run_state("bench", "1").unwrap(), RunState::Finished);
        assert_eq!(tracker.run_state("bench", "2").unwrap(), RunState::Running);
    }
}
