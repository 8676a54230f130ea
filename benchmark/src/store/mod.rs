//! @ai:module:intent Persistence collaborator for benchmark runs
//! @ai:module:layer infrastructure
//! @ai:module:public_api BenchmarkRunStore, SqliteStore

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::{BenchmarkRun, Measurement, PageRequest, RunKey, TimeRange};
use chrono::{DateTime, Utc};

/// @ai:intent Trait for loading and saving runs by natural key
///
/// Each mutating method is atomic: its existence and state checks run in the
/// same transaction as the write, and a failure leaves nothing behind.
pub trait BenchmarkRunStore: Send + Sync {
    /// @ai:intent Persist a new running run
    /// @ai:post Err(DuplicateKey) if the key already exists
    fn insert_run(&self, key: &RunKey, started: DateTime<Utc>) -> Result<()>;

    /// @ai:intent Mark a run finished and attach its measurements
    /// @ai:post Err(NotFound) if absent, Err(AlreadyFinished) if ended is set
    fn finish_run(&self, key: &RunKey, ended: DateTime<Utc>, measurements: &[Measurement])
        -> Result<()>;

    /// @ai:intent Persist a new running execution under a running run
    /// @ai:post Err(NotFound) for a missing run, Err(AlreadyFinished) for a finished run,
    ///          Err(DuplicateKey) if the execution already exists
    fn insert_execution(
        &self,
        key: &RunKey,
        execution_sequence_id: &str,
        started: DateTime<Utc>,
    ) -> Result<()>;

    /// @ai:intent Mark an execution finished and attach its measurements
    /// @ai:post Err(NotFound) at either level, Err(AlreadyFinished) if ended is set
    fn finish_execution(
        &self,
        key: &RunKey,
        execution_sequence_id: &str,
        ended: DateTime<Utc>,
        measurements: &[Measurement],
    ) -> Result<()>;

    /// @ai:intent Load a run with its executions and measurements
    fn find_run(&self, key: &RunKey) -> Result<Option<BenchmarkRun>>;

    /// @ai:intent Runs of one benchmark started within range, newest first
    fn find_runs(&self, name: &str, range: &TimeRange, page: &PageRequest)
        -> Result<Vec<BenchmarkRun>>;

    /// @ai:intent Most recently started run of every distinct benchmark, newest first
    fn find_latest(&self, page: &PageRequest) -> Result<Vec<BenchmarkRun>>;
}
