//! @ai:module:intent Benchmark run and execution aggregates
//! @ai:module:layer domain
//! @ai:module:public_api BenchmarkRun, BenchmarkRunExecution, Benchmark, RunKey, RunState
//! @ai:module:stateless true

use crate::error::{Result, TrackerError};
use crate::model::measurement::Measurement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// @ai:intent Lifecycle state shared by runs and executions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Finished,
}

impl RunState {
    /// @ai:intent State of a record given its end timestamp
    /// @ai:effects pure
    pub fn of(ended: Option<DateTime<Utc>>) -> Self {
        match ended {
            Some(_) => RunState::Finished,
            None => RunState::Running,
        }
    }
}

/// @ai:intent Natural key of a run: benchmark name plus sequence id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunKey {
    pub name: String,
    pub sequence_id: String,
}

impl RunKey {
    /// @ai:intent Build a key, rejecting blank components
    /// @ai:effects pure
    pub fn new(name: &str, sequence_id: &str) -> Result<Self> {
        require_non_blank("benchmark name", name)?;
        require_non_blank("sequence id", sequence_id)?;

        Ok(Self {
            name: name.to_string(),
            sequence_id: sequence_id.to_string(),
        })
    }
}

impl std::fmt::Display for RunKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.sequence_id)
    }
}

/// @ai:intent Reject empty or whitespace-only identifiers
/// @ai:effects pure
pub(crate) fn require_non_blank(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TrackerError::Validation(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// @ai:intent A timed sub-unit of work inside a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRunExecution {
    pub id: i64,
    pub sequence_id: String,
    pub started: DateTime<Utc>,
    pub ended: Option<DateTime<Utc>>,
    pub measurements: Vec<Measurement>,
}

impl BenchmarkRunExecution {
    /// @ai:effects pure
    pub fn state(&self) -> RunState {
        RunState::of(self.ended)
    }
}

/// @ai:intent One timed instance of a named benchmark with its executions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRun {
    pub id: i64,
    pub name: String,
    pub sequence_id: String,
    pub started: DateTime<Utc>,
    pub ended: Option<DateTime<Utc>>,
    pub measurements: Vec<Measurement>,
    pub executions: Vec<BenchmarkRunExecution>,
}

impl BenchmarkRun {
    /// @ai:effects pure
    pub fn state(&self) -> RunState {
        RunState::of(self.ended)
    }
}

/// @ai:intent Query result: runs of one benchmark, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub name: String,
    pub runs: Vec<BenchmarkRun>,
}
