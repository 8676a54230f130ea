//! @ai:module:intent SQLite-backed benchmark run store
//! @ai:module:layer infrastructure
//! @ai:module:public_api SqliteStore
//! @ai:module:stateless false

use crate::error::{on_constraint_violation, Result, TrackerError};
use crate::model::{
    BenchmarkRun, BenchmarkRunExecution, Measurement, MeasurementUnit, PageRequest, RunKey,
    TimeRange,
};
use crate::store::BenchmarkRunStore;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

// Timestamps are INTEGER microseconds since the Unix epoch.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS benchmark_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    sequence_id TEXT NOT NULL,
    started INTEGER NOT NULL,
    ended INTEGER,
    UNIQUE (name, sequence_id)
);
CREATE INDEX IF NOT EXISTS idx_benchmark_runs_name_started
    ON benchmark_runs (name, started);
CREATE INDEX IF NOT EXISTS idx_benchmark_runs_started
    ON benchmark_runs (started);

CREATE TABLE IF NOT EXISTS benchmark_run_executions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES benchmark_runs (id) ON DELETE CASCADE,
    sequence_id TEXT NOT NULL,
    started INTEGER NOT NULL,
    ended INTEGER,
    UNIQUE (run_id, sequence_id)
);

CREATE TABLE IF NOT EXISTS run_measurements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES benchmark_runs (id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    value REAL NOT NULL,
    unit TEXT NOT NULL,
    UNIQUE (owner_id, name)
);

CREATE TABLE IF NOT EXISTS execution_measurements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES benchmark_run_executions (id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    value REAL NOT NULL,
    unit TEXT NOT NULL,
    UNIQUE (owner_id, name)
);
";

const RUN_COLUMNS: &str = "id, name, sequence_id, started, ended";

/// Which measurement table a set of measurements belongs to.
#[derive(Debug, Clone, Copy)]
enum MeasurementOwner {
    Run,
    Execution,
}

impl MeasurementOwner {
    fn table(&self) -> &'static str {
        match self {
            MeasurementOwner::Run => "run_measurements",
            MeasurementOwner::Execution => "execution_measurements",
        }
    }
}

struct RunRow {
    id: i64,
    name: String,
    sequence_id: String,
    started: i64,
    ended: Option<i64>,
}

struct ExecutionRow {
    id: i64,
    sequence_id: String,
    started: i64,
    ended: Option<i64>,
}

/// @ai:intent Benchmark run store over a single SQLite connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// @ai:intent Open (or create) a database file and apply the schema
    /// @ai:effects fs:read, fs:write
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                TrackerError::Storage(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        tracing::debug!("SQLite journal mode: {}", journal_mode);

        tracing::info!("Opened benchmark database at {}", path.display());
        Self::initialize(conn)
    }

    /// @ai:intent Open a private in-memory database
    /// @ai:effects pure
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TrackerError::Storage("connection mutex poisoned".to_string()))
    }
}

fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

// Lower range bounds round up so a sub-microsecond `from` never admits earlier rows.
fn to_micros_ceil(ts: DateTime<Utc>) -> i64 {
    let micros = ts.timestamp_micros();
    if ts.timestamp_subsec_nanos() % 1_000 == 0 {
        micros
    } else {
        micros + 1
    }
}

fn from_micros(column: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, micros))
}

fn run_not_found(key: &RunKey) -> TrackerError {
    TrackerError::NotFound(format!("benchmark run {}", key))
}

fn execution_not_found(key: &RunKey, execution_sequence_id: &str) -> TrackerError {
    TrackerError::NotFound(format!(
        "execution {} of benchmark run {}",
        execution_sequence_id, key
    ))
}

fn map_run_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
    Ok(RunRow {
        id: row.get(0)?,
        name: row.get(1)?,
        sequence_id: row.get(2)?,
        started: row.get(3)?,
        ended: row.get(4)?,
    })
}

/// @ai:intent Id and end timestamp of a run, if it exists
/// @ai:effects db:read
fn run_state(conn: &Connection, key: &RunKey) -> rusqlite::Result<Option<(i64, Option<i64>)>> {
    conn.query_row(
        "SELECT id, ended FROM benchmark_runs WHERE name = ?1 AND sequence_id = ?2",
        params![key.name, key.sequence_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

/// @ai:effects db:read
fn load_measurements(
    conn: &Connection,
    owner: MeasurementOwner,
    owner_id: i64,
) -> rusqlite::Result<Vec<Measurement>> {
    let sql = format!(
        "SELECT name, value, unit FROM {} WHERE owner_id = ?1 ORDER BY id",
        owner.table()
    );
    let mut stmt = conn.prepare_cached(&sql)?;

    let rows = stmt.query_map(params![owner_id], |row| {
        let unit: String = row.get(2)?;
        let unit = unit
            .parse::<MeasurementUnit>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

        Ok(Measurement {
            name: row.get(0)?,
            value: row.get(1)?,
            unit,
        })
    })?;

    rows.collect()
}

/// @ai:effects db:write
fn insert_measurements(
    conn: &Connection,
    owner: MeasurementOwner,
    owner_id: i64,
    measurements: &[Measurement],
) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (owner_id, name, value, unit) VALUES (?1, ?2, ?3, ?4)",
        owner.table()
    );
    let mut stmt = conn.prepare_cached(&sql)?;

    for measurement in measurements {
        stmt.execute(params![
            owner_id,
            measurement.name,
            measurement.value,
            measurement.unit.as_str()
        ])
        .map_err(|e| {
            on_constraint_violation(e, || {
                TrackerError::Validation(format!(
                    "duplicate measurement name: {}",
                    measurement.name
                ))
            })
        })?;
    }

    Ok(())
}

/// @ai:intent Assemble the full run graph from a run row
/// @ai:effects db:read
fn load_run(conn: &Connection, row: RunRow) -> rusqlite::Result<BenchmarkRun> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, sequence_id, started, ended FROM benchmark_run_executions
         WHERE run_id = ?1 ORDER BY started ASC, id ASC",
    )?;

    let execution_rows = stmt
        .query_map(params![row.id], |r| {
            Ok(ExecutionRow {
                id: r.get(0)?,
                sequence_id: r.get(1)?,
                started: r.get(2)?,
                ended: r.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut executions = Vec::with_capacity(execution_rows.len());
    for execution in execution_rows {
        executions.push(BenchmarkRunExecution {
            id: execution.id,
            sequence_id: execution.sequence_id,
            started: from_micros(2, execution.started)?,
            ended: execution.ended.map(|e| from_micros(3, e)).transpose()?,
            measurements: load_measurements(conn, MeasurementOwner::Execution, execution.id)?,
        });
    }

    Ok(BenchmarkRun {
        id: row.id,
        name: row.name,
        sequence_id: row.sequence_id,
        started: from_micros(3, row.started)?,
        ended: row.ended.map(|e| from_micros(4, e)).transpose()?,
        measurements: load_measurements(conn, MeasurementOwner::Run, row.id)?,
        executions,
    })
}

fn load_runs(conn: &Connection, rows: Vec<RunRow>) -> Result<Vec<BenchmarkRun>> {
    let runs = rows
        .into_iter()
        .map(|row| load_run(conn, row))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(runs)
}

impl BenchmarkRunStore for SqliteStore {
    /// @ai:effects db:write
    fn insert_run(&self, key: &RunKey, started: DateTime<Utc>) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO benchmark_runs (name, sequence_id, started) VALUES (?1, ?2, ?3)",
            params![key.name, key.sequence_id, to_micros(started)],
        )
        .map_err(|e| {
            on_constraint_violation(e, || {
                TrackerError::DuplicateKey(format!("benchmark run {}", key))
            })
        })?;

        Ok(())
    }

    /// @ai:effects db:write
    fn finish_run(
        &self,
        key: &RunKey,
        ended: DateTime<Utc>,
        measurements: &[Measurement],
    ) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (run_id, ended_at) = run_state(&tx, key)?.ok_or_else(|| run_not_found(key))?;
        if ended_at.is_some() {
            return Err(TrackerError::AlreadyFinished(format!("benchmark run {}", key)));
        }

        tx.execute(
            "UPDATE benchmark_runs SET ended = ?1 WHERE id = ?2",
            params![to_micros(ended), run_id],
        )?;
        insert_measurements(&tx, MeasurementOwner::Run, run_id, measurements)?;

        tx.commit()?;
        Ok(())
    }

    /// @ai:effects db:write
    fn insert_execution(
        &self,
        key: &RunKey,
        execution_sequence_id: &str,
        started: DateTime<Utc>,
    ) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (run_id, ended_at) = run_state(&tx, key)?.ok_or_else(|| run_not_found(key))?;
        if ended_at.is_some() {
            return Err(TrackerError::AlreadyFinished(format!(
                "benchmark run {} cannot accept new executions",
                key
            )));
        }

        tx.execute(
            "INSERT INTO benchmark_run_executions (run_id, sequence_id, started)
             VALUES (?1, ?2, ?3)",
            params![run_id, execution_sequence_id, to_micros(started)],
        )
        .map_err(|e| {
            on_constraint_violation(e, || {
                TrackerError::DuplicateKey(format!(
                    "execution {} of benchmark run {}",
                    execution_sequence_id, key
                ))
            })
        })?;

        tx.commit()?;
        Ok(())
    }

    /// @ai:effects db:write
    fn finish_execution(
        &self,
        key: &RunKey,
        execution_sequence_id: &str,
        ended: DateTime<Utc>,
        measurements: &[Measurement],
    ) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (run_id, _) = run_state(&tx, key)?.ok_or_else(|| run_not_found(key))?;

        let execution: Option<(i64, Option<i64>)> = tx
            .query_row(
                "SELECT id, ended FROM benchmark_run_executions
                 WHERE run_id = ?1 AND sequence_id = ?2",
                params![run_id, execution_sequence_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (execution_id, ended_at) =
            execution.ok_or_else(|| execution_not_found(key, execution_sequence_id))?;
        if ended_at.is_some() {
            return Err(TrackerError::AlreadyFinished(format!(
                "execution {} of benchmark run {}",
                execution_sequence_id, key
            )));
        }

        tx.execute(
            "UPDATE benchmark_run_executions SET ended = ?1 WHERE id = ?2",
            params![to_micros(ended), execution_id],
        )?;
        insert_measurements(&tx, MeasurementOwner::Execution, execution_id, measurements)?;

        tx.commit()?;
        Ok(())
    }

    /// @ai:effects db:read
    fn find_run(&self, key: &RunKey) -> Result<Option<BenchmarkRun>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM benchmark_runs WHERE name = ?1 AND sequence_id = ?2",
                    RUN_COLUMNS
                ),
                params![key.name, key.sequence_id],
                map_run_row,
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(load_run(&conn, row)?)),
            None => Ok(None),
        }
    }

    /// @ai:effects db:read
    fn find_runs(
        &self,
        name: &str,
        range: &TimeRange,
        page: &PageRequest,
    ) -> Result<Vec<BenchmarkRun>> {
        let conn = self.lock()?;

        let rows = {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {} FROM benchmark_runs
                 WHERE name = ?1
                   AND (?2 IS NULL OR started >= ?2)
                   AND (?3 IS NULL OR started <= ?3)
                 ORDER BY started DESC, id DESC
                 LIMIT ?4 OFFSET ?5",
                RUN_COLUMNS
            ))?;

            let rows = stmt
                .query_map(
                    params![
                        name,
                        range.from.map(to_micros_ceil),
                        range.to.map(to_micros),
                        page.limit(),
                        page.offset()
                    ],
                    map_run_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        load_runs(&conn, rows)
    }

    /// @ai:effects db:read
    fn find_latest(&self, page: &PageRequest) -> Result<Vec<BenchmarkRun>> {
        let conn = self.lock()?;

        let rows = {
            let mut stmt = conn.prepare_cached(
                "SELECT r.id, r.name, r.sequence_id, r.started, r.ended FROM benchmark_runs r
                 WHERE r.id = (
                     SELECT latest.id FROM benchmark_runs latest
                     WHERE latest.name = r.name
                     ORDER BY latest.started DESC, latest.id DESC
                     LIMIT 1
                 )
                 ORDER BY r.started DESC, r.name ASC
                 LIMIT ?1 OFFSET ?2",
            )?;

            let rows = stmt
                .query_map(params![page.limit(), page.offset()], map_run_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        load_runs(&conn, rows)
    }
}
