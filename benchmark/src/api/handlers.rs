//! @ai:module:intent HTTP handlers mapping the REST surface onto the tracker
//! @ai:module:layer presentation
//! @ai:module:public_api start_run, finish_run, start_execution, finish_execution, find_run, find_benchmark, find_latest

use crate::api::params::{parse_measurements, PageParams, RangeParams};
use crate::api::{ApiError, AppState};
use crate::error::{Result, TrackerError};
use crate::model::{Benchmark, BenchmarkRun};
use crate::store::BenchmarkRunStore;
use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

/// @ai:intent Run a synchronous tracker call on the blocking pool
/// @ai:effects db:read, db:write
async fn blocking<T, F>(f: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError(TrackerError::Storage(format!("worker task failed: {}", e))))?
        .map_err(ApiError)
}

/// POST /v1/benchmark/:name/:sequence_id/start
pub async fn start_run<S: BenchmarkRunStore + 'static>(
    State(state): State<AppState<S>>,
    path: std::result::Result<Path<(String, String)>, PathRejection>,
) -> std::result::Result<StatusCode, ApiError> {
    let Path((name, sequence_id)) = path?;
    let tracker = state.tracker.clone();
    blocking(move || tracker.start_benchmark_run(&name, &sequence_id)).await?;
    Ok(StatusCode::OK)
}

/// POST /v1/benchmark/:name/:sequence_id/finish
pub async fn finish_run<S: BenchmarkRunStore + 'static>(
    State(state): State<AppState<S>>,
    path: std::result::Result<Path<(String, String)>, PathRejection>,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    let Path((name, sequence_id)) = path?;
    let measurements = parse_measurements(&body)?;
    let tracker = state.tracker.clone();
    blocking(move || tracker.finish_benchmark_run(&name, &sequence_id, &measurements)).await?;
    Ok(StatusCode::OK)
}

/// POST /v1/benchmark/:name/:sequence_id/execution/:execution_id/start
pub async fn start_execution<S: BenchmarkRunStore + 'static>(
    State(state): State<AppState<S>>,
    path: std::result::Result<Path<(String, String, String)>, PathRejection>,
) -> std::result::Result<StatusCode, ApiError> {
    let Path((name, sequence_id, execution_id)) = path?;
    let tracker = state.tracker.clone();
    blocking(move || tracker.start_execution(&name, &sequence_id, &execution_id)).await?;
    Ok(StatusCode::OK)
}

/// POST /v1/benchmark/:name/:sequence_id/execution/:execution_id/finish
pub async fn finish_execution<S: BenchmarkRunStore + 'static>(
    State(state): State<AppState<S>>,
    path: std::result::Result<Path<(String, String, String)>, PathRejection>,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    let Path((name, sequence_id, execution_id)) = path?;
    let measurements = parse_measurements(&body)?;
    let tracker = state.tracker.clone();
    blocking(move || {
        tracker.finish_execution(&name, &sequence_id, &execution_id, &measurements)
    })
    .await?;
    Ok(StatusCode::OK)
}

/// GET /v1/benchmark/:name/:sequence_id
pub async fn find_run<S: BenchmarkRunStore + 'static>(
    State(state): State<AppState<S>>,
    path: std::result::Result<Path<(String, String)>, PathRejection>,
) -> std::result::Result<Json<BenchmarkRun>, ApiError> {
    let Path((name, sequence_id)) = path?;
    let tracker = state.tracker.clone();
    let run = blocking(move || tracker.find_benchmark_run(&name, &sequence_id)).await?;
    Ok(Json(run))
}

/// GET /v1/benchmark/:name?from=&to=&page=&size=
pub async fn find_benchmark<S: BenchmarkRunStore + 'static>(
    State(state): State<AppState<S>>,
    path: std::result::Result<Path<String>, PathRejection>,
    query: std::result::Result<Query<RangeParams>, QueryRejection>,
) -> std::result::Result<Json<Benchmark>, ApiError> {
    let Path(name) = path?;
    let Query(params) = query?;
    let range = params.to_range()?;
    let page = params.to_page(&state.paging)?;
    let tracker = state.tracker.clone();
    let benchmark = blocking(move || tracker.find_benchmark(&name, &range, &page)).await?;
    Ok(Json(benchmark))
}

/// GET /v1/benchmark/latest?page=&size=
pub async fn find_latest<S: BenchmarkRunStore + 'static>(
    State(state): State<AppState<S>>,
    query: std::result::Result<Query<PageParams>, QueryRejection>,
) -> std::result::Result<Json<Vec<BenchmarkRun>>, ApiError> {
    let Query(params) = query?;
    let page = params.to_page(&state.paging)?;
    let tracker = state.tracker.clone();
    let runs = blocking(move || tracker.find_latest(&page)).await?;
    Ok(Json(runs))
}
