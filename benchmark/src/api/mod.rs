//! @ai:module:intent REST transport for the benchmark tracker
//! @ai:module:layer presentation
//! @ai:module:public_api AppState, ApiError, router, serve

pub mod handlers;
pub mod params;

use crate::config::PagingConfig;
use crate::error::TrackerError;
use crate::store::BenchmarkRunStore;
use crate::tracker::BenchmarkTracker;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// @ai:intent Shared state handed to every handler
pub struct AppState<S: BenchmarkRunStore> {
    pub tracker: Arc<BenchmarkTracker<S>>,
    pub paging: PagingConfig,
}

impl<S: BenchmarkRunStore> AppState<S> {
    /// @ai:effects pure
    pub fn new(tracker: Arc<BenchmarkTracker<S>>, paging: PagingConfig) -> Self {
        Self { tracker, paging }
    }
}

// Derived Clone would require S: Clone.
impl<S: BenchmarkRunStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            tracker: Arc::clone(&self.tracker),
            paging: self.paging.clone(),
        }
    }
}

/// @ai:intent Tracker error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub TrackerError);

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        ApiError(err)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(TrackerError::Validation(format!(
            "invalid path: {}",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(TrackerError::Validation(format!(
            "invalid query: {}",
            rejection.body_text()
        )))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ApiError {
    /// @ai:intent HTTP status for each error kind
    /// @ai:effects pure
    pub fn status(&self) -> StatusCode {
        match self.0 {
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::DuplicateKey(_) | TrackerError::AlreadyFinished(_) => {
                StatusCode::CONFLICT
            }
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, self.0);
        }

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// @ai:intent Build the `/v1/benchmark` router
/// @ai:effects pure
pub fn router<S: BenchmarkRunStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/v1/benchmark/latest", get(handlers::find_latest::<S>))
        .route("/v1/benchmark/:name", get(handlers::find_benchmark::<S>))
        .route(
            "/v1/benchmark/:name/:sequence_id",
            get(handlers::find_run::<S>),
        )
        .route(
            "/v1/benchmark/:name/:sequence_id/start",
            post(handlers::start_run::<S>),
        )
        .route(
            "/v1/benchmark/:name/:sequence_id/finish",
            post(handlers::finish_run::<S>),
        )
        .route(
            "/v1/benchmark/:name/:sequence_id/execution/:execution_id/start",
            post(handlers::start_execution::<S>),
        )
        .route(
            "/v1/benchmark/:name/:sequence_id/execution/:execution_id/finish",
            post(handlers::finish_execution::<S>),
        )
        .with_state(state)
}

/// @ai:intent Serve the API on a bound listener until shutdown resolves
/// @ai:effects network
pub async fn serve<S, F>(listener: TcpListener, state: AppState<S>, shutdown: F) -> anyhow::Result<()>
where
    S: BenchmarkRunStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("Benchmark service listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Benchmark service stopped");
    Ok(())
}
