//! @ai:module:intent Benchmark run tracking service library
//! @ai:module:layer application
//! @ai:module:public_api api, client, config, error, model, store, tracker

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod tracker;

pub use api::{router, serve, AppState};
pub use client::TrackerClient;
pub use config::ServiceConfig;
pub use error::{Result, TrackerError};
pub use model::{Benchmark, BenchmarkRun, BenchmarkRunExecution, Measurement, MeasurementUnit};
pub use store::{BenchmarkRunStore, SqliteStore};
pub use tracker::BenchmarkTracker;
