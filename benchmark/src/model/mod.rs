//! @ai:module:intent Benchmark run, execution and measurement types
//! @ai:module:layer domain
//! @ai:module:public_api Measurement, MeasurementUnit, BenchmarkRun, BenchmarkRunExecution, Benchmark, RunKey, RunState, PageRequest, TimeRange

pub mod measurement;
pub mod query;
pub mod run;

pub use measurement::{validate_measurements, Measurement, MeasurementUnit};
pub use query::{PageRequest, TimeRange};
pub use run::{Benchmark, BenchmarkRun, BenchmarkRunExecution, RunKey, RunState};
