//! Logging and metrics setup shared by the sweeper binary and the test suites.

pub mod metrics;
pub mod tracing;
