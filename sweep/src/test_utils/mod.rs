//! Utilities for testing sweeps without a remote backend.
//!
//! - [`collection`] wraps any collection to inject listing and mutation faults.
//! - [`checkpoint`] provides a checkpoint store that fails on demand.
//! - [`notify`] lets tests wait for a condition with a timeout instead of sleeping.
//! - [`pipeline`] builds pipelines with test friendly settings.
//! - [`keys`] generates sorted synthetic keys.

pub mod checkpoint;
pub mod collection;
#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod keys;
pub mod notify;
pub mod pipeline;
