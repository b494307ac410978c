//! Remote collections the pipeline can sweep.

mod base;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

pub use base::*;
