//! Persistence of the last enqueued key, used to resume an interrupted sweep.

mod base;
pub mod file;
pub mod memory;

pub use base::*;
