mod base;
mod checkpoint;
mod collection;
mod metrics;
mod pipeline;
mod sweeper;

pub use base::*;
pub use checkpoint::*;
pub use collection::*;
pub use metrics::*;
pub use pipeline::*;
pub use sweeper::*;
