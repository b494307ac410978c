//! Concurrency primitives coordinating the producer and the mutation workers.
//!
//! - [`shutdown`] is the cancellation signal every task observes at its suspension points.
//! - [`queue`] is the bounded hand-off between the producer and the workers.
//! - [`group`] supervises all tasks as a single unit and keeps the first failure.

pub mod group;
pub mod queue;
pub mod shutdown;
