pub mod base;
pub mod mutation;
pub mod pool;
pub mod producer;
