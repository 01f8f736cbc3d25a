//! Synthetic input data.

pub mod mock;

pub use mock::*;
