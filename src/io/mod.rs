//! Input/output helpers.
//!
//! - cluster catalog JSON save/load (`cluster_file`)
//! - profile + fit result export (`export`)

pub mod cluster_file;
pub mod export;

pub use cluster_file::*;
pub use export::*;
