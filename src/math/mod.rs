//! Mathematical utilities: sky geometry, shear decomposition, summary
//! statistics, and weighted non-linear least squares.

pub mod geometry;
pub mod lm;
pub mod ols;
pub mod shear;
pub mod stats;

pub use geometry::*;
pub use lm::*;
pub use ols::*;
pub use shear::*;
pub use stats::*;
