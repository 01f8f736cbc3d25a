//! From a source catalog to a binned radial shear profile.
//!
//! Responsibilities:
//!
//! - project ellipticities onto tangential / cross axes around the cluster
//! - generate bin edges (linear, log10-even, or caller-supplied)
//! - assign galaxies to bins and aggregate per-bin statistics
//! - keep per-bin membership (galaxy indices) for redshift-aware models

pub mod aggregate;
pub mod annotate;
pub mod edges;
pub mod radial;

pub use aggregate::*;
pub use annotate::*;
pub use edges::*;
pub use radial::*;
