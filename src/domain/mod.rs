//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration enums (`Geometry`, `RadiusUnit`, `BinMethod`, `ZSourceModel`)
//! - the source catalog and cluster descriptor (`GalaxyCatalog`, `ClusterInfo`)
//! - per-bin aggregates and fit outputs (`ProfileBin`, `MassFit`)
//! - run configuration (`AnalysisConfig`, `SolverConfig`)

pub mod types;

pub use types::*;
