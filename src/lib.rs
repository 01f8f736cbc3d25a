//! `wl-mass` library crate: weak-lensing galaxy-cluster mass estimation.
//!
//! The binary (`wlmass`) is a thin wrapper around this library so that:
//!
//! - the binning and fitting core is testable without spawning processes
//! - the pipeline can be driven from other front-ends (notebooks, services)
//!
//! Data flow: catalog -> tangential/cross shear -> radial profile -> binned
//! shear model -> mass fit.

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod profile;
pub mod report;
