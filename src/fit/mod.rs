//! Mass fitting orchestration.
//!
//! Responsibilities:
//!
//! - reject profiles that would feed NaN or zero errors into the solver
//! - fit `log10(M)` under a chosen source-redshift model
//! - convert the result back to mass with a propagated uncertainty

pub mod fitter;

pub use fitter::*;
