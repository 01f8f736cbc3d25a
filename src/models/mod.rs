//! Lensing models.
//!
//! - `cosmology`: distance–redshift relations (`Cosmology` trait, flat ΛCDM)
//! - `nfw`: reduced tangential shear of an NFW halo (`ShearPredictor` trait)
//! - `variant`: binned shear models that marginalize (or not) over source redshifts
//!
//! The binning and fitting code only talks to the traits, so other halo
//! profiles or cosmology back-ends can be plugged in.

pub mod cosmology;
pub mod nfw;
pub mod variant;

pub use cosmology::*;
pub use nfw::*;
pub use variant::*;
