//! Binned shear models.
//!
//! Both variants turn a trial mass into one predicted reduced tangential shear
//! per profile bin, in bin order:
//!
//! - `SingleRedshift`: one predictor call per bin at the bin's mean member
//!   redshift. Cheap, but biased when the redshifts inside a bin are spread out,
//!   because the shear is non-linear in source redshift.
//! - `RedshiftDistribution`: one predictor call per member galaxy, averaged
//!   within the bin. This is the discrete estimate of the average over the
//!   empirical redshift distribution; it needs per-bin membership.
//!
//! Empty bins predict NaN.

use rayon::prelude::*;

use crate::domain::{RadiusUnit, ZSourceModel};
use crate::error::AppError;
use crate::math::mean;
use crate::models::{Cosmology, FixedHaloParams, ShearPredictor};
use crate::profile::RadialProfile;

/// Collaborators and fixed parameters needed to evaluate a model.
#[derive(Clone, Copy)]
pub struct ModelContext<'a> {
    pub predictor: &'a dyn ShearPredictor,
    pub cosmo: &'a dyn Cosmology,
    pub halo: FixedHaloParams,
}

/// A shear model bound to the bins of one profile.
#[derive(Debug, Clone)]
pub enum BinnedShearModel {
    SingleRedshift {
        radii_mpc: Vec<f64>,
        /// Mean member redshift per bin (NaN for empty bins).
        z_eff: Vec<f64>,
    },
    RedshiftDistribution {
        radii_mpc: Vec<f64>,
        /// Redshift of every member, per bin.
        member_z: Vec<Vec<f64>>,
    },
}

impl BinnedShearModel {
    /// Bind `variant` to `profile`.
    ///
    /// Fails with `MissingMembership` for the distribution variant when the
    /// profile was built without membership tracking, and with `InvalidInput`
    /// when the profile radius is not a physical length.
    pub fn prepare(variant: ZSourceModel, profile: &RadialProfile) -> Result<Self, AppError> {
        let radii_mpc = physical_radii(profile)?;
        match variant {
            ZSourceModel::SingleRedshift => Ok(Self::SingleRedshift {
                radii_mpc,
                z_eff: profile.bins().iter().map(|b| b.z).collect(),
            }),
            ZSourceModel::RedshiftDistribution => {
                let member_z = (0..profile.n_bins())
                    .map(|i| profile.member_redshifts(i))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::RedshiftDistribution { radii_mpc, member_z })
            }
        }
    }

    pub fn variant(&self) -> ZSourceModel {
        match self {
            Self::SingleRedshift { .. } => ZSourceModel::SingleRedshift,
            Self::RedshiftDistribution { .. } => ZSourceModel::RedshiftDistribution,
        }
    }

    pub fn n_bins(&self) -> usize {
        match self {
            Self::SingleRedshift { radii_mpc, .. } | Self::RedshiftDistribution { radii_mpc, .. } => {
                radii_mpc.len()
            }
        }
    }

    /// Predicted reduced tangential shear per bin for halo mass `mass` (`M_sun`).
    pub fn predict(&self, mass: f64, ctx: &ModelContext<'_>) -> Vec<f64> {
        match self {
            Self::SingleRedshift { radii_mpc, z_eff } => radii_mpc
                .iter()
                .zip(z_eff)
                .map(|(&r, &z)| {
                    if z.is_nan() {
                        f64::NAN
                    } else {
                        ctx.predictor
                            .predict_reduced_tangential_shear(r, mass, &ctx.halo, z, ctx.cosmo)
                    }
                })
                .collect(),
            Self::RedshiftDistribution { radii_mpc, member_z } => radii_mpc
                .par_iter()
                .zip(member_z.par_iter())
                .map(|(&r, zs)| {
                    let shears = ctx.predictor.predict_for_sources(r, mass, &ctx.halo, zs, ctx.cosmo);
                    mean(&shears)
                })
                .collect(),
        }
    }
}

/// Evaluate `variant` on `profile` at `trial_mass`.
pub fn evaluate_model(
    variant: ZSourceModel,
    profile: &RadialProfile,
    trial_mass: f64,
    ctx: &ModelContext<'_>,
) -> Result<Vec<f64>, AppError> {
    Ok(BinnedShearModel::prepare(variant, profile)?.predict(trial_mass, ctx))
}

fn physical_radii(profile: &RadialProfile) -> Result<Vec<f64>, AppError> {
    let unit: RadiusUnit = profile.unit();
    let Some(factor) = unit.to_mpc_factor() else {
        return Err(AppError::invalid_input(format!(
            "Shear models need a physical radius (kpc or Mpc), profile is in {}.",
            unit.label()
        )));
    };
    Ok(profile.bins().iter().map(|b| b.radius * factor).collect())
}
