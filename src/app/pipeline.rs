//! Shared analysis pipeline used by the `profile` and `fit` commands.
//!
//! catalog -> tangential/cross projection -> bin edges -> radial profile
//! -> (optionally) one mass fit per source-redshift model
//!
//! The CLI only prints what this returns.

use std::sync::Arc;

use crate::domain::{AnalysisConfig, ClusterData, MassFit, ZSourceModel};
use crate::error::{AppError, ErrorKind};
use crate::fit::fit_mass_with_model;
use crate::io::load_cluster;
use crate::math::Bounds;
use crate::models::{FixedHaloParams, FlatLambdaCdm, ModelContext, NfwShear};
use crate::profile::{BinEdges, RadialProfile, compute_tangential_and_cross_components, make_bins, make_radial_profile};
use crate::report::{FitPrediction, predictions_at_fit};

/// All computed outputs of one analysis run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data: ClusterData,
    /// Every bin, including empty ones.
    pub profile: RadialProfile,
    /// Bins with at least two members and a usable `gt_err` (what the fits saw).
    pub fitted_profile: RadialProfile,
    pub fits: Vec<MassFit>,
    pub predictions: Vec<FitPrediction>,
}

/// Load the cluster file named in `config` and run the analysis.
pub fn run_analysis(config: &AnalysisConfig, fit: bool) -> Result<RunOutput, AppError> {
    let data = load_cluster(&config.cluster_path)?;
    run_analysis_on(data, config, fit)
}

/// Run the analysis on an in-memory cluster.
pub fn run_analysis_on(data: ClusterData, config: &AnalysisConfig, fit: bool) -> Result<RunOutput, AppError> {
    let cosmo = FlatLambdaCdm::new(config.h0, config.omega_m);
    let catalog = Arc::new(data.catalog.clone());

    let annotated = compute_tangential_and_cross_components(&data.cluster, catalog, config.geometry)?;
    let edges = match &config.bin_edges {
        Some(custom) => BinEdges::from_custom(custom.clone(), true)?,
        None => make_bins(config.bin_min, config.bin_max, config.n_bins, config.bin_method)?,
    };
    let profile = make_radial_profile(&annotated, config.radius_unit, &edges, Some(&cosmo), true)?;
    let fitted_profile = profile.fittable();

    if !fit {
        return Ok(RunOutput {
            data,
            profile,
            fitted_profile,
            fits: Vec::new(),
            predictions: Vec::new(),
        });
    }

    let populated = profile.non_empty().n_bins();
    if fitted_profile.n_bins() < populated {
        log::warn!(
            "Dropping {} of {populated} populated bins with fewer than two sources or zero shear scatter",
            populated - fitted_profile.n_bins()
        );
    }

    if fitted_profile.n_bins() == 0 {
        return Err(AppError::new(
            ErrorKind::MissingColumn,
            "No bins with at least two sources to fit; check the bin range and radius unit.",
        ));
    }

    let ctx = ModelContext {
        predictor: &NfwShear,
        cosmo: &cosmo,
        halo: FixedHaloParams {
            concentration: config.concentration,
            z_cluster: data.cluster.z,
            halo_profile: config.halo_profile,
            delta_mdef: config.delta_mdef,
        },
    };
    let bounds = Bounds::scalar(config.log10_mass_min, config.log10_mass_max)?;

    let fits = ZSourceModel::ALL
        .iter()
        .map(|&variant| fit_mass_with_model(variant, &fitted_profile, &ctx, &bounds, &config.solver))
        .collect::<Result<Vec<_>, _>>()?;
    for f in &fits {
        log::info!(
            "{}: log10M = {:.4} ± {:.4}",
            f.model.display_name(),
            f.log10_mass,
            f.log10_mass_var.max(0.0).sqrt()
        );
    }

    let predictions = predictions_at_fit(&fitted_profile, &fits, &ctx)?;

    Ok(RunOutput {
        data,
        profile,
        fitted_profile,
        fits,
        predictions,
    })
}
