//! Halo-mass fitting.
//!
//! The fitted parameter is `x = log10(M / M_sun)`. The solver returns `x` and
//! its variance; the mass and its uncertainty are then
//!
//! ```text
//! M   = 10^x
//! σ_M = M ln(10) σ_x
//! ```
//!
//! The second line is first-order error propagation through the exponential. It
//! is only accurate while `σ_x` is small (a few percent in `M`); for broad
//! posteriors the interval in `x` is the meaningful quantity.

use crate::domain::{MassFit, SolverConfig, ZSourceModel};
use crate::error::AppError;
use crate::math::{Bounds, least_squares_fit};
use crate::models::{BinnedShearModel, ModelContext};
use crate::profile::RadialProfile;

/// Fit `log10(mass)` to the tangential shear of `profile`.
///
/// `predict` maps a trial `log10(mass)` to one predicted shear per bin. The
/// starting point is the middle of `bounds`.
///
/// Every bin must be populated with finite statistics and a positive error.
/// Use [`RadialProfile::non_empty`] to drop empty bins first.
pub fn fit_mass<F>(
    model: ZSourceModel,
    predict: F,
    profile: &RadialProfile,
    bounds: &Bounds,
    config: &SolverConfig,
) -> Result<MassFit, AppError>
where
    F: Fn(f64) -> Result<Vec<f64>, AppError>,
{
    if bounds.len() != 1 {
        return Err(AppError::invalid_input(format!(
            "Mass fit has one parameter, got {} bounds.",
            bounds.len()
        )));
    }
    check_fittable(profile)?;

    let x = profile.radii();
    let y = profile.gt();
    let y_err = profile.gt_err();
    let p0 = [0.5 * (bounds.lower()[0] + bounds.upper()[0])];

    let sol = least_squares_fit(|_, p: &[f64]| predict(p[0]), &x, &y, &y_err, &p0, bounds, config)?;

    let log10_mass = sol.params[0];
    let log10_mass_var = sol.covariance[(0, 0)];
    let mass = 10f64.powf(log10_mass);
    let mass_err = mass * std::f64::consts::LN_10 * log10_mass_var.max(0.0).sqrt();

    if !sol.converged {
        log::warn!(
            "{} fit stopped after {} iterations without meeting the tolerance",
            model.display_name(),
            sol.iterations
        );
    }
    if log10_mass <= bounds.lower()[0] || log10_mass >= bounds.upper()[0] {
        log::warn!(
            "{} fit hit the log10(M) bound at {log10_mass:.4}",
            model.display_name()
        );
    }

    Ok(MassFit {
        model,
        log10_mass,
        log10_mass_var,
        mass,
        mass_err,
        chi2: sol.chi2,
        dof: sol.dof,
        iterations: sol.iterations,
        converged: sol.converged,
    })
}

/// Bind `variant` to `profile` and fit it.
pub fn fit_mass_with_model(
    variant: ZSourceModel,
    profile: &RadialProfile,
    ctx: &ModelContext<'_>,
    bounds: &Bounds,
    config: &SolverConfig,
) -> Result<MassFit, AppError> {
    let model = BinnedShearModel::prepare(variant, profile)?;
    fit_mass(
        variant,
        |log10_mass| Ok(model.predict(10f64.powf(log10_mass), ctx)),
        profile,
        bounds,
        config,
    )
}

/// Reject profiles that would feed NaN into the solver.
fn check_fittable(profile: &RadialProfile) -> Result<(), AppError> {
    if profile.n_bins() == 0 {
        return Err(AppError::invalid_input("Profile has no bins to fit."));
    }
    for (i, b) in profile.bins().iter().enumerate() {
        if b.is_empty() {
            return Err(AppError::invalid_input(format!(
                "Bin {i} [{}, {}) is empty; drop empty bins before fitting.",
                b.lower, b.upper
            )));
        }
        if !(b.radius.is_finite() && b.gt.is_finite()) {
            return Err(AppError::invalid_input(format!("Bin {i} has non-finite statistics.")));
        }
        if !(b.gt_err.is_finite() && b.gt_err > 0.0) {
            return Err(AppError::invalid_input(format!(
                "Bin {i} has non-positive uncertainty ({}) with {} members.",
                b.gt_err, b.count
            )));
        }
    }
    Ok(())
}
