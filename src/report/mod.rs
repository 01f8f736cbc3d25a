//! Reporting utilities: per-bin model predictions and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::MassFit;
use crate::error::AppError;
use crate::models::{ModelContext, evaluate_model};
use crate::profile::RadialProfile;

/// Per-bin predictions of one fitted model.
#[derive(Debug, Clone)]
pub struct FitPrediction {
    pub fit: MassFit,
    pub gt_model: Vec<f64>,
}

/// Evaluate each fitted model at its own best-fit mass.
pub fn predictions_at_fit(
    profile: &RadialProfile,
    fits: &[MassFit],
    ctx: &ModelContext<'_>,
) -> Result<Vec<FitPrediction>, AppError> {
    fits.iter()
        .map(|fit| {
            let gt_model = evaluate_model(fit.model, profile, fit.mass, ctx)?;
            if gt_model.iter().any(|v| !v.is_finite()) {
                return Err(AppError::solver(format!(
                    "Non-finite {} prediction at the best-fit mass.",
                    fit.model.display_name()
                )));
            }
            Ok(FitPrediction {
                fit: fit.clone(),
                gt_model,
            })
        })
        .collect()
}
