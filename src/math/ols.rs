//! Linear least-squares solve used for each damped Gauss–Newton step.
//!
//! Implementation choices:
//! - We use SVD so the solve is robust when the normal matrix is nearly singular
//!   (e.g. a parameter the data barely constrains).
//! - Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices, so tall design matrices go through SVD as well.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Pseudo-inverse of a symmetric positive semi-definite matrix (covariance from `JᵀWJ`).
pub fn pseudo_inverse(m: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let inv = m.clone().pseudo_inverse(1e-15).ok()?;
    if inv.iter().all(|v| v.is_finite()) {
        Some(inv)
    } else {
        None
    }
}
