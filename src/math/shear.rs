//! Tangential / cross projection of ellipticities.
//!
//! For a source at position angle `φ` (see [`crate::math::geometry`]):
//!
//! ```text
//! g_t = -( e1 cos 2φ + e2 sin 2φ)
//! g_x = -(-e1 sin 2φ + e2 cos 2φ)
//! ```
//!
//! With these signs a source elongated perpendicular to the radius vector
//! (tangential alignment around a mass overdensity) has `g_t > 0`.

use crate::error::{AppError, ensure_same_len};

/// Tangential component for a single source.
pub fn tangential(e1: f64, e2: f64, phi: f64) -> f64 {
    let (s, c) = (2.0 * phi).sin_cos();
    -(e1 * c + e2 * s)
}

/// Cross component for a single source.
pub fn cross(e1: f64, e2: f64, phi: f64) -> f64 {
    let (s, c) = (2.0 * phi).sin_cos();
    -(-e1 * s + e2 * c)
}

/// Inverse projection: `(e1, e2)` that decompose back to `(g_t, g_x)` at `φ`.
pub fn components_from_tangential(gt: f64, gx: f64, phi: f64) -> (f64, f64) {
    let (s, c) = (2.0 * phi).sin_cos();
    (-gt * c + gx * s, -gt * s - gx * c)
}

/// Tangential and cross components for parallel arrays.
pub fn decompose(e1: &[f64], e2: &[f64], phi: &[f64]) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    ensure_same_len("e1 and e2", e1.len(), e2.len())?;
    ensure_same_len("ellipticities and position angles", e1.len(), phi.len())?;

    let gt = e1
        .iter()
        .zip(e2)
        .zip(phi)
        .map(|((&a, &b), &p)| tangential(a, b, p))
        .collect();
    let gx = e1
        .iter()
        .zip(e2)
        .zip(phi)
        .map(|((&a, &b), &p)| cross(a, b, p))
        .collect();
    Ok((gt, gx))
}
