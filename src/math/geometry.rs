//! Angular separation and position angle between the cluster center and sources.
//!
//! Conventions:
//! - separations `theta` are returned in radians
//! - the position angle `phi` is measured from north (`+dec`) through east
//!   (`+ra`), in radians, in `(-π, π]`
//! - a source exactly at the cluster center has `phi = 0` (degenerate, not an error)
//!
//! The ellipticity components are defined against the same axes: `e1 > 0` is
//! elongation along north–south, `e2 > 0` along the axis 45° east of north.

use crate::domain::{ClusterInfo, GalaxyCatalog, Geometry, RadiusUnit};
use crate::error::AppError;
use crate::models::Cosmology;

/// Flat-sky separations beyond this are flagged as inaccurate.
const FLAT_SKY_WARN_RAD: f64 = std::f64::consts::PI / 180.0;

/// Separation (rad) and position angle (rad) of one source relative to a center.
pub fn theta_phi(ra_l: f64, dec_l: f64, ra_s: f64, dec_s: f64, geometry: Geometry) -> (f64, f64) {
    match geometry {
        Geometry::Flat => theta_phi_flat(ra_l, dec_l, ra_s, dec_s),
        Geometry::Curved => theta_phi_curved(ra_l, dec_l, ra_s, dec_s),
    }
}

fn theta_phi_flat(ra_l: f64, dec_l: f64, ra_s: f64, dec_s: f64) -> (f64, f64) {
    let dx = wrap_degrees(ra_s - ra_l).to_radians() * dec_l.to_radians().cos();
    let dy = (dec_s - dec_l).to_radians();
    let theta = dx.hypot(dy);
    if theta == 0.0 {
        return (0.0, 0.0);
    }
    (theta, dx.atan2(dy))
}

fn theta_phi_curved(ra_l: f64, dec_l: f64, ra_s: f64, dec_s: f64) -> (f64, f64) {
    let d_ra = (ra_s - ra_l).to_radians();
    let (sin_d1, cos_d1) = dec_l.to_radians().sin_cos();
    let (sin_d2, cos_d2) = dec_s.to_radians().sin_cos();
    let (sin_dra, cos_dra) = d_ra.sin_cos();

    // Vincenty form: well conditioned at both small and near-antipodal separations.
    let east = cos_d2 * sin_dra;
    let north = cos_d1 * sin_d2 - sin_d1 * cos_d2 * cos_dra;
    let along = sin_d1 * sin_d2 + cos_d1 * cos_d2 * cos_dra;
    let theta = east.hypot(north).atan2(along);
    if theta == 0.0 || (east == 0.0 && north == 0.0) {
        return (theta, 0.0);
    }
    (theta, east.atan2(north))
}

/// Map an RA difference in degrees into `[-180, 180)`.
fn wrap_degrees(d: f64) -> f64 {
    let d = d % 360.0;
    if d >= 180.0 {
        d - 360.0
    } else if d < -180.0 {
        d + 360.0
    } else {
        d
    }
}

/// Separations and position angles for every galaxy in the catalog.
pub fn compute_theta_phi(
    cluster: &ClusterInfo,
    catalog: &GalaxyCatalog,
    geometry: Geometry,
) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    catalog.validate_coordinates()?;

    let mut theta = Vec::with_capacity(catalog.len());
    let mut phi = Vec::with_capacity(catalog.len());
    for g in catalog.galaxies() {
        let (t, p) = theta_phi(cluster.ra, cluster.dec, g.ra, g.dec, geometry);
        theta.push(t);
        phi.push(p);
    }

    if geometry == Geometry::Flat {
        let wide = theta.iter().filter(|&&t| t > FLAT_SKY_WARN_RAD).count();
        if wide > 0 {
            log::warn!(
                "Flat-sky approximation used for {wide} sources separated by more than 1 deg; results may be inaccurate"
            );
        }
    }

    Ok((theta, phi))
}

/// Convert separations in radians to `unit`.
///
/// Physical units use the angular-diameter distance to the cluster.
pub fn convert_theta(
    theta: &[f64],
    unit: RadiusUnit,
    z_cluster: f64,
    cosmo: Option<&dyn Cosmology>,
) -> Result<Vec<f64>, AppError> {
    let factor = match unit {
        RadiusUnit::Radian => 1.0,
        RadiusUnit::Degree => 180.0 / std::f64::consts::PI,
        RadiusUnit::Arcmin => 60.0 * 180.0 / std::f64::consts::PI,
        RadiusUnit::Arcsec => 3600.0 * 180.0 / std::f64::consts::PI,
        RadiusUnit::Kpc | RadiusUnit::Mpc => {
            let Some(cosmo) = cosmo else {
                return Err(AppError::invalid_input(format!(
                    "A cosmology is required to convert separations to {}.",
                    unit.label()
                )));
            };
            let d_a = cosmo.angular_diameter_distance(z_cluster);
            if !(d_a.is_finite() && d_a > 0.0) {
                return Err(AppError::invalid_input(format!(
                    "Angular-diameter distance at z={z_cluster} is not positive."
                )));
            }
            // `to_mpc_factor` is Some for physical units.
            d_a / unit.to_mpc_factor().unwrap_or(1.0)
        }
    };
    Ok(theta.iter().map(|t| t * factor).collect())
}
