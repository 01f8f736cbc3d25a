//! Reduced tangential shear of an NFW halo.
//!
//! For projected radius `R` (physical Mpc) and `x = R / r_s`:
//!
//! ```text
//! Σ(x)      = 2 ρ_s r_s f(x)
//! Σ̄(<x)    = 4 ρ_s r_s h(x) / x²
//! ΔΣ        = Σ̄(<x) - Σ(x)
//! γ_t       = ΔΣ / Σ_crit,  κ = Σ / Σ_crit
//! g_t       = γ_t / (1 - κ)
//! ```
//!
//! with the mass `M_Δ` defined against `Δ` times the mean matter density at the
//! cluster redshift. Sources at or in front of the cluster are unlensed.

use crate::domain::HaloProfile;
use crate::models::Cosmology;

/// Speed of light (m/s).
const C_M_S: f64 = 299_792_458.0;
/// Newton's constant (m^3 kg^-1 s^-2).
const G_SI: f64 = 6.674_30e-11;
/// Solar mass (kg).
const M_SUN_KG: f64 = 1.988_41e30;
/// Megaparsec (m).
const MPC_M: f64 = 3.085_677_581_491_367e22;

/// Half-width around `x = 1` where the analytic limits are used.
const X_ONE_EPS: f64 = 1e-6;

/// `c² / (4πG)` in `M_sun / Mpc`.
fn sigma_crit_prefactor() -> f64 {
    C_M_S * C_M_S * MPC_M / (4.0 * std::f64::consts::PI * G_SI * M_SUN_KG)
}

/// Halo parameters held fixed while the mass is fitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedHaloParams {
    pub concentration: f64,
    pub z_cluster: f64,
    pub halo_profile: HaloProfile,
    /// Overdensity relative to the mean matter density (e.g. 200).
    pub delta_mdef: f64,
}

/// Predicts the reduced tangential shear at a projected radius.
pub trait ShearPredictor: Send + Sync {
    /// `radius` in physical Mpc, `mass` in `M_sun`.
    fn predict_reduced_tangential_shear(
        &self,
        radius: f64,
        mass: f64,
        halo: &FixedHaloParams,
        z_source: f64,
        cosmo: &dyn Cosmology,
    ) -> f64;

    /// Broadcast over a list of source redshifts at one radius.
    fn predict_for_sources(
        &self,
        radius: f64,
        mass: f64,
        halo: &FixedHaloParams,
        z_sources: &[f64],
        cosmo: &dyn Cosmology,
    ) -> Vec<f64> {
        z_sources
            .iter()
            .map(|&z| self.predict_reduced_tangential_shear(radius, mass, halo, z, cosmo))
            .collect()
    }
}

/// Analytic NFW shear predictor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NfwShear;

/// Lens-side quantities that do not depend on the source redshift.
struct NfwLens {
    r_s: f64,
    rho_s: f64,
    d_l: f64,
}

impl NfwLens {
    fn new(mass: f64, halo: &FixedHaloParams, cosmo: &dyn Cosmology) -> Self {
        let c = halo.concentration;
        let rho_m = cosmo.mean_matter_density(halo.z_cluster);
        let r_delta = (3.0 * mass / (4.0 * std::f64::consts::PI * halo.delta_mdef * rho_m)).cbrt();
        let delta_c = halo.delta_mdef / 3.0 * c * c * c / ((1.0 + c).ln() - c / (1.0 + c));
        Self {
            r_s: r_delta / c,
            rho_s: delta_c * rho_m,
            d_l: cosmo.angular_diameter_distance(halo.z_cluster),
        }
    }

    /// `(Σ, ΔΣ)` at projected radius `radius` (`M_sun / Mpc^2`).
    fn surface_densities(&self, radius: f64) -> (f64, f64) {
        let x = radius / self.r_s;
        let norm = self.rho_s * self.r_s;
        let sigma = 2.0 * norm * nfw_f(x);
        let mean_inside = 4.0 * norm * nfw_h(x) / (x * x);
        (sigma, mean_inside - sigma)
    }

    fn reduced_shear(&self, sigma: f64, delta_sigma: f64, z_cluster: f64, z_source: f64, cosmo: &dyn Cosmology) -> f64 {
        if !(z_source > z_cluster) {
            return 0.0;
        }
        let d_s = cosmo.angular_diameter_distance(z_source);
        let d_ls = cosmo.angular_diameter_distance_z1z2(z_cluster, z_source);
        if d_ls <= 0.0 {
            return 0.0;
        }
        let sigma_crit = sigma_crit_prefactor() * d_s / (self.d_l * d_ls);
        let gamma = delta_sigma / sigma_crit;
        let kappa = sigma / sigma_crit;
        gamma / (1.0 - kappa)
    }
}

impl ShearPredictor for NfwShear {
    fn predict_reduced_tangential_shear(
        &self,
        radius: f64,
        mass: f64,
        halo: &FixedHaloParams,
        z_source: f64,
        cosmo: &dyn Cosmology,
    ) -> f64 {
        match halo.halo_profile {
            HaloProfile::Nfw => {
                let lens = NfwLens::new(mass, halo, cosmo);
                let (sigma, delta_sigma) = lens.surface_densities(radius);
                lens.reduced_shear(sigma, delta_sigma, halo.z_cluster, z_source, cosmo)
            }
        }
    }

    fn predict_for_sources(
        &self,
        radius: f64,
        mass: f64,
        halo: &FixedHaloParams,
        z_sources: &[f64],
        cosmo: &dyn Cosmology,
    ) -> Vec<f64> {
        match halo.halo_profile {
            HaloProfile::Nfw => {
                let lens = NfwLens::new(mass, halo, cosmo);
                let (sigma, delta_sigma) = lens.surface_densities(radius);
                z_sources
                    .iter()
                    .map(|&z| lens.reduced_shear(sigma, delta_sigma, halo.z_cluster, z, cosmo))
                    .collect()
            }
        }
    }
}

/// Dimensionless projected density: `Σ = 2 ρ_s r_s f(x)`.
fn nfw_f(x: f64) -> f64 {
    if (x - 1.0).abs() < X_ONE_EPS {
        return 1.0 / 3.0;
    }
    let x2m1 = x * x - 1.0;
    (1.0 - 2.0 * nfw_arc(x)) / x2m1
}

/// Dimensionless enclosed mass: `Σ̄(<x) = 4 ρ_s r_s h(x) / x²`.
fn nfw_h(x: f64) -> f64 {
    if (x - 1.0).abs() < X_ONE_EPS {
        return (0.5_f64).ln() + 1.0;
    }
    (x / 2.0).ln() + 2.0 * nfw_arc(x)
}

/// `atanh(sqrt((1-x)/(1+x))) / sqrt(1-x²)` for `x < 1`, the `atan` form for `x > 1`.
fn nfw_arc(x: f64) -> f64 {
    if x < 1.0 {
        ((1.0 - x) / (1.0 + x)).sqrt().atanh() / (1.0 - x * x).sqrt()
    } else {
        ((x - 1.0) / (1.0 + x)).sqrt().atan() / (x * x - 1.0).sqrt()
    }
}
