//! Synthetic cluster catalogs.
//!
//! Sources are scattered uniformly over a square of half-width `half_width_mpc`
//! (physical, at the cluster redshift) and sheared by the predictor at their own
//! radius and redshift. The output is fully determined by `seed`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::{ClusterData, ClusterInfo, Galaxy, GalaxyCatalog, HaloProfile};
use crate::error::AppError;
use crate::math::components_from_tangential;
use crate::models::{Cosmology, FixedHaloParams, ShearPredictor};

/// Chang et al. (2013) source density: `z^ALPHA exp(-(z/Z0)^BETA)`.
const CHANG13_ALPHA: f64 = 1.24;
const CHANG13_BETA: f64 = 1.01;
const CHANG13_Z0: f64 = 0.51;

/// Upper cut of the tabulated Chang13 distribution.
const CHANG13_Z_MAX: f64 = 5.0;
const CHANG13_TABLE_STEPS: usize = 5000;

/// How source redshifts are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RedshiftDistribution {
    Fixed(f64),
    Uniform { min: f64, max: f64 },
    /// Chang13 photometric distribution, truncated below `z_min`.
    Chang13 { z_min: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    pub seed: u64,
    pub n_galaxies: usize,
    /// Halo mass (`M_sun`).
    pub mass: f64,
    pub concentration: f64,
    pub delta_mdef: f64,
    pub half_width_mpc: f64,
    pub redshifts: RedshiftDistribution,
    /// Per-component intrinsic ellipticity dispersion; 0 disables noise.
    pub shape_noise: f64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_galaxies: 10_000,
            mass: 1e15,
            concentration: 4.0,
            delta_mdef: 200.0,
            half_width_mpc: 4.0,
            redshifts: RedshiftDistribution::Chang13 { z_min: 0.5 },
            shape_noise: 0.0,
        }
    }
}

pub fn generate_mock_catalog(
    cluster: &ClusterInfo,
    config: &MockConfig,
    predictor: &dyn ShearPredictor,
    cosmo: &dyn Cosmology,
) -> Result<ClusterData, AppError> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let sampler = RedshiftSampler::new(config.redshifts)?;
    let noise = if config.shape_noise > 0.0 {
        Some(
            Normal::new(0.0, config.shape_noise)
                .map_err(|e| AppError::invalid_input(format!("Shape noise distribution error: {e}")))?,
        )
    } else {
        None
    };

    let halo = FixedHaloParams {
        concentration: config.concentration,
        z_cluster: cluster.z,
        halo_profile: HaloProfile::Nfw,
        delta_mdef: config.delta_mdef,
    };
    let d_a = cosmo.angular_diameter_distance(cluster.z);
    if !(d_a.is_finite() && d_a > 0.0) {
        return Err(AppError::invalid_input(format!(
            "Cluster redshift {} gives a non-positive angular-diameter distance.",
            cluster.z
        )));
    }
    let cos_dec = cluster.dec.to_radians().cos();

    let h = config.half_width_mpc;
    let mut galaxies = Vec::with_capacity(config.n_galaxies);
    for _ in 0..config.n_galaxies {
        let x_east = rng.gen_range(-h..h);
        let y_north = rng.gen_range(-h..h);
        let z = sampler.sample(&mut rng);

        let r = x_east.hypot(y_north);
        let phi = x_east.atan2(y_north);
        let gt = if r > 0.0 {
            predictor.predict_reduced_tangential_shear(r, config.mass, &halo, z, cosmo)
        } else {
            0.0
        };
        let (mut e1, mut e2) = components_from_tangential(gt, 0.0, phi);
        if let Some(n) = &noise {
            e1 += n.sample(&mut rng);
            e2 += n.sample(&mut rng);
        }

        galaxies.push(Galaxy {
            ra: cluster.ra + (x_east / d_a).to_degrees() / cos_dec,
            dec: cluster.dec + (y_north / d_a).to_degrees(),
            e1,
            e2,
            z,
            z_err: None,
        });
    }

    log::info!(
        "Generated {} mock sources around {} (M={:.3e}, z={})",
        galaxies.len(),
        cluster.unique_id,
        config.mass,
        cluster.z
    );

    Ok(ClusterData {
        cluster: cluster.clone(),
        catalog: GalaxyCatalog::new(galaxies),
    })
}

fn validate(config: &MockConfig) -> Result<(), AppError> {
    if config.n_galaxies == 0 {
        return Err(AppError::invalid_input("Mock galaxy count must be > 0."));
    }
    if !(config.mass.is_finite() && config.mass > 0.0) {
        return Err(AppError::invalid_input(format!("Mock mass must be > 0, got {}.", config.mass)));
    }
    if !(config.concentration > 0.0 && config.delta_mdef > 0.0) {
        return Err(AppError::invalid_input("Concentration and delta_mdef must be > 0."));
    }
    if !(config.half_width_mpc.is_finite() && config.half_width_mpc > 0.0) {
        return Err(AppError::invalid_input("Mock field half-width must be > 0."));
    }
    if !(config.shape_noise >= 0.0) {
        return Err(AppError::invalid_input("Shape noise must be >= 0."));
    }
    Ok(())
}

enum RedshiftSampler {
    Fixed(f64),
    Uniform(f64, f64),
    /// Inverse CDF on a regular grid in `z`.
    Tabulated { z: Vec<f64>, cdf: Vec<f64> },
}

impl RedshiftSampler {
    fn new(dist: RedshiftDistribution) -> Result<Self, AppError> {
        match dist {
            RedshiftDistribution::Fixed(z) if z.is_finite() && z >= 0.0 => Ok(Self::Fixed(z)),
            RedshiftDistribution::Uniform { min, max } if min >= 0.0 && min < max && max.is_finite() => {
                Ok(Self::Uniform(min, max))
            }
            RedshiftDistribution::Chang13 { z_min } if (0.0..CHANG13_Z_MAX).contains(&z_min) => {
                Ok(chang13_table(z_min))
            }
            other => Err(AppError::invalid_input(format!("Invalid redshift distribution: {other:?}."))),
        }
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Self::Fixed(z) => *z,
            Self::Uniform(lo, hi) => rng.gen_range(*lo..*hi),
            Self::Tabulated { z, cdf } => {
                let u = rng.gen_range(0.0..1.0);
                let k = cdf.partition_point(|&c| c < u).clamp(1, cdf.len() - 1);
                let (c0, c1) = (cdf[k - 1], cdf[k]);
                let t = if c1 > c0 { (u - c0) / (c1 - c0) } else { 0.0 };
                z[k - 1] + t * (z[k] - z[k - 1])
            }
        }
    }
}

fn chang13_density(z: f64) -> f64 {
    z.powf(CHANG13_ALPHA) * (-(z / CHANG13_Z0).powf(CHANG13_BETA)).exp()
}

fn chang13_table(z_min: f64) -> RedshiftSampler {
    let dz = (CHANG13_Z_MAX - z_min) / CHANG13_TABLE_STEPS as f64;
    let z: Vec<f64> = (0..=CHANG13_TABLE_STEPS).map(|i| z_min + dz * i as f64).collect();
    let mut cdf = Vec::with_capacity(z.len());
    let mut acc = 0.0;
    cdf.push(0.0);
    for w in z.windows(2) {
        acc += 0.5 * (chang13_density(w[0]) + chang13_density(w[1])) * dz;
        cdf.push(acc);
    }
    for c in &mut cdf {
        *c /= acc;
    }
    RedshiftSampler::Tabulated { z, cdf }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Geometry;
    use crate::math::{cross, mean, tangential, theta_phi};
    use crate::models::{FlatLambdaCdm, NfwShear};

    fn cluster() -> ClusterInfo {
        ClusterInfo::new("mock", 150.0, 2.0, 0.4).unwrap()
    }

    #[test]
    fn same_seed_same_catalog() {
        let cosmo = FlatLambdaCdm::default();
        let config = MockConfig {
            n_galaxies: 200,
            shape_noise: 0.2,
            ..MockConfig::default()
        };
        let a = generate_mock_catalog(&cluster(), &config, &NfwShear, &cosmo).unwrap();
        let b = generate_mock_catalog(&cluster(), &config, &NfwShear, &cosmo).unwrap();
        assert_eq!(a, b);

        let other = MockConfig { seed: 7, ..config };
        let c = generate_mock_catalog(&cluster(), &other, &NfwShear, &cosmo).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn chang13_respects_cut_and_has_sensible_mean() {
        let cosmo = FlatLambdaCdm::default();
        let config = MockConfig {
            n_galaxies: 4000,
            redshifts: RedshiftDistribution::Chang13 { z_min: 0.5 },
            ..MockConfig::default()
        };
        let data = generate_mock_catalog(&cluster(), &config, &NfwShear, &cosmo).unwrap();
        let z = data.catalog.redshifts();
        assert!(z.iter().all(|&v| (0.5..=CHANG13_Z_MAX).contains(&v)));
        let m = mean(&z);
        assert!((m - 1.32).abs() < 0.05, "mean z = {m}");
    }

    #[test]
    fn noiseless_sources_are_tangentially_aligned() {
        let cosmo = FlatLambdaCdm::default();
        let config = MockConfig {
            n_galaxies: 300,
            redshifts: RedshiftDistribution::Fixed(1.0),
            ..MockConfig::default()
        };
        let data = generate_mock_catalog(&cluster(), &config, &NfwShear, &cosmo).unwrap();
        let c = &data.cluster;
        for g in data.catalog.galaxies() {
            let (_, phi) = theta_phi(c.ra, c.dec, g.ra, g.dec, Geometry::Flat);
            let gt = tangential(g.e1, g.e2, phi);
            let gx = cross(g.e1, g.e2, phi);
            assert!(gt.is_finite());
            assert!(gx.abs() < 1e-9, "gx={gx}, gt={gt}");
        }
    }

    #[test]
    fn invalid_configs_fail() {
        let cosmo = FlatLambdaCdm::default();
        let bad = [
            MockConfig {
                n_galaxies: 0,
                ..MockConfig::default()
            },
            MockConfig {
                mass: -1.0,
                ..MockConfig::default()
            },
            MockConfig {
                redshifts: RedshiftDistribution::Uniform { min: 2.0, max: 1.0 },
                ..MockConfig::default()
            },
        ];
        for config in bad {
            assert!(generate_mock_catalog(&cluster(), &config, &NfwShear, &cosmo).is_err());
        }
    }
}
