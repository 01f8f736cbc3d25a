//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during binning and fitting
//! - saved to / loaded from JSON cluster files
//! - exported alongside fit results

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Sky projection used to compute separations and position angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    /// Planar approximation around the cluster center (valid for small separations).
    Flat,
    /// Exact spherical trigonometry.
    Curved,
}

/// Unit of the radial coordinate of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum RadiusUnit {
    #[serde(rename = "rad")]
    #[value(name = "rad")]
    Radian,
    #[serde(rename = "deg")]
    #[value(name = "deg")]
    Degree,
    #[serde(rename = "arcmin")]
    #[value(name = "arcmin")]
    Arcmin,
    #[serde(rename = "arcsec")]
    #[value(name = "arcsec")]
    Arcsec,
    #[serde(rename = "kpc")]
    #[value(name = "kpc")]
    Kpc,
    #[serde(rename = "Mpc")]
    #[value(name = "Mpc", alias = "mpc")]
    Mpc,
}

impl RadiusUnit {
    pub fn label(self) -> &'static str {
        match self {
            RadiusUnit::Radian => "rad",
            RadiusUnit::Degree => "deg",
            RadiusUnit::Arcmin => "arcmin",
            RadiusUnit::Arcsec => "arcsec",
            RadiusUnit::Kpc => "kpc",
            RadiusUnit::Mpc => "Mpc",
        }
    }

    /// Physical units need a cosmology and the cluster redshift.
    pub fn is_physical(self) -> bool {
        matches!(self, RadiusUnit::Kpc | RadiusUnit::Mpc)
    }

    /// Factor converting a physical radius in this unit to Mpc.
    pub fn to_mpc_factor(self) -> Option<f64> {
        match self {
            RadiusUnit::Kpc => Some(1e-3),
            RadiusUnit::Mpc => Some(1.0),
            _ => None,
        }
    }
}

/// How bin edges are laid out between a minimum and a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BinMethod {
    /// Uniform width in the coordinate itself.
    Linear,
    /// Alias of `Linear`.
    #[value(name = "evenwidth")]
    EvenWidth,
    /// Uniform width in `log10` of the coordinate.
    #[value(name = "evenlog10width")]
    EvenLog10Width,
}

/// How the source redshift distribution enters the binned shear model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ZSourceModel {
    /// One effective source redshift per bin (the mean member redshift).
    #[value(name = "single")]
    SingleRedshift,
    /// Average of the prediction over every member's redshift.
    #[value(name = "distribution")]
    RedshiftDistribution,
}

impl ZSourceModel {
    pub const ALL: [ZSourceModel; 2] = [ZSourceModel::SingleRedshift, ZSourceModel::RedshiftDistribution];

    pub fn display_name(self) -> &'static str {
        match self {
            ZSourceModel::SingleRedshift => "single-z",
            ZSourceModel::RedshiftDistribution => "z-distribution",
        }
    }
}

/// Halo density profile shape passed through to the shear predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HaloProfile {
    Nfw,
}

/// A single background source galaxy.
///
/// The galaxy identifier is its index in the owning [`GalaxyCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Galaxy {
    /// Right ascension (degrees).
    pub ra: f64,
    /// Declination (degrees).
    pub dec: f64,
    pub e1: f64,
    pub e2: f64,
    /// Source redshift (point estimate).
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_err: Option<f64>,
}

/// Ordered, immutable collection of source galaxies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalaxyCatalog {
    galaxies: Vec<Galaxy>,
}

impl GalaxyCatalog {
    pub fn new(galaxies: Vec<Galaxy>) -> Self {
        Self { galaxies }
    }

    pub fn len(&self) -> usize {
        self.galaxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.galaxies.is_empty()
    }

    pub fn galaxies(&self) -> &[Galaxy] {
        &self.galaxies
    }

    pub fn get(&self, id: usize) -> Option<&Galaxy> {
        self.galaxies.get(id)
    }

    pub fn column(&self, f: impl Fn(&Galaxy) -> f64) -> Vec<f64> {
        self.galaxies.iter().map(f).collect()
    }

    pub fn redshifts(&self) -> Vec<f64> {
        self.column(|g| g.z)
    }

    /// Reject galaxies with `ra` outside `[-360, 360]`, `dec` outside `[-90, 90]`,
    /// or a redshift that is negative or not finite.
    pub fn validate_coordinates(&self) -> Result<(), AppError> {
        for (id, g) in self.galaxies.iter().enumerate() {
            if !(-360.0..=360.0).contains(&g.ra) {
                return Err(AppError::invalid_input(format!(
                    "Galaxy {id} has an invalid ra: {}",
                    g.ra
                )));
            }
            if !(-90.0..=90.0).contains(&g.dec) {
                return Err(AppError::invalid_input(format!(
                    "Galaxy {id} has an invalid dec: {}",
                    g.dec
                )));
            }
            if !(g.z.is_finite() && g.z >= 0.0) {
                return Err(AppError::invalid_input(format!(
                    "Galaxy {id} has an invalid redshift: {}",
                    g.z
                )));
            }
        }
        Ok(())
    }
}

/// Cluster center and redshift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub unique_id: String,
    /// Right ascension (degrees).
    pub ra: f64,
    /// Declination (degrees).
    pub dec: f64,
    pub z: f64,
}

impl ClusterInfo {
    pub fn new(unique_id: impl Into<String>, ra: f64, dec: f64, z: f64) -> Result<Self, AppError> {
        if !(-360.0..=360.0).contains(&ra) {
            return Err(AppError::invalid_input(format!(
                "ra {ra} not in valid bounds: [-360, 360]"
            )));
        }
        if !(-90.0..=90.0).contains(&dec) {
            return Err(AppError::invalid_input(format!(
                "dec {dec} not in valid bounds: [-90, 90]"
            )));
        }
        if !(z.is_finite() && z >= 0.0) {
            return Err(AppError::invalid_input(format!("z {z} must be >= 0")));
        }
        Ok(Self {
            unique_id: unique_id.into(),
            ra,
            dec,
            z,
        })
    }
}

/// A cluster together with its background galaxy catalog (the unit that is
/// saved to and loaded from disk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterData {
    pub cluster: ClusterInfo,
    pub catalog: GalaxyCatalog,
}

/// Aggregates for one radial bin.
///
/// For an empty bin `count == 0` and every statistic is NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileBin {
    pub lower: f64,
    pub upper: f64,
    /// Arithmetic or geometric midpoint, depending on the bin layout.
    pub center: f64,
    pub count: usize,
    /// Mean radius of the members (the x-value used for fitting).
    pub radius: f64,
    pub radius_err: f64,
    pub gt: f64,
    pub gt_err: f64,
    pub gx: f64,
    pub gx_err: f64,
    pub z: f64,
    pub z_err: f64,
}

impl ProfileBin {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Best-fit halo mass under one source-redshift model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassFit {
    pub model: ZSourceModel,
    pub log10_mass: f64,
    pub log10_mass_var: f64,
    /// `10^log10_mass` in solar masses.
    pub mass: f64,
    /// First-order propagated uncertainty: `mass * ln(10) * sqrt(log10_mass_var)`.
    pub mass_err: f64,
    pub chi2: f64,
    pub dof: usize,
    pub iterations: usize,
    pub converged: bool,
}

/// Levenberg–Marquardt settings, passed through unchanged to the solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Stop when the largest parameter step falls below this value.
    pub tolerance: f64,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    /// Treat `y_err` as absolute (do not rescale covariance by reduced chi-square).
    pub absolute_sigma: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            absolute_sigma: false,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub cluster_path: PathBuf,
    pub geometry: Geometry,
    pub radius_unit: RadiusUnit,

    pub bin_min: f64,
    pub bin_max: f64,
    pub n_bins: usize,
    pub bin_method: BinMethod,
    /// Explicit edges; when set they replace the generated layout above.
    pub bin_edges: Option<Vec<f64>>,

    /// Flat ΛCDM parameters.
    pub h0: f64,
    pub omega_m: f64,

    pub concentration: f64,
    pub delta_mdef: f64,
    pub halo_profile: HaloProfile,

    pub log10_mass_min: f64,
    pub log10_mass_max: f64,
    pub solver: SolverConfig,

    /// Known input mass (mocks), reported as a bias column.
    pub reference_mass: Option<f64>,
    pub export: Option<PathBuf>,
    pub debug: bool,
}
