//! Command-line parsing for the weak-lensing mass estimator.
//!
//! Argument parsing and command dispatch stay separate from the binning and
//! fitting code; `app` turns these structs into an `AnalysisConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{BinMethod, Geometry, HaloProfile, RadiusUnit};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wlmass", version, about = "Weak-lensing galaxy-cluster mass estimation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a mock cluster catalog and save it as JSON.
    Mock(MockArgs),
    /// Bin a cluster catalog into a radial shear profile and print it.
    Profile(ProfileArgs),
    /// Bin a cluster catalog, then fit the halo mass under both source-redshift models.
    Fit(FitArgs),
}

/// Source redshift distribution for mocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MockRedshifts {
    /// Every source at `--z-source`.
    Fixed,
    /// Uniform in `[--z-min, --z-max)`.
    Uniform,
    /// Chang et al. (2013) distribution above `--z-min`.
    Chang13,
}

#[derive(Debug, Args, Clone)]
pub struct MockArgs {
    /// Output cluster JSON.
    #[arg(short = 'o', long, value_name = "JSON")]
    pub out: PathBuf,

    #[arg(long, default_value = "mock")]
    pub id: String,

    /// Cluster right ascension (deg).
    #[arg(long, default_value_t = 150.0, allow_negative_numbers = true)]
    pub ra: f64,

    /// Cluster declination (deg).
    #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
    pub dec: f64,

    /// Cluster redshift.
    #[arg(long = "z-cluster", default_value_t = 0.4)]
    pub z_cluster: f64,

    #[arg(short = 'n', long, default_value_t = 10_000)]
    pub n_galaxies: usize,

    /// Halo mass (M_sun).
    #[arg(long, default_value_t = 1e15)]
    pub mass: f64,

    #[arg(long, default_value_t = 4.0)]
    pub concentration: f64,

    #[arg(long, default_value_t = 200.0)]
    pub delta_mdef: f64,

    /// Half-width of the square source field (physical Mpc).
    #[arg(long, default_value_t = 4.0)]
    pub half_width: f64,

    #[arg(long, value_enum, default_value_t = MockRedshifts::Chang13)]
    pub zdist: MockRedshifts,

    #[arg(long = "z-source", default_value_t = 1.0)]
    pub z_source: f64,

    #[arg(long = "z-min", default_value_t = 0.5)]
    pub z_min: f64,

    #[arg(long = "z-max", default_value_t = 3.0)]
    pub z_max: f64,

    /// Per-component shape noise (0 disables).
    #[arg(long, default_value_t = 0.0)]
    pub shape_noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 70.0)]
    pub h0: f64,

    #[arg(long, default_value_t = 0.27)]
    pub omega_m: f64,
}

/// Options shared by `profile` and `fit`.
#[derive(Debug, Args, Clone)]
pub struct ProfileArgs {
    /// Cluster JSON produced by `wlmass mock` (or any compatible writer).
    #[arg(value_name = "CLUSTER_JSON")]
    pub cluster: PathBuf,

    #[arg(long, value_enum, default_value_t = Geometry::Flat)]
    pub geometry: Geometry,

    /// Radial unit of the bin edges.
    #[arg(long, value_enum, default_value_t = RadiusUnit::Mpc)]
    pub unit: RadiusUnit,

    #[arg(long, default_value_t = 0.2)]
    pub bin_min: f64,

    #[arg(long, default_value_t = 4.0)]
    pub bin_max: f64,

    #[arg(long, default_value_t = 15)]
    pub n_bins: usize,

    #[arg(long, value_enum, default_value_t = BinMethod::EvenLog10Width)]
    pub bin_method: BinMethod,

    /// Comma-separated custom bin edges; overrides the min/max/count/method flags.
    #[arg(long, value_delimiter = ',', value_name = "EDGES")]
    pub bin_edges: Option<Vec<f64>>,

    /// Hubble constant (km/s/Mpc) of the flat ΛCDM cosmology.
    #[arg(long, default_value_t = 70.0)]
    pub h0: f64,

    #[arg(long, default_value_t = 0.27)]
    pub omega_m: f64,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    #[arg(long, default_value_t = 4.0)]
    pub concentration: f64,

    /// Overdensity relative to the mean matter density.
    #[arg(long, default_value_t = 200.0)]
    pub delta_mdef: f64,

    #[arg(long, value_enum, default_value_t = HaloProfile::Nfw)]
    pub halo_profile: HaloProfile,

    #[arg(long, default_value_t = 12.0)]
    pub log10_mass_min: f64,

    #[arg(long, default_value_t = 17.0)]
    pub log10_mass_max: f64,

    /// Solver iteration budget.
    #[arg(long, default_value_t = 100)]
    pub max_iterations: usize,

    /// Solver step tolerance.
    #[arg(long, default_value_t = 1e-8)]
    pub tolerance: f64,

    /// Do not rescale the covariance by the reduced chi-square.
    #[arg(long)]
    pub absolute_sigma: bool,

    /// Known input mass (M_sun) to report the bias of each fit against.
    #[arg(long)]
    pub reference_mass: Option<f64>,

    /// Export profile + fits to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Write a markdown debug bundle under `debug/`.
    #[arg(long)]
    pub debug: bool,
}
