//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - generates mock catalogs, or loads a cluster and bins it
//! - fits the halo mass under both source-redshift models
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;

use crate::cli::{Command, FitArgs, MockArgs, MockRedshifts, ProfileArgs};
use crate::data::{MockConfig, RedshiftDistribution, generate_mock_catalog};
use crate::domain::{AnalysisConfig, ClusterInfo, HaloProfile, SolverConfig};
use crate::error::AppError;
use crate::models::{FlatLambdaCdm, NfwShear};

pub mod pipeline;

/// Entry point for the `wlmass` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Mock(args) => handle_mock(&args),
        Command::Profile(args) => handle_profile(&args),
        Command::Fit(args) => handle_fit(&args),
    }
}

fn handle_mock(args: &MockArgs) -> Result<(), AppError> {
    let cluster = ClusterInfo::new(args.id.clone(), args.ra, args.dec, args.z_cluster)?;
    let cosmo = FlatLambdaCdm::new(args.h0, args.omega_m);
    let data = generate_mock_catalog(&cluster, &mock_config_from_args(args), &NfwShear, &cosmo)?;
    crate::io::save_cluster(&args.out, &data)?;
    println!("{}", crate::report::format_cluster_summary(&data));
    Ok(())
}

fn handle_profile(args: &ProfileArgs) -> Result<(), AppError> {
    let config = analysis_config_from_profile_args(args);
    let run = pipeline::run_analysis(&config, false)?;
    println!("{}", crate::report::format_cluster_summary(&run.data));
    println!("{}", crate::report::format_profile(&run.profile));
    Ok(())
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(args);
    let run = pipeline::run_analysis(&config, true)?;

    println!("{}", crate::report::format_cluster_summary(&run.data));
    println!("{}", crate::report::format_profile(&run.profile));
    println!("{}", crate::report::format_fit_comparison(&run.fits, config.reference_mass));
    println!(
        "{}",
        crate::report::format_predictions(&run.fitted_profile, &run.predictions)
    );

    if let Some(path) = &config.export {
        crate::io::write_results_json(path, &run.data.cluster, &run.profile, &run.fits)?;
    }
    if config.debug {
        let path = crate::debug::write_debug_bundle(Path::new("debug"), &run, &config)?;
        println!("Debug bundle: {}", path.display());
    }
    Ok(())
}

pub fn mock_config_from_args(args: &MockArgs) -> MockConfig {
    let redshifts = match args.zdist {
        MockRedshifts::Fixed => RedshiftDistribution::Fixed(args.z_source),
        MockRedshifts::Uniform => RedshiftDistribution::Uniform {
            min: args.z_min,
            max: args.z_max,
        },
        MockRedshifts::Chang13 => RedshiftDistribution::Chang13 { z_min: args.z_min },
    };
    MockConfig {
        seed: args.seed,
        n_galaxies: args.n_galaxies,
        mass: args.mass,
        concentration: args.concentration,
        delta_mdef: args.delta_mdef,
        half_width_mpc: args.half_width,
        redshifts,
        shape_noise: args.shape_noise,
    }
}

pub fn analysis_config_from_args(args: &FitArgs) -> AnalysisConfig {
    AnalysisConfig {
        concentration: args.concentration,
        delta_mdef: args.delta_mdef,
        halo_profile: args.halo_profile,
        log10_mass_min: args.log10_mass_min,
        log10_mass_max: args.log10_mass_max,
        solver: SolverConfig {
            max_iterations: args.max_iterations,
            tolerance: args.tolerance,
            absolute_sigma: args.absolute_sigma,
            ..SolverConfig::default()
        },
        reference_mass: args.reference_mass,
        export: args.export.clone(),
        debug: args.debug,
        ..analysis_config_from_profile_args(&args.profile)
    }
}

/// Binning-only configuration; fit settings take their defaults.
pub fn analysis_config_from_profile_args(args: &ProfileArgs) -> AnalysisConfig {
    AnalysisConfig {
        cluster_path: args.cluster.clone(),
        geometry: args.geometry,
        radius_unit: args.unit,
        bin_min: args.bin_min,
        bin_max: args.bin_max,
        n_bins: args.n_bins,
        bin_method: args.bin_method,
        bin_edges: args.bin_edges.clone(),
        h0: args.h0,
        omega_m: args.omega_m,
        concentration: 4.0,
        delta_mdef: 200.0,
        halo_profile: HaloProfile::Nfw,
        log10_mass_min: 12.0,
        log10_mass_max: 17.0,
        solver: SolverConfig::default(),
        reference_mass: None,
        export: None,
        debug: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn fit_flags_reach_the_config() {
        let cli = Cli::try_parse_from([
            "wlmass",
            "fit",
            "c.json",
            "--n-bins",
            "8",
            "--absolute-sigma",
            "--log10-mass-min",
            "13.5",
            "--reference-mass",
            "1e15",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let config = analysis_config_from_args(&args);
        assert_eq!(config.n_bins, 8);
        assert!(config.solver.absolute_sigma);
        assert_eq!(config.solver.lambda_up, SolverConfig::default().lambda_up);
        assert_eq!(config.log10_mass_min, 13.5);
        assert_eq!(config.reference_mass, Some(1e15));
        assert_eq!(config.cluster_path, Path::new("c.json"));
        assert_eq!(config.bin_edges, None);
    }

    #[test]
    fn custom_edges_reach_the_config() {
        let cli = Cli::try_parse_from(["wlmass", "profile", "c.json", "--bin-edges", "0.3,1,2.5"]).unwrap();
        let Command::Profile(args) = cli.command else {
            panic!("expected profile");
        };
        let config = analysis_config_from_profile_args(&args);
        assert_eq!(config.bin_edges, Some(vec![0.3, 1.0, 2.5]));
    }

    #[test]
    fn mock_flags_select_redshift_distribution() {
        let cli = Cli::try_parse_from(["wlmass", "mock", "-o", "m.json", "--zdist", "uniform", "--z-max", "2.5"])
            .unwrap();
        let Command::Mock(args) = cli.command else {
            panic!("expected mock");
        };
        let config = mock_config_from_args(&args);
        assert_eq!(config.redshifts, RedshiftDistribution::Uniform { min: 0.5, max: 2.5 });
    }
}
