use std::path::PathBuf;

use wl_mass::app::pipeline::{run_analysis, run_analysis_on};
use wl_mass::data::{MockConfig, RedshiftDistribution, generate_mock_catalog};
use wl_mass::domain::{
    AnalysisConfig, BinMethod, ClusterData, ClusterInfo, Galaxy, GalaxyCatalog, Geometry, HaloProfile, MassFit,
    RadiusUnit, SolverConfig, ZSourceModel,
};
use wl_mass::io::save_cluster;
use wl_mass::models::{Cosmology, FlatLambdaCdm, NfwShear};

const TRUE_LOG10_MASS: f64 = 15.0;

fn mock(redshifts: RedshiftDistribution) -> ClusterData {
    let cosmo = FlatLambdaCdm::default();
    let cluster = ClusterInfo::new("e2e", 150.0, 2.0, 0.4).unwrap();
    let config = MockConfig {
        seed: 1234,
        n_galaxies: 10_000,
        mass: 10f64.powf(TRUE_LOG10_MASS),
        concentration: 4.0,
        delta_mdef: 200.0,
        half_width_mpc: 4.0,
        redshifts,
        shape_noise: 0.0,
    };
    generate_mock_catalog(&cluster, &config, &NfwShear, &cosmo).unwrap()
}

fn config(cluster_path: PathBuf) -> AnalysisConfig {
    AnalysisConfig {
        cluster_path,
        geometry: Geometry::Flat,
        radius_unit: RadiusUnit::Mpc,
        bin_min: 0.2,
        bin_max: 4.0,
        n_bins: 15,
        bin_method: BinMethod::EvenLog10Width,
        bin_edges: None,
        h0: 70.0,
        omega_m: 0.27,
        concentration: 4.0,
        delta_mdef: 200.0,
        halo_profile: HaloProfile::Nfw,
        log10_mass_min: 13.0,
        log10_mass_max: 16.5,
        solver: SolverConfig::default(),
        reference_mass: Some(1e15),
        export: None,
        debug: false,
    }
}

fn fit_for(fits: &[MassFit], model: ZSourceModel) -> &MassFit {
    fits.iter().find(|f| f.model == model).unwrap()
}

#[test]
fn distribution_model_recovers_mass_and_single_z_is_biased_low() {
    let run = run_analysis_on(
        mock(RedshiftDistribution::Chang13 { z_min: 0.5 }),
        &config(PathBuf::new()),
        true,
    )
    .unwrap();

    assert_eq!(run.profile.n_bins(), 15);
    assert!(run.profile.bins().iter().all(|b| b.count > 0));

    let dist = fit_for(&run.fits, ZSourceModel::RedshiftDistribution);
    let single = fit_for(&run.fits, ZSourceModel::SingleRedshift);

    assert!(
        (dist.log10_mass - TRUE_LOG10_MASS).abs() < 0.02,
        "distribution fit: {dist:?}"
    );
    assert!(
        single.log10_mass < dist.log10_mass - 0.03,
        "single-z {} vs distribution {}",
        single.log10_mass,
        dist.log10_mass
    );
    assert!((single.log10_mass - TRUE_LOG10_MASS).abs() > (dist.log10_mass - TRUE_LOG10_MASS).abs());
    assert!(dist.mass_err > 0.0 && dist.mass_err.is_finite());
}

#[test]
fn models_agree_when_all_sources_share_a_redshift() {
    let run = run_analysis_on(mock(RedshiftDistribution::Fixed(1.0)), &config(PathBuf::new()), true).unwrap();
    let dist = fit_for(&run.fits, ZSourceModel::RedshiftDistribution);
    let single = fit_for(&run.fits, ZSourceModel::SingleRedshift);
    assert!((dist.log10_mass - single.log10_mass).abs() < 1e-6, "{dist:?} vs {single:?}");
    assert!((dist.log10_mass - TRUE_LOG10_MASS).abs() < 0.02);
}

#[test]
fn cluster_file_round_trip_feeds_the_profile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cluster.json");
    let data = mock(RedshiftDistribution::Uniform { min: 0.6, max: 2.0 });
    save_cluster(&path, &data).unwrap();

    let run = run_analysis(&config(path), false).unwrap();
    assert!(run.fits.is_empty());
    assert_eq!(run.data, data);
    let binned: usize = run.profile.bins().iter().map(|b| b.count).sum();
    assert!(binned > 0 && binned <= data.catalog.len());
    // Noise-free tangential shear: no cross signal.
    for b in run.profile.bins() {
        assert!(b.gx.abs() < 1e-9, "bin {b:?}");
    }
}

#[test]
fn sparse_noisy_catalog_fits_without_single_source_bins() {
    let cosmo = FlatLambdaCdm::default();
    let cluster = ClusterInfo::new("sparse", 150.0, 2.0, 0.4).unwrap();
    let mock = MockConfig {
        n_galaxies: 1000,
        shape_noise: 0.25,
        ..MockConfig::default()
    };
    let data = generate_mock_catalog(&cluster, &mock, &NfwShear, &cosmo).unwrap();
    let cfg = config(PathBuf::new());

    // Leave exactly one source in the innermost bin (0.2 to ~0.244 Mpc).
    let binned = run_analysis_on(data.clone(), &cfg, false).unwrap();
    let inner = binned.profile.member_ids(0).unwrap().to_vec();
    let mut galaxies: Vec<Galaxy> = data
        .catalog
        .galaxies()
        .iter()
        .enumerate()
        .filter(|(i, _)| !inner.contains(i))
        .map(|(_, g)| *g)
        .collect();
    let d_a = cosmo.angular_diameter_distance(cluster.z);
    galaxies.push(Galaxy {
        ra: cluster.ra,
        dec: cluster.dec + (0.21 / d_a).to_degrees(),
        e1: -0.05,
        e2: 0.0,
        z: 1.0,
        z_err: None,
    });
    let sparse = ClusterData {
        cluster: cluster.clone(),
        catalog: GalaxyCatalog::new(galaxies),
    };

    let run = run_analysis_on(sparse, &cfg, true).unwrap();
    assert_eq!(run.profile.bins()[0].count, 1);
    assert_eq!(run.profile.bins()[0].gt_err, 0.0);

    let usable = run.profile.bins().iter().filter(|b| b.count >= 2).count();
    assert_eq!(run.fitted_profile.n_bins(), usable);
    assert!(run.fitted_profile.bins().iter().all(|b| b.count >= 2 && b.gt_err > 0.0));

    assert_eq!(run.fits.len(), 2);
    for f in &run.fits {
        assert!((13.0..=16.5).contains(&f.log10_mass), "{f:?}");
        assert_eq!(f.dof, usable - 1);
    }
}

#[test]
fn custom_bin_edges_replace_the_generated_layout() {
    let custom = AnalysisConfig {
        bin_edges: Some(vec![0.3, 1.0, 2.5]),
        ..config(PathBuf::new())
    };
    let run = run_analysis_on(mock(RedshiftDistribution::Fixed(1.0)), &custom, false).unwrap();
    assert_eq!(run.profile.n_bins(), 2);
    assert_eq!(run.profile.bins()[0].lower, 0.3);
    assert_eq!(run.profile.bins()[1].upper, 2.5);

    let bad = AnalysisConfig {
        bin_edges: Some(vec![1.0, 0.5]),
        ..custom
    };
    assert!(run_analysis_on(mock(RedshiftDistribution::Fixed(1.0)), &bad, false).is_err());
}
