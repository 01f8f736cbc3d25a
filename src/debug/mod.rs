//! Debug bundle writer for inspecting a profile and its fits.
//!
//! The bundle is a timestamped markdown file with the run configuration, every
//! bin (empty ones included), per-bin predictions of each fitted model and the
//! fit table.

use std::fmt::Write as _;
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::report::fmt_stat;

pub fn write_debug_bundle(dir: &Path, run: &RunOutput, config: &AnalysisConfig) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::io(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("wlmass_debug_{}_{ts}.md", run.data.cluster.unique_id));

    let text = render(run, config).map_err(|e| AppError::io(format!("Failed to format debug bundle: {e}")))?;
    write(&path, text).map_err(|e| AppError::io(format!("Failed to write debug file '{}': {e}", path.display())))?;

    log::info!("Wrote debug bundle {}", path.display());
    Ok(path)
}

fn render(run: &RunOutput, config: &AnalysisConfig) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let c = &run.data.cluster;
    let unit = run.profile.unit().label();

    writeln!(out, "# wlmass debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- cluster: {} (ra={}, dec={}, z={})", c.unique_id, c.ra, c.dec, c.z)?;
    writeln!(out, "- sources: {}", run.data.catalog.len())?;
    writeln!(out, "- geometry: {:?}, unit: {unit}", config.geometry)?;
    match &config.bin_edges {
        Some(edges) => writeln!(out, "- bins: custom edges {edges:?}")?,
        None => writeln!(
            out,
            "- bins: {} {:?} in [{}, {}]",
            config.n_bins, config.bin_method, config.bin_min, config.bin_max
        )?,
    }
    writeln!(out, "- cosmology: flat ΛCDM H0={} Ωm={}", config.h0, config.omega_m)?;
    writeln!(
        out,
        "- halo: {:?} c={} Δ={} (mean) | log10M bounds [{}, {}]",
        config.halo_profile, config.concentration, config.delta_mdef, config.log10_mass_min, config.log10_mass_max
    )?;
    writeln!(
        out,
        "- solver: max_iter={} tol={:e} absolute_sigma={}",
        config.solver.max_iterations, config.solver.tolerance, config.solver.absolute_sigma
    )?;

    writeln!(out, "\n## Profile ({unit})")?;
    writeln!(out, "| bin | lower | upper | center | n | radius | gt | gt_err | gx | gx_err | z | z_err |")?;
    writeln!(out, "| - | - | - | - | - | - | - | - | - | - | - | - |")?;
    for (i, b) in run.profile.bins().iter().enumerate() {
        writeln!(
            out,
            "| {i} | {:.4} | {:.4} | {:.4} | {} | {} | {} | {} | {} | {} | {} | {} |",
            b.lower,
            b.upper,
            b.center,
            b.count,
            fmt_stat(b.radius, 4),
            fmt_stat(b.gt, 6),
            fmt_stat(b.gt_err, 6),
            fmt_stat(b.gx, 6),
            fmt_stat(b.gx_err, 6),
            fmt_stat(b.z, 4),
            fmt_stat(b.z_err, 4),
        )?;
    }

    if run.fits.is_empty() {
        return Ok(out);
    }

    writeln!(out, "\n## Fits")?;
    writeln!(out, "| model | log10M | σ(log10M) | M | σ(M) | chi2 | dof | iter | converged |")?;
    writeln!(out, "| - | - | - | - | - | - | - | - | - |")?;
    for f in &run.fits {
        writeln!(
            out,
            "| {} | {:.5} | {:.5} | {:.4e} | {:.3e} | {:.4} | {} | {} | {} |",
            f.model.display_name(),
            f.log10_mass,
            f.log10_mass_var.max(0.0).sqrt(),
            f.mass,
            f.mass_err,
            f.chi2,
            f.dof,
            f.iterations,
            f.converged
        )?;
    }

    writeln!(out, "\n## Predictions at best fit")?;
    write!(out, "| radius | gt_obs | gt_err |")?;
    for p in &run.predictions {
        write!(out, " {} |", p.fit.model.display_name())?;
    }
    writeln!(out)?;
    writeln!(out, "|{}", " - |".repeat(3 + run.predictions.len()))?;
    for (i, b) in run.fitted_profile.bins().iter().enumerate() {
        write!(
            out,
            "| {} | {} | {} |",
            fmt_stat(b.radius, 4),
            fmt_stat(b.gt, 6),
            fmt_stat(b.gt_err, 6)
        )?;
        for p in &run.predictions {
            write!(out, " {} |", fmt_stat(p.gt_model.get(i).copied().unwrap_or(f64::NAN), 6))?;
        }
        writeln!(out)?;
    }

    Ok(out)
}
