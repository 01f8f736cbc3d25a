//! Formatted terminal output.
//!
//! Formatting lives here so the binning and fitting code stays free of
//! presentation concerns.

use crate::domain::{ClusterData, MassFit};
use crate::profile::RadialProfile;
use crate::report::FitPrediction;

/// Cluster descriptor plus the ranges of each catalog column.
pub fn format_cluster_summary(data: &ClusterData) -> String {
    let c = &data.cluster;
    let cat = &data.catalog;
    let mut out = String::new();
    out.push_str(&format!("=== wlmass - cluster {} ===\n", c.unique_id));
    out.push_str(&format!("Center: ra={:.5} dec={:.5} | z={:.4}\n", c.ra, c.dec, c.z));
    out.push_str(&format!("Sources: n={}\n", cat.len()));
    if cat.is_empty() {
        return out;
    }
    for (name, values) in [
        ("ra", cat.column(|g| g.ra)),
        ("dec", cat.column(|g| g.dec)),
        ("e1", cat.column(|g| g.e1)),
        ("e2", cat.column(|g| g.e2)),
        ("z", cat.redshifts()),
    ] {
        let (lo, hi) = range(&values);
        out.push_str(&format!("  {name:<4} [{lo:.4}, {hi:.4}]\n"));
    }
    out
}

/// One row per bin. Empty bins show `-` for their statistics.
pub fn format_profile(profile: &RadialProfile) -> String {
    let unit = profile.unit().label();
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>3} {:>19} {:>6} {:>10} {:>11} {:>10} {:>11} {:>10} {:>7}\n",
            "bin",
            format!("range [{unit}]"),
            "n",
            "radius",
            "gt",
            "gt_err",
            "gx",
            "gx_err",
            "z"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!("{:-<96}\n", ""));

    for (i, b) in profile.bins().iter().enumerate() {
        out.push_str(
            format!(
                "{:>3} {:>9.4}-{:<9.4} {:>6} {:>10} {:>11} {:>10} {:>11} {:>10} {:>7}\n",
                i,
                b.lower,
                b.upper,
                b.count,
                fmt_stat(b.radius, 4),
                fmt_stat(b.gt, 5),
                fmt_stat(b.gt_err, 5),
                fmt_stat(b.gx, 5),
                fmt_stat(b.gx_err, 5),
                fmt_stat(b.z, 3),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    let empty = profile.bins().iter().filter(|b| b.is_empty()).count();
    if empty > 0 {
        out.push_str(&format!("({empty} empty bins)\n"));
    }
    out
}

/// Side-by-side fit results. `reference_mass` (e.g. a mock input) adds a bias column.
pub fn format_fit_comparison(fits: &[MassFit], reference_mass: Option<f64>) -> String {
    let mut out = String::new();
    out.push_str("Mass fits:\n");
    for fit in fits {
        let sigma = fit.log10_mass_var.max(0.0).sqrt();
        out.push_str(&format!(
            "  {:<15} log10M={:.4} ± {:.4} | M={:.4e} ± {:.3e} | chi2/dof={:.3}/{} | iter={}{}",
            fit.model.display_name(),
            fit.log10_mass,
            sigma,
            fit.mass,
            fit.mass_err,
            fit.chi2,
            fit.dof,
            fit.iterations,
            if fit.converged { "" } else { " (not converged)" }
        ));
        if let Some(m) = reference_mass.filter(|m| *m > 0.0) {
            out.push_str(&format!(" | Δlog10M={:+.4}", fit.log10_mass - m.log10()));
        }
        out.push('\n');
    }
    out
}

/// Observed versus predicted shear per bin for each fitted model.
pub fn format_predictions(profile: &RadialProfile, predictions: &[FitPrediction]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>10} {:>11} {:>10}", "radius", "gt_obs", "gt_err"));
    for p in predictions {
        out.push_str(&format!(" {:>15}", p.fit.model.display_name()));
    }
    out.push('\n');
    for (i, b) in profile.bins().iter().enumerate() {
        out.push_str(&format!(
            "{:>10} {:>11} {:>10}",
            fmt_stat(b.radius, 4),
            fmt_stat(b.gt, 5),
            fmt_stat(b.gt_err, 5)
        ));
        for p in predictions {
            let v = p.gt_model.get(i).copied().unwrap_or(f64::NAN);
            out.push_str(&format!(" {:>15}", fmt_stat(v, 5)));
        }
        out.push('\n');
    }
    out
}

pub fn fmt_stat(v: f64, decimals: usize) -> String {
    if v.is_finite() {
        format!("{v:.decimals$}")
    } else {
        "-".to_string()
    }
}

fn range(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
