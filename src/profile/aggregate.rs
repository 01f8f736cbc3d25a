//! Per-bin aggregation of galaxy quantities.
//!
//! Assignment uses [`BinEdges::find_bin`]: `edges[i] <= r < edges[i+1]`, with the
//! last bin closed on both ends. Galaxies outside the edges are dropped.

use crate::error::{AppError, ensure_same_len};
use crate::math::{mean, std_error};
use crate::profile::BinEdges;

/// Count, mean, and standard error of one quantity inside one bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinStat {
    pub count: usize,
    pub mean: f64,
    pub err: f64,
}

/// Bin index for each radius (`None` when out of range).
pub fn assign_bins(radius: &[f64], edges: &BinEdges) -> Vec<Option<usize>> {
    radius.iter().map(|&r| edges.find_bin(r)).collect()
}

/// Member ids per bin, in catalog order.
pub fn group_members(assignment: &[Option<usize>], n_bins: usize) -> Vec<Vec<usize>> {
    let mut members = vec![Vec::new(); n_bins];
    for (id, bin) in assignment.iter().enumerate() {
        if let Some(i) = *bin {
            members[i].push(id);
        }
    }
    members
}

/// Mean and standard error of `values` restricted to `ids`.
pub fn bin_statistic(values: &[f64], ids: &[usize]) -> BinStat {
    let picked: Vec<f64> = ids.iter().map(|&i| values[i]).collect();
    BinStat {
        count: picked.len(),
        mean: mean(&picked),
        err: std_error(&picked),
    }
}

/// Bin `values` by `radius` and summarize each bin.
///
/// Empty bins are kept with `count == 0` and NaN statistics.
pub fn compute_radial_averages(
    radius: &[f64],
    values: &[f64],
    edges: &BinEdges,
) -> Result<Vec<BinStat>, AppError> {
    ensure_same_len("radius/values", radius.len(), values.len())?;
    let members = group_members(&assign_bins(radius, edges), edges.n_bins());
    Ok(members.iter().map(|ids| bin_statistic(values, ids)).collect())
}
