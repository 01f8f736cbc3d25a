//! Export a profile and its fits to JSON.
//!
//! Empty bins carry NaN statistics, which `serde_json` writes as `null`.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{ClusterInfo, MassFit, ProfileBin, RadiusUnit};
use crate::error::AppError;
use crate::profile::RadialProfile;

#[derive(Debug, Serialize)]
pub struct ResultsFile<'a> {
    pub tool: &'static str,
    pub created_at: DateTime<Utc>,
    pub cluster: &'a ClusterInfo,
    pub radius_unit: RadiusUnit,
    pub bins: &'a [ProfileBin],
    pub fits: &'a [MassFit],
}

pub fn write_results_json(
    path: &Path,
    cluster: &ClusterInfo,
    profile: &RadialProfile,
    fits: &[MassFit],
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create results JSON '{}': {e}", path.display())))?;

    let results = ResultsFile {
        tool: "wlmass",
        created_at: Utc::now(),
        cluster,
        radius_unit: profile.unit(),
        bins: profile.bins(),
        fits,
    };

    serde_json::to_writer_pretty(file, &results)
        .map_err(|e| AppError::io(format!("Failed to write results JSON: {e}")))?;
    Ok(())
}
