//! Read/write cluster JSON files.
//!
//! A cluster file holds one [`ClusterData`]: the cluster descriptor and its
//! source catalog. It is the hand-off between `wlmass mock` and the analysis
//! commands.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::domain::{ClusterData, ClusterInfo};
use crate::error::AppError;

pub fn save_cluster(path: &Path, data: &ClusterData) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create cluster file '{}': {e}", path.display())))?;
    serde_json::to_writer(BufWriter::new(file), data)
        .map_err(|e| AppError::io(format!("Failed to write cluster file '{}': {e}", path.display())))?;
    log::info!(
        "Saved cluster {} with {} sources to {}",
        data.cluster.unique_id,
        data.catalog.len(),
        path.display()
    );
    Ok(())
}

/// Load and re-validate a cluster file.
pub fn load_cluster(path: &Path) -> Result<ClusterData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open cluster file '{}': {e}", path.display())))?;
    let data: ClusterData = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::invalid_input(format!("Invalid cluster file '{}': {e}", path.display())))?;

    // Deserialization bypasses the constructor checks.
    let c = &data.cluster;
    ClusterInfo::new(c.unique_id.clone(), c.ra, c.dec, c.z)?;
    data.catalog.validate_coordinates()?;

    log::debug!("Loaded {} sources from {}", data.catalog.len(), path.display());
    Ok(data)
}
