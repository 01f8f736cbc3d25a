//! Tangential / cross shear for every source around the cluster center.
//!
//! The input catalog is never modified: derived columns live in a separate
//! [`AnnotatedCatalog`] that shares the catalog through an `Arc`. Each analysis
//! can therefore reuse the same catalog without hidden mutation.

use std::sync::Arc;

use crate::domain::{ClusterInfo, GalaxyCatalog, Geometry};
use crate::error::AppError;
use crate::math::{compute_theta_phi, decompose};

/// A catalog plus its derived columns, immutable once built.
#[derive(Debug, Clone)]
pub struct AnnotatedCatalog {
    cluster: ClusterInfo,
    catalog: Arc<GalaxyCatalog>,
    geometry: Geometry,
    /// Separation from the cluster center (rad).
    theta: Vec<f64>,
    /// Position angle east of north (rad).
    phi: Vec<f64>,
    gt: Vec<f64>,
    gx: Vec<f64>,
}

impl AnnotatedCatalog {
    pub fn cluster(&self) -> &ClusterInfo {
        &self.cluster
    }

    pub fn catalog(&self) -> &Arc<GalaxyCatalog> {
        &self.catalog
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn len(&self) -> usize {
        self.theta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.theta.is_empty()
    }

    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    pub fn gt(&self) -> &[f64] {
        &self.gt
    }

    pub fn gx(&self) -> &[f64] {
        &self.gx
    }
}

/// Compute separations, position angles, and tangential / cross components.
pub fn compute_tangential_and_cross_components(
    cluster: &ClusterInfo,
    catalog: Arc<GalaxyCatalog>,
    geometry: Geometry,
) -> Result<AnnotatedCatalog, AppError> {
    let (theta, phi) = compute_theta_phi(cluster, &catalog, geometry)?;
    let e1 = catalog.column(|g| g.e1);
    let e2 = catalog.column(|g| g.e2);
    let (gt, gx) = decompose(&e1, &e2, &phi)?;

    let n_center = theta.iter().filter(|&&t| t == 0.0).count();
    if n_center > 0 {
        log::debug!("{n_center} sources coincide with the cluster center; position angle set to 0");
    }

    Ok(AnnotatedCatalog {
        cluster: cluster.clone(),
        catalog,
        geometry,
        theta,
        phi,
        gt,
        gx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Galaxy;

    fn galaxy(ra: f64, dec: f64, e1: f64, e2: f64) -> Galaxy {
        Galaxy {
            ra,
            dec,
            e1,
            e2,
            z: 1.0,
            z_err: None,
        }
    }

    #[test]
    fn galaxy_north_of_cluster_with_pure_e1() {
        let cluster = ClusterInfo::new("c", 150.0, 2.0, 0.3).unwrap();
        let cat = Arc::new(GalaxyCatalog::new(vec![galaxy(150.0, 2.05, 0.3, 0.0)]));
        let out = compute_tangential_and_cross_components(&cluster, cat, Geometry::Flat).unwrap();
        assert!(out.phi()[0].abs() < 1e-12);
        assert!((out.gt()[0] + 0.3).abs() < 1e-12);
        assert!(out.gx()[0].abs() < 1e-12);
    }

    #[test]
    fn annotation_is_idempotent_and_leaves_catalog_untouched() {
        let cluster = ClusterInfo::new("c", 10.0, -5.0, 0.3).unwrap();
        let cat = Arc::new(GalaxyCatalog::new(vec![
            galaxy(10.01, -5.02, 0.1, -0.05),
            galaxy(9.97, -4.99, -0.2, 0.07),
            galaxy(10.0, -5.0, 0.1, 0.1),
        ]));
        let before = (*cat).clone();
        let a = compute_tangential_and_cross_components(&cluster, Arc::clone(&cat), Geometry::Curved).unwrap();
        let b = compute_tangential_and_cross_components(&cluster, Arc::clone(&cat), Geometry::Curved).unwrap();
        assert_eq!(a.theta(), b.theta());
        assert_eq!(a.gt(), b.gt());
        assert_eq!(a.gx(), b.gx());
        assert_eq!(*cat, before);
        // Source at the center: degenerate angle, no error.
        assert_eq!(a.theta()[2], 0.0);
        assert_eq!(a.phi()[2], 0.0);
    }

    #[test]
    fn invalid_source_coordinates_fail() {
        let cluster = ClusterInfo::new("c", 10.0, 0.0, 0.3).unwrap();
        let cat = Arc::new(GalaxyCatalog::new(vec![galaxy(10.0, 91.0, 0.0, 0.0)]));
        assert!(compute_tangential_and_cross_components(&cluster, cat, Geometry::Flat).is_err());
    }
}
