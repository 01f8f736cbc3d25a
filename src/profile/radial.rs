//! Radial shear profile.
//!
//! A [`RadialProfile`] is built once from an annotated catalog and a set of bin
//! edges, and is immutable afterwards. When membership is tracked, each bin keeps
//! the catalog indices of its members; the galaxies themselves stay in the shared
//! catalog.

use std::sync::Arc;

use crate::domain::{GalaxyCatalog, ProfileBin, RadiusUnit};
use crate::error::{AppError, ErrorKind};
use crate::math::convert_theta;
use crate::models::Cosmology;
use crate::profile::{AnnotatedCatalog, BinEdges, assign_bins, bin_statistic, group_members};

/// Per-bin member ids into a shared catalog.
#[derive(Debug, Clone)]
pub struct Membership {
    catalog: Arc<GalaxyCatalog>,
    members: Vec<Vec<usize>>,
}

impl Membership {
    pub fn catalog(&self) -> &GalaxyCatalog {
        &self.catalog
    }

    pub fn members(&self) -> &[Vec<usize>] {
        &self.members
    }
}

#[derive(Debug, Clone)]
pub struct RadialProfile {
    unit: RadiusUnit,
    bins: Vec<ProfileBin>,
    membership: Option<Membership>,
}

impl RadialProfile {
    pub fn unit(&self) -> RadiusUnit {
        self.unit
    }

    pub fn bins(&self) -> &[ProfileBin] {
        &self.bins
    }

    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn has_membership(&self) -> bool {
        self.membership.is_some()
    }

    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    pub fn radii(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.radius).collect()
    }

    pub fn gt(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.gt).collect()
    }

    pub fn gt_err(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.gt_err).collect()
    }

    /// Catalog indices of the members of bin `i`.
    pub fn member_ids(&self, i: usize) -> Result<&[usize], AppError> {
        let membership = self.membership.as_ref().ok_or_else(missing_membership)?;
        membership
            .members
            .get(i)
            .map(Vec::as_slice)
            .ok_or_else(|| AppError::invalid_input(format!("Bin {i} out of range ({} bins).", self.n_bins())))
    }

    /// Redshifts of the members of bin `i`, in catalog order.
    pub fn member_redshifts(&self, i: usize) -> Result<Vec<f64>, AppError> {
        let ids = self.member_ids(i)?;
        let galaxies = self
            .membership
            .as_ref()
            .map(|m| m.catalog.galaxies())
            .unwrap_or_default();
        Ok(ids.iter().map(|&id| galaxies[id].z).collect())
    }

    /// A copy without empty bins (membership is dropped along with them).
    pub fn non_empty(&self) -> Self {
        self.retain_bins(|b| !b.is_empty())
    }

    /// A copy keeping only bins the fit can weight: at least two members and a
    /// finite, positive `gt_err`.
    pub fn fittable(&self) -> Self {
        self.retain_bins(|b| b.count >= 2 && b.gt_err.is_finite() && b.gt_err > 0.0)
    }

    fn retain_bins(&self, keep_bin: impl Fn(&ProfileBin) -> bool) -> Self {
        let keep: Vec<usize> = (0..self.n_bins()).filter(|&i| keep_bin(&self.bins[i])).collect();
        Self {
            unit: self.unit,
            bins: keep.iter().map(|&i| self.bins[i].clone()).collect(),
            membership: self.membership.as_ref().map(|m| Membership {
                catalog: Arc::clone(&m.catalog),
                members: keep.iter().map(|&i| m.members[i].clone()).collect(),
            }),
        }
    }
}

fn missing_membership() -> AppError {
    AppError::new(
        ErrorKind::MissingMembership,
        "Profile was built without membership tracking; rebuild it with membership enabled.",
    )
}

/// Bin an annotated catalog by radius.
///
/// `edges` are in `unit`. Physical units need `cosmo` and use the cluster
/// redshift for the angular-diameter distance.
pub fn make_radial_profile(
    annotated: &AnnotatedCatalog,
    unit: RadiusUnit,
    edges: &BinEdges,
    cosmo: Option<&dyn Cosmology>,
    track_membership: bool,
) -> Result<RadialProfile, AppError> {
    let radius = convert_theta(annotated.theta(), unit, annotated.cluster().z, cosmo)?;
    let members = group_members(&assign_bins(&radius, edges), edges.n_bins());

    let binned: usize = members.iter().map(Vec::len).sum();
    let dropped = annotated.len() - binned;
    if dropped > 0 {
        log::warn!(
            "{dropped} of {} sources fall outside [{}, {}] {} and are excluded",
            annotated.len(),
            edges.min(),
            edges.max(),
            unit.label()
        );
    }

    let z = annotated.catalog().redshifts();
    let bins = members
        .iter()
        .enumerate()
        .map(|(i, ids)| {
            let r = bin_statistic(&radius, ids);
            let gt = bin_statistic(annotated.gt(), ids);
            let gx = bin_statistic(annotated.gx(), ids);
            let zs = bin_statistic(&z, ids);
            ProfileBin {
                lower: edges.edges()[i],
                upper: edges.edges()[i + 1],
                center: edges.center(i),
                count: r.count,
                radius: r.mean,
                radius_err: r.err,
                gt: gt.mean,
                gt_err: gt.err,
                gx: gx.mean,
                gx_err: gx.err,
                z: zs.mean,
                z_err: zs.err,
            }
        })
        .collect();

    log::debug!("Built {} bins in {} from {binned} sources", edges.n_bins(), unit.label());

    Ok(RadialProfile {
        unit,
        bins,
        membership: track_membership.then(|| Membership {
            catalog: Arc::clone(annotated.catalog()),
            members,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClusterInfo, Galaxy, Geometry};
    use crate::models::FlatLambdaCdm;
    use crate::profile::compute_tangential_and_cross_components;

    /// Sources due north of a cluster at the equator, at the given offsets (arcmin).
    fn annotated(offsets_arcmin: &[f64]) -> AnnotatedCatalog {
        let cluster = ClusterInfo::new("p", 30.0, 0.0, 0.3).unwrap();
        let galaxies = offsets_arcmin
            .iter()
            .enumerate()
            .map(|(i, &d)| Galaxy {
                ra: 30.0,
                dec: d / 60.0,
                e1: -0.01 * (i + 1) as f64,
                e2: 0.0,
                z: 0.5 + 0.1 * i as f64,
                z_err: None,
            })
            .collect();
        compute_tangential_and_cross_components(&cluster, Arc::new(GalaxyCatalog::new(galaxies)), Geometry::Flat)
            .unwrap()
    }

    #[test]
    fn per_bin_means_and_membership() {
        let a = annotated(&[1.5, 2.5, 2.7, 9.0]);
        let edges = BinEdges::from_custom(vec![1.0, 2.0, 3.0, 4.0], true).unwrap();
        let p = make_radial_profile(&a, RadiusUnit::Arcmin, &edges, None, true).unwrap();
        assert_eq!(p.n_bins(), 3);
        assert_eq!(p.bins()[0].count, 1);
        assert_eq!(p.bins()[1].count, 2);
        assert!(p.bins()[2].is_empty());
        // Pure e1 due north: gt = -e1.
        assert!((p.bins()[0].gt - 0.01).abs() < 1e-12);
        assert!((p.bins()[1].gt - 0.025).abs() < 1e-12);
        assert!((p.bins()[1].radius - 2.6).abs() < 1e-9);
        assert_eq!(p.member_ids(1).unwrap(), &[1, 2]);
        let zs = p.member_redshifts(1).unwrap();
        assert!((zs[0] - 0.6).abs() < 1e-12 && (zs[1] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn membership_is_optional() {
        let a = annotated(&[1.5, 2.5]);
        let edges = BinEdges::from_custom(vec![1.0, 2.0, 3.0], true).unwrap();
        let p = make_radial_profile(&a, RadiusUnit::Arcmin, &edges, None, false).unwrap();
        assert!(!p.has_membership());
        assert_eq!(p.member_redshifts(0).unwrap_err().kind(), ErrorKind::MissingMembership);
    }

    #[test]
    fn non_empty_drops_empty_bins_and_their_members() {
        let a = annotated(&[1.5, 3.5]);
        let edges = BinEdges::from_custom(vec![1.0, 2.0, 3.0, 4.0], true).unwrap();
        let p = make_radial_profile(&a, RadiusUnit::Arcmin, &edges, None, true).unwrap();
        let q = p.non_empty();
        assert_eq!(q.n_bins(), 2);
        assert_eq!(q.member_ids(1).unwrap(), &[1]);
        assert!(q.gt().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn fittable_drops_single_member_bins() {
        let a = annotated(&[1.5, 2.5, 2.7, 3.5]);
        let edges = BinEdges::from_custom(vec![1.0, 2.0, 3.0, 4.0, 5.0], true).unwrap();
        let p = make_radial_profile(&a, RadiusUnit::Arcmin, &edges, None, true).unwrap();
        assert_eq!(p.non_empty().n_bins(), 3);

        let q = p.fittable();
        assert_eq!(q.n_bins(), 1);
        assert_eq!(q.bins()[0].count, 2);
        assert!(q.bins()[0].gt_err > 0.0);
        assert_eq!(q.member_ids(0).unwrap(), &[1, 2]);
    }

    #[test]
    fn physical_units_need_a_cosmology() {
        let a = annotated(&[1.5]);
        let edges = BinEdges::from_custom(vec![0.01, 10.0], true).unwrap();
        assert!(make_radial_profile(&a, RadiusUnit::Mpc, &edges, None, false).is_err());

        let cosmo = FlatLambdaCdm::default();
        let mpc = make_radial_profile(&a, RadiusUnit::Mpc, &edges, Some(&cosmo), false).unwrap();
        let kpc_edges = BinEdges::from_custom(vec![10.0, 10_000.0], true).unwrap();
        let kpc = make_radial_profile(&a, RadiusUnit::Kpc, &kpc_edges, Some(&cosmo), false).unwrap();
        assert!((kpc.bins()[0].radius / 1000.0 - mpc.bins()[0].radius).abs() < 1e-9);
    }
}
