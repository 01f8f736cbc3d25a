//! Bin-edge generation.
//!
//! Edges are strictly increasing, with `n_bins + 1` entries. Generated layouts
//! reproduce `min` and `max` exactly at the ends so that galaxies sitting on the
//! outer boundaries are not lost to round-off.

use serde::{Deserialize, Serialize};

use crate::domain::BinMethod;
use crate::error::AppError;

/// Ordered bin boundaries.
///
/// Deserialization goes through the same checks as [`BinEdges::from_custom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBinEdges")]
pub struct BinEdges {
    edges: Vec<f64>,
    /// Log-spaced layouts report geometric bin centers.
    log_spaced: bool,
}

#[derive(Deserialize)]
struct RawBinEdges {
    edges: Vec<f64>,
    #[serde(default)]
    log_spaced: bool,
}

impl TryFrom<RawBinEdges> for BinEdges {
    type Error = AppError;

    fn try_from(raw: RawBinEdges) -> Result<Self, Self::Error> {
        if raw.log_spaced && raw.edges.first().is_some_and(|&e| e <= 0.0) {
            return Err(AppError::invalid_input("Log-spaced bin edges must be positive."));
        }
        let edges = Self::from_custom(raw.edges, raw.log_spaced)?;
        Ok(Self {
            log_spaced: raw.log_spaced,
            ..edges
        })
    }
}

impl BinEdges {
    /// Validate caller-supplied edges.
    ///
    /// `require_positive` is for coordinates that cannot be negative (radii).
    pub fn from_custom(edges: Vec<f64>, require_positive: bool) -> Result<Self, AppError> {
        if edges.len() < 2 {
            return Err(AppError::invalid_input(format!(
                "Need at least 2 bin edges, got {}.",
                edges.len()
            )));
        }
        if let Some(i) = edges.iter().position(|e| !e.is_finite()) {
            return Err(AppError::invalid_input(format!("Bin edge {i} is not finite.")));
        }
        if require_positive && edges[0] < 0.0 {
            return Err(AppError::invalid_input(format!(
                "Bin edges must be non-negative, first edge is {}.",
                edges[0]
            )));
        }
        if let Some(i) = edges.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AppError::invalid_input(format!(
                "Bin edges must be strictly increasing: edges[{}]={} >= edges[{}]={}.",
                i,
                edges[i],
                i + 1,
                edges[i + 1]
            )));
        }
        Ok(Self {
            edges,
            log_spaced: false,
        })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn min(&self) -> f64 {
        self.edges[0]
    }

    pub fn max(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    pub fn is_log_spaced(&self) -> bool {
        self.log_spaced
    }

    /// Midpoint of bin `i`: geometric for log-spaced edges, arithmetic otherwise.
    pub fn center(&self, i: usize) -> f64 {
        let (lo, hi) = (self.edges[i], self.edges[i + 1]);
        if self.log_spaced {
            (lo * hi).sqrt()
        } else {
            0.5 * (lo + hi)
        }
    }

    /// Index of the bin containing `r`.
    ///
    /// Bins are half-open `[edges[i], edges[i+1])` except the last, which also
    /// includes its upper edge. Values outside the range (or NaN) map to `None`.
    pub fn find_bin(&self, r: f64) -> Option<usize> {
        if !(r >= self.min() && r <= self.max()) {
            return None;
        }
        if r == self.max() {
            return Some(self.n_bins() - 1);
        }
        // Number of edges <= r; at least 1 because r >= edges[0].
        let k = self.edges.partition_point(|&e| e <= r);
        Some(k - 1)
    }
}

/// Generate `n_bins` bins between `min` and `max` using `method`.
pub fn make_bins(min: f64, max: f64, n_bins: usize, method: BinMethod) -> Result<BinEdges, AppError> {
    if !(min.is_finite() && max.is_finite()) {
        return Err(AppError::invalid_input(format!(
            "Bin range must be finite: min={min}, max={max}."
        )));
    }
    if min >= max {
        return Err(AppError::invalid_input(format!(
            "Bin range is empty: min={min} must be < max={max}."
        )));
    }
    if n_bins < 1 {
        return Err(AppError::invalid_input("Number of bins must be >= 1."));
    }

    match method {
        BinMethod::Linear | BinMethod::EvenWidth => Ok(BinEdges {
            edges: lin_space(min, max, n_bins + 1),
            log_spaced: false,
        }),
        BinMethod::EvenLog10Width => {
            if min <= 0.0 {
                return Err(AppError::invalid_input(format!(
                    "Log-spaced bins need min > 0, got {min}."
                )));
            }
            Ok(BinEdges {
                edges: log10_space(min, max, n_bins + 1),
                log_spaced: true,
            })
        }
    }
}

/// `steps` evenly spaced points between `min` and `max` (inclusive, `steps >= 2`).
fn lin_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    let step = (max - min) / (steps as f64 - 1.0);
    let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
    out[steps - 1] = max;
    out
}

/// `steps` points evenly spaced in `log10` between `min` and `max` (inclusive).
fn log10_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    let lo = min.log10();
    let hi = max.log10();
    let step = (hi - lo) / (steps as f64 - 1.0);
    let mut out: Vec<f64> = (0..steps).map(|i| 10f64.powf(lo + step * i as f64)).collect();
    out[0] = min;
    out[steps - 1] = max;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn deserialized_edges_are_validated() {
        let ok: BinEdges = serde_json::from_str(r#"{"edges":[0.2,0.5,1.0],"log_spaced":true}"#).unwrap();
        assert_eq!(ok.n_bins(), 2);
        assert!(ok.is_log_spaced());

        for bad in [
            r#"{"edges":[3.0,1.0]}"#,
            r#"{"edges":[]}"#,
            r#"{"edges":[0.0,1.0],"log_spaced":true}"#,
        ] {
            assert!(serde_json::from_str::<BinEdges>(bad).is_err(), "{bad}");
        }

        let generated = make_bins(0.2, 4.0, 5, BinMethod::EvenLog10Width).unwrap();
        let back: BinEdges = serde_json::from_str(&serde_json::to_string(&generated).unwrap()).unwrap();
        assert_eq!(back, generated);
    }

    #[test]
    fn linear_includes_endpoints() {
        let e = make_bins(0.0, 10.0, 5, BinMethod::Linear).unwrap();
        assert_eq!(e.edges(), &[0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(e.n_bins(), 5);
        assert_eq!(e.center(0), 1.0);
    }

    #[test]
    fn evenwidth_is_alias_of_linear() {
        let a = make_bins(0.5, 3.0, 7, BinMethod::Linear).unwrap();
        let b = make_bins(0.5, 3.0, 7, BinMethod::EvenWidth).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn log_bins_have_geometric_centers() {
        let e = make_bins(1.0, 100.0, 2, BinMethod::EvenLog10Width).unwrap();
        assert!((e.edges()[1] - 10.0).abs() < 1e-12);
        assert!((e.center(0) - 10f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn invalid_ranges_fail() {
        let err = make_bins(5.0, 1.0, 10, BinMethod::Linear).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(make_bins(1.0, 1.0, 10, BinMethod::Linear).is_err());
        assert!(make_bins(1.0, 5.0, 0, BinMethod::Linear).is_err());
        assert!(make_bins(0.0, 5.0, 3, BinMethod::EvenLog10Width).is_err());
    }

    #[test]
    fn custom_edges_are_validated() {
        assert!(BinEdges::from_custom(vec![0.1, 0.5, 2.0], true).is_ok());
        assert!(BinEdges::from_custom(vec![0.1, 0.5, 0.5], true).is_err());
        assert!(BinEdges::from_custom(vec![0.1, 0.05, 2.0], true).is_err());
        assert!(BinEdges::from_custom(vec![-1.0, 0.5], true).is_err());
        assert!(BinEdges::from_custom(vec![-1.0, 0.5], false).is_ok());
        assert!(BinEdges::from_custom(vec![1.0], false).is_err());
    }

    #[test]
    fn edge_value_belongs_to_upper_bin() {
        let e = BinEdges::from_custom(vec![0.0, 1.0, 2.0, 3.0], false).unwrap();
        assert_eq!(e.find_bin(1.0), Some(1));
        assert_eq!(e.find_bin(2.0), Some(2));
        assert_eq!(e.find_bin(0.0), Some(0));
        assert_eq!(e.find_bin(0.999_999), Some(0));
    }

    #[test]
    fn last_bin_is_closed() {
        let e = BinEdges::from_custom(vec![0.0, 1.0, 2.0], false).unwrap();
        assert_eq!(e.find_bin(2.0), Some(1));
        assert_eq!(e.find_bin(2.000_001), None);
        assert_eq!(e.find_bin(-1e-9), None);
        assert_eq!(e.find_bin(f64::NAN), None);
    }

    proptest! {
        #[test]
        fn log_bins_have_constant_log_width(
            min in 1e-3f64..10.0,
            ratio in 1.01f64..1e4,
            n in 1usize..60,
        ) {
            let e = make_bins(min, min * ratio, n, BinMethod::EvenLog10Width).unwrap();
            let edges = e.edges();
            prop_assert_eq!(edges.len(), n + 1);
            let width = edges[1].log10() - edges[0].log10();
            for w in edges.windows(2) {
                prop_assert!(w[1] > w[0]);
                prop_assert!(((w[1].log10() - w[0].log10()) - width).abs() < 1e-9);
            }
        }

        #[test]
        fn find_bin_brackets_value(
            min in -100.0f64..100.0,
            span in 0.1f64..100.0,
            n in 1usize..40,
            u in 0.0f64..=1.0,
        ) {
            let e = make_bins(min, min + span, n, BinMethod::Linear).unwrap();
            let r = min + u * span;
            let i = e.find_bin(r).unwrap();
            let edges = e.edges();
            prop_assert!(edges[i] <= r);
            if i + 1 < edges.len() - 1 {
                prop_assert!(r < edges[i + 1]);
            } else {
                prop_assert!(r <= edges[i + 1]);
            }
        }
    }
}
