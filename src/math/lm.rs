//! Bounded Levenberg–Marquardt for weighted non-linear least squares.
//!
//! Minimizes
//!
//! ```text
//! χ²(p) = Σ ((y_i - f(x_i; p)) / σ_i)²
//! ```
//!
//! subject to box bounds on `p`. Each iteration solves the damped Gauss–Newton
//! step as the tall linear system
//!
//! ```text
//! [      J       ] δ = [ r ]
//! [ √λ·diag(JᵀJ) ]     [ 0 ]
//! ```
//!
//! where `J` is a forward-difference Jacobian of the weighted residuals `r`.
//! Trial points are projected back into the bounds.
//!
//! The reported covariance is `(JᵀJ)⁻¹` at the solution, rescaled by the reduced
//! chi-square unless `absolute_sigma` is set (the same convention as most
//! curve-fitting libraries).

use nalgebra::{DMatrix, DVector};

use crate::domain::SolverConfig;
use crate::error::{AppError, ensure_same_len};
use crate::math::ols::{pseudo_inverse, solve_least_squares};

/// Damping above which the solver gives up on finding a downhill step.
const LAMBDA_MAX: f64 = 1e10;

/// Box bounds, one `(lower, upper)` pair per parameter.
#[derive(Debug, Clone)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, AppError> {
        ensure_same_len("lower and upper bounds", lower.len(), upper.len())?;
        for (i, (lo, hi)) in lower.iter().zip(&upper).enumerate() {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(AppError::invalid_input(format!(
                    "Invalid bounds for parameter {i}: [{lo}, {hi}] (must be finite with lower < upper)."
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    pub fn scalar(lower: f64, upper: f64) -> Result<Self, AppError> {
        Self::new(vec![lower], vec![upper])
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    fn clamp(&self, params: &mut [f64]) {
        for ((p, lo), hi) in params.iter_mut().zip(&self.lower).zip(&self.upper) {
            *p = p.clamp(*lo, *hi);
        }
    }
}

/// Best-fit parameters and their covariance.
#[derive(Debug, Clone)]
pub struct LsqSolution {
    pub params: Vec<f64>,
    pub covariance: DMatrix<f64>,
    pub chi2: f64,
    pub dof: usize,
    pub iterations: usize,
    pub converged: bool,
}

/// Fit `model(x, params)` to `(y, y_err)` within `bounds`, starting from `p0`.
///
/// Fails with `InvalidInput` on non-positive or non-finite uncertainties and
/// with `Solver` if the model produces non-finite values.
pub fn least_squares_fit<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    y_err: &[f64],
    p0: &[f64],
    bounds: &Bounds,
    config: &SolverConfig,
) -> Result<LsqSolution, AppError>
where
    F: Fn(&[f64], &[f64]) -> Result<Vec<f64>, AppError>,
{
    ensure_same_len("x and y", x.len(), y.len())?;
    ensure_same_len("y and y_err", y.len(), y_err.len())?;
    ensure_same_len("initial parameters and bounds", p0.len(), bounds.len())?;
    if y.is_empty() {
        return Err(AppError::invalid_input("No data points to fit."));
    }
    if let Some(i) = y_err.iter().position(|s| !(s.is_finite() && *s > 0.0)) {
        return Err(AppError::invalid_input(format!(
            "Uncertainty {i} is not positive ({}); weighted least squares needs sigma > 0.",
            y_err[i]
        )));
    }
    if let Some(i) = y.iter().position(|v| !v.is_finite()) {
        return Err(AppError::invalid_input(format!("Observation {i} is not finite.")));
    }

    let problem = Problem {
        model: &model,
        x,
        y,
        y_err,
        bounds,
    };

    let mut params = p0.to_vec();
    bounds.clamp(&mut params);

    let mut residuals = problem.residuals(&params)?;
    let mut chi2 = residuals.norm_squared();
    let mut lambda = config.initial_lambda;
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..config.max_iterations {
        iterations = iter + 1;

        let jac = problem.jacobian(&params, &residuals)?;
        let Some(delta) = damped_step(&jac, &residuals, lambda) else {
            break;
        };

        let mut trial = params.clone();
        for (p, d) in trial.iter_mut().zip(delta.iter()) {
            *p += d;
        }
        bounds.clamp(&mut trial);

        let step_small = trial
            .iter()
            .zip(&params)
            .all(|(t, p)| (t - p).abs() <= config.tolerance * (p.abs() + config.tolerance));

        let trial_residuals = problem.residuals(&trial)?;
        let trial_chi2 = trial_residuals.norm_squared();

        if trial_chi2 <= chi2 {
            params = trial;
            residuals = trial_residuals;
            chi2 = trial_chi2;
            lambda *= config.lambda_down;
        } else {
            lambda *= config.lambda_up;
        }

        if step_small {
            converged = true;
            break;
        }
        if lambda > LAMBDA_MAX {
            break;
        }
    }

    let jac = problem.jacobian(&params, &residuals)?;
    let normal = jac.transpose() * &jac;
    let mut covariance = pseudo_inverse(&normal)
        .ok_or_else(|| AppError::solver("Could not invert the normal matrix at the solution."))?;

    let dof = y.len().saturating_sub(params.len());
    if !config.absolute_sigma && dof > 0 {
        covariance *= chi2 / dof as f64;
    }

    log::debug!(
        "least squares: params={params:?} chi2={chi2:.4} dof={dof} iterations={iterations} converged={converged}"
    );

    Ok(LsqSolution {
        params,
        covariance,
        chi2,
        dof,
        iterations,
        converged,
    })
}

struct Problem<'a, F> {
    model: &'a F,
    x: &'a [f64],
    y: &'a [f64],
    y_err: &'a [f64],
    bounds: &'a Bounds,
}

impl<F> Problem<'_, F>
where
    F: Fn(&[f64], &[f64]) -> Result<Vec<f64>, AppError>,
{
    /// Weighted residuals `(y - f) / σ`.
    fn residuals(&self, params: &[f64]) -> Result<DVector<f64>, AppError> {
        let f = (self.model)(self.x, params)?;
        ensure_same_len("model output and observations", f.len(), self.y.len())?;
        if let Some(i) = f.iter().position(|v| !v.is_finite()) {
            return Err(AppError::solver(format!(
                "Model returned a non-finite value at point {i} for parameters {params:?}."
            )));
        }
        Ok(DVector::from_iterator(
            self.y.len(),
            self.y
                .iter()
                .zip(&f)
                .zip(self.y_err)
                .map(|((y, f), s)| (y - f) / s),
        ))
    }

    /// Forward-difference Jacobian of the model, weighted by `1/σ`.
    ///
    /// Since `r = (y - f)/σ`, `∂f/∂p / σ = -(∂r/∂p)`.
    fn jacobian(&self, params: &[f64], r0: &DVector<f64>) -> Result<DMatrix<f64>, AppError> {
        let n = self.y.len();
        let m = params.len();
        let mut jac = DMatrix::<f64>::zeros(n, m);
        for j in 0..m {
            let mut h = f64::EPSILON.sqrt() * params[j].abs().max(1.0);
            if params[j] + h > self.bounds.upper[j] {
                h = -h;
            }
            let mut shifted = params.to_vec();
            shifted[j] += h;
            let r1 = self.residuals(&shifted)?;
            for i in 0..n {
                jac[(i, j)] = -(r1[i] - r0[i]) / h;
            }
        }
        Ok(jac)
    }
}

fn damped_step(jac: &DMatrix<f64>, residuals: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let n = jac.nrows();
    let m = jac.ncols();
    let normal = jac.transpose() * jac;

    let mut a = DMatrix::<f64>::zeros(n + m, m);
    let mut b = DVector::<f64>::zeros(n + m);
    a.rows_mut(0, n).copy_from(jac);
    b.rows_mut(0, n).copy_from(residuals);
    for j in 0..m {
        // Floor keeps the damping active for parameters with a vanishing gradient.
        a[(n + j, j)] = (lambda * normal[(j, j)].max(1e-12)).sqrt();
    }
    solve_least_squares(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn exp_model(x: &[f64], p: &[f64]) -> Result<Vec<f64>, AppError> {
        Ok(x.iter().map(|&t| p[0] * (-p[1] * t).exp()).collect())
    }

    fn linear_model(x: &[f64], p: &[f64]) -> Result<Vec<f64>, AppError> {
        Ok(x.iter().map(|v| p[0] * v).collect())
    }

    fn nan_model(x: &[f64], _p: &[f64]) -> Result<Vec<f64>, AppError> {
        Ok(vec![f64::NAN; x.len()])
    }

    #[test]
    fn recovers_exponential_decay() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|&t| 3.0 * (-0.7 * t).exp()).collect();
        let y_err = vec![0.01; x.len()];
        let bounds = Bounds::new(vec![0.0, 0.0], vec![10.0, 5.0]).unwrap();

        let sol = least_squares_fit(exp_model, &x, &y, &y_err, &[1.0, 0.2], &bounds, &SolverConfig::default())
            .unwrap();
        assert!(sol.converged);
        assert!((sol.params[0] - 3.0).abs() < 1e-6, "{:?}", sol.params);
        assert!((sol.params[1] - 0.7).abs() < 1e-6, "{:?}", sol.params);
    }

    #[test]
    fn linear_fit_covariance_matches_analytic() {
        // y = a x with known sigma: var(a) = 1 / Σ (x/σ)²
        let x = [1.0, 2.0, 3.0];
        let y = [2.1, 3.9, 6.2];
        let y_err = [0.5, 0.5, 0.5];
        let bounds = Bounds::scalar(-10.0, 10.0).unwrap();
        let config = SolverConfig {
            absolute_sigma: true,
            ..SolverConfig::default()
        };

        let sol = least_squares_fit(linear_model, &x, &y, &y_err, &[0.0], &bounds, &config).unwrap();
        let sxx: f64 = x.iter().map(|v| (v / 0.5) * (v / 0.5)).sum();
        let sxy: f64 = x.iter().zip(&y).map(|(a, b)| a * b / 0.25).sum();
        assert!((sol.params[0] - sxy / sxx).abs() < 1e-6);
        assert!((sol.covariance[(0, 0)] - 1.0 / sxx).abs() < 1e-6);
    }

    #[test]
    fn solution_respects_bounds() {
        let x = [1.0, 2.0, 3.0];
        let y = [5.0, 10.0, 15.0];
        let bounds = Bounds::scalar(0.0, 2.0).unwrap();
        let sol = least_squares_fit(linear_model, &x, &y, &[1.0; 3], &[1.0], &bounds, &SolverConfig::default()).unwrap();
        assert!(sol.params[0] <= 2.0 && sol.params[0] > 1.99);
    }

    #[test]
    fn rejects_non_positive_uncertainty() {
        let bounds = Bounds::scalar(0.0, 1.0).unwrap();
        let err = least_squares_fit(linear_model, &[1.0, 2.0], &[1.0, 2.0], &[0.1, 0.0], &[0.5], &bounds, &SolverConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn non_finite_model_is_solver_error() {
        let bounds = Bounds::scalar(0.0, 1.0).unwrap();
        let err = least_squares_fit(nan_model, &[1.0], &[1.0], &[0.1], &[0.5], &bounds, &SolverConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Solver);
    }

    #[test]
    fn bounds_must_be_ordered() {
        assert!(Bounds::scalar(2.0, 1.0).is_err());
    }

    #[test]
    fn bounds_need_one_pair_per_parameter() {
        let err = Bounds::new(vec![0.0], vec![1.0, 2.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeMismatch);

        let bounds = Bounds::new(vec![0.0, -1.0], vec![1.0, 2.0]).unwrap();
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds.lower(), &[0.0, -1.0]);
        assert_eq!(bounds.upper(), &[1.0, 2.0]);
    }
}
