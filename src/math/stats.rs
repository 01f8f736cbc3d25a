//! Summary statistics over small samples.
//!
//! Empty samples yield NaN rather than an error; binning keeps empty bins as
//! data and leaves it to the caller to drop them.

/// Arithmetic mean (NaN for an empty slice).
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (`ddof = 0`).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Standard error of the mean: `std / sqrt(n)`.
pub fn std_error(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    std_dev(values) / (values.len() as f64).sqrt()
}
