//! Distribution and descriptive-statistics helpers used by the quantile solver.
//!
//! Conventions follow the usual econometrics toolkits:
//! - sample quantiles interpolate linearly between order statistics
//! - standard deviations use the population (`ddof = 0`) denominator
//! - the check loss is `ρ_τ(u) = u · (τ − 1{u < 0})`

use std::f64::consts::{PI, SQRT_2};

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::function::erf::erfc_inv;

/// Linearly interpolated sample quantile of `values` at level `q ∈ [0, 1]`.
///
/// Returns `None` for an empty slice or when `values` contains `NaN`.
pub fn sample_quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Check (pinball) loss of a residual at quantile level `tau`.
pub fn check_loss(u: f64, tau: f64) -> f64 {
    if u < 0.0 { (tau - 1.0) * u } else { tau * u }
}

/// Epanechnikov kernel.
pub fn epanechnikov(u: f64) -> f64 {
    if u.abs() <= 1.0 { 0.75 * (1.0 - u * u) } else { 0.0 }
}

/// Standard normal density.
pub fn normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

/// Standard normal quantile function, `p ∈ (0, 1)`.
pub fn normal_ppf(p: f64) -> f64 {
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// Hall–Sheather (1988) bandwidth for sparsity estimation at quantile `tau`,
/// on the probability scale, for a test of size `alpha`.
pub fn hall_sheather(n: usize, tau: f64, alpha: f64) -> f64 {
    let z = normal_ppf(tau);
    let num = 1.5 * normal_pdf(z).powi(2);
    let den = 2.0 * z * z + 1.0;
    (n as f64).powf(-1.0 / 3.0) * normal_ppf(1.0 - alpha / 2.0).powf(2.0 / 3.0) * (num / den).powf(1.0 / 3.0)
}

/// Student-t critical value `t_{1 - alpha/2, df}`.
pub fn t_critical(alpha: f64, df: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let v = dist.inverse_cdf(1.0 - alpha / 2.0);
    v.is_finite().then_some(v)
}

/// Two-sided Student-t p-value of the statistic `t`.
pub fn t_two_sided_pvalue(t: f64, df: f64) -> Option<f64> {
    if t.is_nan() {
        return None;
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * dist.sf(t.abs())).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sample_quantile_interpolates_linearly() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_abs_diff_eq!(sample_quantile(&v, 0.0).unwrap(), 1.0);
        assert_abs_diff_eq!(sample_quantile(&v, 1.0).unwrap(), 4.0);
        assert_abs_diff_eq!(sample_quantile(&v, 0.5).unwrap(), 2.5);
        assert_abs_diff_eq!(sample_quantile(&v, 0.25).unwrap(), 1.75);
        assert!(sample_quantile(&[], 0.5).is_none());
        assert!(sample_quantile(&[1.0, f64::NAN], 0.5).is_none());
    }

    #[test]
    fn check_loss_is_asymmetric() {
        assert_abs_diff_eq!(check_loss(2.0, 0.9), 1.8);
        assert_abs_diff_eq!(check_loss(-2.0, 0.9), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(check_loss(0.0, 0.3), 0.0);
    }

    #[test]
    fn normal_helpers_match_reference_values() {
        assert_abs_diff_eq!(normal_ppf(0.5), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normal_ppf(0.975), 1.959964, epsilon = 1e-5);
        assert_abs_diff_eq!(normal_ppf(0.05), -1.644854, epsilon = 1e-5);
        assert_abs_diff_eq!(normal_pdf(0.0), 0.398942, epsilon = 1e-6);
    }

    #[test]
    fn epanechnikov_has_compact_support() {
        assert_abs_diff_eq!(epanechnikov(0.0), 0.75);
        assert_abs_diff_eq!(epanechnikov(1.5), 0.0);
        assert_abs_diff_eq!(epanechnikov(-0.5), 0.5625);
    }

    #[test]
    fn hall_sheather_shrinks_with_sample_size() {
        let small = hall_sheather(50, 0.5, 0.05);
        let large = hall_sheather(5000, 0.5, 0.05);
        assert!(small > large && large > 0.0);
    }

    #[test]
    fn student_t_tails() {
        let crit = t_critical(0.05, 1e6).unwrap();
        assert_abs_diff_eq!(crit, 1.96, epsilon = 1e-2);
        let p = t_two_sided_pvalue(0.0, 10.0).unwrap();
        assert_abs_diff_eq!(p, 1.0, epsilon = 1e-12);
        assert!(t_two_sided_pvalue(5.0, 30.0).unwrap() < 1e-3);
        assert!(t_critical(0.05, 0.0).is_none());
    }
}
