//! Least squares and pseudo-inverse helpers.
//!
//! Quantile regression by IRLS repeatedly solves small weighted least squares
//! problems of the form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - Everything goes through SVD so tall, badly scaled or nearly collinear
//!   designs degrade gracefully instead of panicking.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Parameter dimension is tiny (a handful of regressors), so SVD cost is
//!   negligible next to the number of fits.

use nalgebra::{DMatrix, DVector};

/// Relative tolerance below which a singular value counts as zero.
const RANK_RTOL: f64 = 1e-12;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Moore–Penrose pseudo-inverse with a tolerance relative to the largest
/// singular value.
pub fn pinv(a: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let svd = a.clone().svd(true, true);
    let smax = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let eps = (smax * RANK_RTOL).max(f64::MIN_POSITIVE);
    let inv = svd.pseudo_inverse(eps).ok()?;
    if inv.iter().all(|v| v.is_finite()) {
        Some(inv)
    } else {
        None
    }
}

/// Numerical rank of `a`.
pub fn matrix_rank(a: &DMatrix<f64>) -> usize {
    if a.is_empty() {
        return 0;
    }
    let sv = a.clone().svd(false, false).singular_values;
    let smax = sv.iter().copied().fold(0.0_f64, f64::max);
    if smax == 0.0 {
        return 0;
    }
    let tol = smax * RANK_RTOL * a.nrows().max(a.ncols()) as f64;
    sv.iter().filter(|&&s| s > tol).count()
}

/// Quadratic forms `x_i^T V x_i` for every row `x_i` of `x`.
pub fn row_quadratic_forms(x: &DMatrix<f64>, v: &DMatrix<f64>) -> Vec<f64> {
    let xv = x * v;
    (0..x.nrows())
        .map(|i| xv.row(i).dot(&x.row(i)))
        .collect()
}
