//! Small dense linear solves for the Levenberg–Marquardt refinement.
//!
//! Each LM step solves the damped normal equations
//!
//! ```text
//! (JᵀWJ + λ diag(JᵀWJ)) δ = JᵀW r
//! ```
//!
//! for 2–4 parameters. The offset column vanishes as `C_11 → 0`, so solves
//! go through SVD with a tolerance ladder.

use nalgebra::{DMatrix, DVector};

/// Solve `x β = y` in the least-squares sense using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build `JᵀWJ` and `JᵀW r` for weighted residuals.
///
/// `jacobian` is `n × k`, `residuals` and `weights` have length `n`.
pub fn normal_equations(
    jacobian: &DMatrix<f64>,
    residuals: &DVector<f64>,
    weights: &DVector<f64>,
) -> (DMatrix<f64>, DVector<f64>) {
    let mut jw = jacobian.clone();
    for (mut row, &w) in jw.row_iter_mut().zip(weights.iter()) {
        row *= w;
    }
    let jtwj = jacobian.transpose() * &jw;
    let jtwr = jw.transpose() * residuals;
    (jtwj, jtwr)
}

/// Parameter covariance `(JᵀWJ)⁻¹`, falling back to the pseudo-inverse.
pub fn covariance(jtwj: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if let Some(inv) = jtwj.clone().try_inverse() {
        if inv.iter().all(|v| v.is_finite()) {
            return Some(inv);
        }
    }
    jtwj.clone().pseudo_inverse(1e-12).ok()
}
