//! Phase-curve integration kernels.
//!
//! Two independent implementations of the same integral:
//!
//! - [`fast`]: `f64`, window-aligned grid, parallel over phases
//! - [`differentiable`]: generic over [`crate::math::Real`], fixed mesh with masking
//!
//! [`cross_validate`] runs both on one model and reports how far apart they are.

pub mod differentiable;
pub mod fast;

use crate::domain::{SphereGrid, WindowGrid};
use crate::error::{AppError, EXIT_TOLERANCE};
use crate::models::Model;

/// Standard agreement tolerance between the kernels (ppm).
pub const DEFAULT_ATOL_PPM: f64 = 5.0;

/// Both kernels evaluated on the same phases.
#[derive(Debug, Clone)]
pub struct KernelComparison {
    pub xi: Vec<f64>,
    pub fast: Vec<f64>,
    pub differentiable: Vec<f64>,
    pub max_abs_diff: f64,
}

impl KernelComparison {
    pub fn within(&self, atol: f64) -> bool {
        self.max_abs_diff <= atol
    }

    /// `Ok` when the kernels agree to `atol`, otherwise an `EXIT_TOLERANCE` error.
    pub fn ensure_within(&self, atol: f64) -> Result<(), AppError> {
        if self.within(atol) {
            return Ok(());
        }
        Err(AppError::new(
            EXIT_TOLERANCE,
            format!(
                "Kernels disagree by {:.4} ppm (tolerance {:.2} ppm).",
                self.max_abs_diff, atol
            ),
        ))
    }

    /// `(xi, |fast - differentiable|)` at the phase with the largest disagreement.
    pub fn worst_phase(&self) -> Option<(f64, f64)> {
        self.xi
            .iter()
            .zip(self.fast.iter().zip(self.differentiable.iter()))
            .map(|(&x, (a, b))| (x, (a - b).abs()))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// Evaluate `model` with both kernels at phases `xi`.
///
/// The differentiable kernel only carries `C_11`, so any other non-zero
/// coefficient is rejected rather than silently dropped.
pub fn cross_validate(
    model: &Model,
    xi: &[f64],
    f: f64,
    window_grid: &WindowGrid,
    mesh: &SphereGrid,
) -> Result<KernelComparison, AppError> {
    if !model.c_ml.is_c11_only() {
        return Err(AppError::input(
            "Kernel cross-validation supports C_11 only; other C_ml must be zero.",
        ));
    }
    if xi.is_empty() {
        return Err(AppError::input("Kernel cross-validation needs at least one phase."));
    }

    let fast = fast::thermal_phase_curve(model, xi, f, window_grid)?;
    let slow = differentiable::phase_curve(model, xi, f, mesh)?;

    let mut max_abs_diff = 0.0_f64;
    for (a, b) in fast.flux.iter().zip(slow.flux.iter()) {
        let d = (a - b).abs();
        if !d.is_finite() {
            return Err(AppError::runtime("Kernel outputs contain non-finite flux."));
        }
        max_abs_diff = max_abs_diff.max(d);
    }

    log::info!(
        "cross-validated {} phases: max |fast - differentiable| = {:.4} ppm",
        xi.len(),
        max_abs_diff
    );

    Ok(KernelComparison {
        xi: xi.to_vec(),
        fast: fast.flux,
        differentiable: slow.flux,
        max_abs_diff,
    })
}
