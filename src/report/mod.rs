//! Reporting utilities: residuals, outliers and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{ObservationPoint, ObservationResidual, WindowGrid};
use crate::error::AppError;
use crate::kernel::fast;
use crate::models::Model;

/// Evaluate `model` at each observed phase and pair it with the measurement.
pub fn compute_residuals(
    observations: &[ObservationPoint],
    model: &Model,
    f: f64,
    grid: &WindowGrid,
) -> Result<Vec<ObservationResidual>, AppError> {
    let xi: Vec<f64> = observations.iter().map(|p| p.xi).collect();
    let curve = fast::thermal_phase_curve(model, &xi, f, grid)?;

    let mut out = Vec::with_capacity(observations.len());
    for (p, &model_ppm) in observations.iter().zip(curve.flux.iter()) {
        if !model_ppm.is_finite() {
            return Err(AppError::runtime("Non-finite model prediction during residual computation."));
        }
        out.push(ObservationResidual {
            point: *p,
            model_ppm,
            residual_ppm: p.flux_ppm - model_ppm,
        });
    }
    Ok(out)
}

/// The `top_n` residuals with the largest `|residual| / σ`, worst first.
pub fn largest_residuals(residuals: &[ObservationResidual], top_n: usize) -> Vec<ObservationResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        normalized(b)
            .partial_cmp(&normalized(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(top_n);
    sorted
}

fn normalized(r: &ObservationResidual) -> f64 {
    (r.residual_ppm / r.point.sigma_ppm).abs()
}
