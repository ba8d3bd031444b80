//! Integration grids and model outputs (phase curves, temperature maps).

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::{interp, linspace};

/// Planet-frame `(phi, theta)` mesh used by the differentiable kernel.
///
/// `theta` (colatitude) spans `[0, π]`; `phi` (longitude from the substellar
/// point) spans `[-2π, 2π]` so every visible window `[-ξ-π/2, -ξ+π/2]` with
/// `ξ ∈ [-π, π]` lies inside the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SphereGrid {
    pub n_theta: usize,
    pub n_phi: usize,
}

impl Default for SphereGrid {
    fn default() -> Self {
        Self {
            n_theta: 10,
            n_phi: 100,
        }
    }
}

impl SphereGrid {
    pub fn theta(&self) -> Vec<f64> {
        linspace(0.0, PI, self.n_theta)
    }

    pub fn phi(&self) -> Vec<f64> {
        linspace(-2.0 * PI, 2.0 * PI, self.n_phi)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.n_theta < 3 || self.n_phi < 8 {
            return Err(AppError::input(format!(
                "Sphere mesh too coarse: n_theta={} (>= 3), n_phi={} (>= 8).",
                self.n_theta, self.n_phi
            )));
        }
        Ok(())
    }
}

/// Observer-frame grid used by the fast kernel.
///
/// Longitudes are sampled on the visible window `[-π/2, π/2]` itself, so the
/// limb falls exactly on the first and last nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGrid {
    pub n_theta: usize,
    pub n_phi: usize,
}

impl Default for WindowGrid {
    fn default() -> Self {
        Self {
            n_theta: 30,
            n_phi: 200,
        }
    }
}

impl WindowGrid {
    pub fn theta(&self) -> Vec<f64> {
        linspace(0.0, PI, self.n_theta)
    }

    /// Longitudes relative to the sub-observer meridian.
    pub fn window(&self) -> Vec<f64> {
        linspace(-FRAC_PI_2, FRAC_PI_2, self.n_phi)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.n_theta < 3 || self.n_phi < 3 {
            return Err(AppError::input(format!(
                "Window grid too coarse: n_theta={} (>= 3), n_phi={} (>= 3).",
                self.n_theta, self.n_phi
            )));
        }
        Ok(())
    }
}

/// Planet-to-star flux ratio (ppm) versus orbital phase angle `ξ` (radians).
///
/// `ξ = 0` is secondary eclipse (dayside facing the observer), `ξ = ±π` is transit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseCurve {
    pub xi: Vec<f64>,
    pub flux: Vec<f64>,
}

impl PhaseCurve {
    pub fn new(xi: Vec<f64>, flux: Vec<f64>) -> Result<Self, AppError> {
        if xi.len() != flux.len() {
            return Err(AppError::runtime(format!(
                "Phase curve has {} phases but {} flux values.",
                xi.len(),
                flux.len()
            )));
        }
        Ok(Self { xi, flux })
    }

    pub fn len(&self) -> usize {
        self.xi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xi.is_empty()
    }

    /// Peak-to-trough amplitude (ppm).
    pub fn amplitude(&self) -> f64 {
        let (min, max) = self
            .flux
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if min.is_finite() && max.is_finite() {
            max - min
        } else {
            0.0
        }
    }

    /// Phase angle of maximum flux.
    pub fn peak_offset(&self) -> Option<f64> {
        self.xi
            .iter()
            .zip(self.flux.iter())
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(&x, _)| x)
    }

    /// Flux at secondary eclipse (`ξ = 0`), interpolated.
    pub fn eclipse_depth(&self) -> Option<f64> {
        self.interpolate(0.0)
    }

    /// Flux at transit (`ξ = ±π`); the mean of both ends when both are covered.
    pub fn nightside_flux(&self) -> Option<f64> {
        match (self.interpolate(-PI), self.interpolate(PI)) {
            (Some(a), Some(b)) => Some(0.5 * (a + b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// Linear interpolation at `x` (the curve need not be sorted).
    pub fn interpolate(&self, x: f64) -> Option<f64> {
        let (xs, ys) = self.sorted();
        interp(x, &xs, &ys)
    }

    fn sorted(&self) -> (Vec<f64>, Vec<f64>) {
        let mut pairs: Vec<(f64, f64)> = self
            .xi
            .iter()
            .copied()
            .zip(self.flux.iter().copied())
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        pairs.into_iter().unzip()
    }
}

/// Temperature (K) sampled on a planet-frame `(phi, theta)` grid.
///
/// `temperature` is row-major with one row per longitude: index `i_phi * n_theta + i_theta`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureMap {
    pub theta: Vec<f64>,
    pub phi: Vec<f64>,
    pub temperature: Vec<f64>,
}

impl TemperatureMap {
    pub fn at(&self, i_phi: usize, i_theta: usize) -> f64 {
        self.temperature[i_phi * self.theta.len() + i_theta]
    }

    pub fn max(&self) -> f64 {
        self.temperature.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.temperature.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Area-weighted (`sin θ`) mean over `|phi| <= π/2`.
    pub fn dayside_mean(&self) -> f64 {
        self.hemisphere_mean(|phi| phi.abs() <= FRAC_PI_2)
    }

    /// Area-weighted (`sin θ`) mean over `|phi| > π/2`.
    pub fn nightside_mean(&self) -> f64 {
        self.hemisphere_mean(|phi| phi.abs() > FRAC_PI_2)
    }

    fn hemisphere_mean(&self, include: impl Fn(f64) -> bool) -> f64 {
        let mut num = 0.0;
        let mut den = 0.0;
        for (i_phi, &phi) in self.phi.iter().enumerate() {
            if !include(phi) {
                continue;
            }
            for (i_theta, &theta) in self.theta.iter().enumerate() {
                let w = theta.sin();
                num += w * self.at(i_phi, i_theta);
                den += w;
            }
        }
        if den > 0.0 { num / den } else { f64::NAN }
    }
}
