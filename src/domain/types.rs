//! Run configuration, observations and portable model files.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - derived from CLI flags
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Planet, PowerCoefficients, SphereGrid, WindowGrid};

/// Default greenhouse/redistribution factor `f = 2^{-1/2}`.
pub const DEFAULT_F: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Where a bandpass comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum FilterSource {
    /// Bundled catalog name or alias (e.g. `"IRAC 1"`).
    Catalog(String),
    /// SVO Filter Profile Service identifier (e.g. `"Spitzer/IRAC.I1"`).
    Svo(String),
}

impl FilterSource {
    pub fn label(&self) -> &str {
        match self {
            FilterSource::Catalog(name) | FilterSource::Svo(name) => name,
        }
    }
}

/// Physical and fitting parameters of the temperature-map model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Longitudinal hotspot offset (radians).
    pub hotspot_offset: f64,
    /// Dimensionless fluid number.
    pub alpha: f64,
    /// Dimensionless drag frequency.
    pub omega_drag: f64,
    /// Bond albedo.
    pub a_b: f64,
    pub c_ml: PowerCoefficients,
    pub lmax: usize,
    /// Greenhouse/redistribution factor.
    pub f: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub planet: String,
    pub filter: FilterSource,
    pub filter_bins: Option<usize>,
    pub params: ModelParams,

    /// Number of phases on `[-π, π]`.
    pub n_phases: usize,
    pub window_grid: WindowGrid,
    pub mesh: SphereGrid,
    /// Absolute tolerance (ppm) for kernel cross-validation.
    pub atol_ppm: f64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_curve: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
    /// Directory for Markdown validation reports.
    pub report_dir: Option<PathBuf>,
}

/// Settings for `kelp fit`.
#[derive(Debug, Clone)]
pub struct FitSettings {
    pub data: PathBuf,
    /// σ (ppm) used when the CSV has no `sigma` column.
    pub default_sigma_ppm: f64,
    pub offset_range: (f64, f64),
    pub offset_steps: usize,
    pub c11_range: (f64, f64),
    pub c11_steps: usize,
    /// Also refine `omega_drag` and `alpha`.
    pub free_circulation: bool,
    pub max_iters: usize,
}

/// Settings for `kelp simulate`.
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub n_points: usize,
    pub sigma_ppm: f64,
    pub seed: u64,
    pub output: PathBuf,
}

/// One photometric measurement of the phase curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    /// Orbital phase angle (radians).
    pub xi: f64,
    pub flux_ppm: f64,
    pub sigma_ppm: f64,
}

/// Observation paired with the model prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationResidual {
    pub point: ObservationPoint,
    pub model_ppm: f64,
    pub residual_ppm: f64,
}

/// A saved model file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub created: DateTime<Utc>,
    pub planet: Planet,
    pub filter: FilterSource,
    pub filter_bins: Option<usize>,
    pub params: ModelParams,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub xi: Vec<f64>,
    pub flux_ppm: Vec<f64>,
}
