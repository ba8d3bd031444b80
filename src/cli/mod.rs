//! Command-line parsing for the thermal phase curve toolkit.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the physics/fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::DEFAULT_F;
use crate::kernel::DEFAULT_ATOL_PPM;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "kelp", version, about = "Thermal phase curves of exoplanets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute a thermal phase curve, print a summary and optionally plot/export.
    Curve(CurveArgs),
    /// Print temperature map statistics and a heat map.
    Map(MapArgs),
    /// Run both kernels on the same phases and compare them.
    ///
    /// Exits with code 1 when the maximum difference exceeds `--atol`.
    Validate(ValidateArgs),
    /// Generate noisy synthetic observations to CSV.
    Simulate(SimulateArgs),
    /// Fit hotspot offset and C_11 (optionally circulation) to an observation CSV.
    Fit(FitArgs),
    /// Plot a previously exported model JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// Arrow keys adjust the model parameters; the phase curve is re-evaluated
    /// with the fast kernel on every change.
    Tui(ModelArgs),
}

/// Planet, bandpass, model parameters and integration grids.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Planet name from the bundled catalog (e.g. "HD 189733").
    #[arg(short = 'p', long, default_value = "HD 189733")]
    pub planet: String,

    /// Filter name or alias from the bundled catalog (e.g. "IRAC 1").
    #[arg(long, default_value = "IRAC 1")]
    pub filter: String,

    /// Treat `--filter` as an SVO Filter Profile Service ID (e.g. "Spitzer/IRAC.I1").
    #[arg(long)]
    pub svo: bool,

    /// Bin the filter down to this many wavelength bins.
    #[arg(long)]
    pub bins: Option<usize>,

    /// Hotspot offset (radians).
    #[arg(long, default_value_t = -0.8, allow_hyphen_values = true)]
    pub offset: f64,

    /// Dimensionless fluid number.
    #[arg(long, default_value_t = 0.575)]
    pub alpha: f64,

    /// Dimensionless drag frequency.
    #[arg(long, default_value_t = 4.5)]
    pub omega: f64,

    /// Bond albedo.
    #[arg(long = "a-b", default_value_t = 0.0)]
    pub a_b: f64,

    /// C_11 power coefficient (ignored when `--c-ml` is given).
    #[arg(long, default_value_t = 0.18, allow_hyphen_values = true)]
    pub c11: f64,

    /// Full C_ml matrix as JSON rows. Row `l` holds `m = 0..=l` followed by
    /// `m = -l..=-1` (e.g. `[[0],[0,0.18,0]]` for C_11 = 0.18).
    #[arg(long = "c-ml", value_name = "JSON")]
    pub c_ml: Option<String>,

    /// Greenhouse/redistribution factor.
    #[arg(short = 'f', long = "f-factor", default_value_t = DEFAULT_F)]
    pub f: f64,

    /// Number of phases on [-π, π].
    #[arg(short = 'n', long, default_value_t = 100)]
    pub phases: usize,

    /// Fast-kernel colatitude nodes.
    #[arg(long, default_value_t = 30)]
    pub window_theta: usize,

    /// Fast-kernel longitude nodes across the visible window.
    #[arg(long, default_value_t = 200)]
    pub window_phi: usize,

    /// Differentiable-kernel colatitude nodes.
    #[arg(long, default_value_t = 10)]
    pub mesh_theta: usize,

    /// Differentiable-kernel longitude nodes on [-2π, 2π].
    #[arg(long, default_value_t = 100)]
    pub mesh_phi: usize,

    /// Absolute tolerance (ppm) for kernel cross-validation.
    #[arg(long, default_value_t = DEFAULT_ATOL_PPM)]
    pub atol: f64,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the phase curve to CSV (`xi,phase,flux_ppm`).
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the model (params + curve grid) to JSON.
    #[arg(long = "export-model")]
    pub export_model: Option<PathBuf>,

    /// Write a Markdown report into this directory.
    #[arg(long, value_name = "DIR")]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CurveArgs {
    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Map colatitude nodes.
    #[arg(long, default_value_t = 45)]
    pub map_theta: usize,

    /// Map longitude nodes on [-π, π].
    #[arg(long, default_value_t = 90)]
    pub map_phi: usize,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Number of observations.
    #[arg(long, default_value_t = 200)]
    pub points: usize,

    /// Gaussian noise σ (ppm).
    #[arg(long, default_value_t = 40.0)]
    pub sigma: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV (`xi,flux,sigma`).
    #[arg(short = 'o', long, default_value = "observations.csv")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct FitArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Observation CSV; prompts with a picker when omitted.
    #[arg(short = 'd', long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// σ (ppm) assumed when the CSV has no sigma column.
    #[arg(long, default_value_t = 50.0)]
    pub default_sigma: f64,

    /// Grid search: minimum hotspot offset (radians).
    #[arg(long, default_value_t = -1.5, allow_hyphen_values = true)]
    pub offset_min: f64,

    /// Grid search: maximum hotspot offset (radians).
    #[arg(long, default_value_t = 1.5, allow_hyphen_values = true)]
    pub offset_max: f64,

    /// Grid search: hotspot offset steps.
    #[arg(long, default_value_t = 31)]
    pub offset_steps: usize,

    /// Grid search: minimum C_11.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub c11_min: f64,

    /// Grid search: maximum C_11.
    #[arg(long, default_value_t = 0.4, allow_hyphen_values = true)]
    pub c11_max: f64,

    /// Grid search: C_11 steps.
    #[arg(long, default_value_t = 21)]
    pub c11_steps: usize,

    /// Also refine omega_drag and alpha.
    #[arg(long)]
    pub free_circulation: bool,

    /// Maximum Levenberg-Marquardt iterations.
    #[arg(long, default_value_t = 50)]
    pub max_iters: usize,

    /// Export per-observation residuals to CSV.
    #[arg(long = "export-residuals")]
    pub export_residuals: Option<PathBuf>,

    /// Show the N observations with the largest normalized residuals.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

/// Options for plotting a saved model.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Model JSON produced by `kelp curve --export-model`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// Observation CSV to overlay.
    #[arg(short = 'd', long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
