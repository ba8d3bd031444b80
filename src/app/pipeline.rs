//! Shared pipeline logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! catalog lookup -> filter resolution -> model -> kernel(s) -> fit -> residuals
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::f64::consts::PI;
use std::path::PathBuf;

use crate::data::{generate_observations, resolve_filter};
use crate::debug::{ValidationSetup, write_validation_report};
use crate::domain::{
    FitSettings, ObservationPoint, ObservationResidual, PhaseCurve, Planet, RunConfig, SimulationSettings,
    TemperatureMap,
};
use crate::error::AppError;
use crate::fit::{FitOutcome, fit_observations};
use crate::io::export::write_observations_csv;
use crate::io::ingest::{ObservationData, load_observations};
use crate::kernel::{KernelComparison, cross_validate, fast};
use crate::math::linspace;
use crate::models::Model;

/// Look up the planet and bandpass and build the model.
pub fn build_model(config: &RunConfig) -> Result<Model, AppError> {
    let planet = Planet::from_name(&config.planet)?;
    let filter = resolve_filter(&config.filter, config.filter_bins)?;
    log::debug!(
        "model inputs: planet '{}', filter '{}' ({} bins)",
        planet.name,
        filter.name,
        filter.wavelength.len()
    );
    Model::from_params(&config.params, planet, filter)
}

/// `n` phases spanning `[-π, π]`.
pub fn phase_grid(n: usize) -> Result<Vec<f64>, AppError> {
    if n < 2 {
        return Err(AppError::input(format!("Need at least 2 phases (got {n}).")));
    }
    Ok(linspace(-PI, PI, n))
}

/// Evaluate the configured model's phase curve with the fast kernel.
pub fn evaluate_curve(model: &Model, config: &RunConfig) -> Result<PhaseCurve, AppError> {
    let xi = phase_grid(config.n_phases)?;
    fast::thermal_phase_curve(model, &xi, config.params.f, &config.window_grid)
}

/// Outputs of `kelp curve`.
#[derive(Debug, Clone)]
pub struct CurveRun {
    pub model: Model,
    pub curve: PhaseCurve,
}

pub fn run_curve(config: &RunConfig) -> Result<CurveRun, AppError> {
    let model = build_model(config)?;
    let curve = evaluate_curve(&model, config)?;
    Ok(CurveRun { model, curve })
}

/// Outputs of `kelp map`.
#[derive(Debug, Clone)]
pub struct MapRun {
    pub model: Model,
    pub map: TemperatureMap,
}

pub fn run_map(config: &RunConfig, n_theta: usize, n_phi: usize) -> Result<MapRun, AppError> {
    let model = build_model(config)?;
    let map = model.temperature_map(n_theta, n_phi, config.params.f)?;
    Ok(MapRun { model, map })
}

/// Outputs of `kelp validate`.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    pub model: Model,
    pub comparison: KernelComparison,
    /// Markdown report, when `report_dir` was configured.
    pub report: Option<PathBuf>,
}

/// Cross-validate both kernels on the configured phase grid.
///
/// Exceeding the tolerance is not an error here; callers decide how to exit.
pub fn run_validation(config: &RunConfig) -> Result<ValidationRun, AppError> {
    let model = build_model(config)?;
    let xi = phase_grid(config.n_phases)?;
    let comparison = cross_validate(&model, &xi, config.params.f, &config.window_grid, &config.mesh)?;

    let report = match &config.report_dir {
        Some(dir) => {
            let setup = ValidationSetup {
                f: config.params.f,
                window_grid: config.window_grid,
                mesh: config.mesh,
                atol_ppm: config.atol_ppm,
            };
            Some(write_validation_report(dir, &model, &setup, &comparison)?)
        }
        None => None,
    };

    Ok(ValidationRun {
        model,
        comparison,
        report,
    })
}

/// Outputs of `kelp simulate`.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub model: Model,
    pub observations: Vec<ObservationPoint>,
}

/// Generate synthetic observations and write them to `settings.output`.
pub fn run_simulation(config: &RunConfig, settings: &SimulationSettings) -> Result<SimulationRun, AppError> {
    let model = build_model(config)?;
    let observations = generate_observations(&model, config.params.f, settings)?;
    write_observations_csv(&settings.output, &observations)?;
    log::info!(
        "wrote {} observations to {}",
        observations.len(),
        settings.output.display()
    );
    Ok(SimulationRun { model, observations })
}

/// Outputs of `kelp fit`.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub data: ObservationData,
    pub outcome: FitOutcome,
    pub residuals: Vec<ObservationResidual>,
    /// Best-fit curve on the configured phase grid.
    pub curve: PhaseCurve,
}

/// Load observations, fit them and evaluate the best-fit model.
pub fn run_fit(config: &RunConfig, settings: &FitSettings) -> Result<FitRun, AppError> {
    let start = build_model(config)?;
    let data = load_observations(&settings.data, &start.planet, settings.default_sigma_ppm)?;
    log::info!(
        "loaded {} of {} observations from {}",
        data.rows_used,
        data.rows_read,
        settings.data.display()
    );

    let outcome = fit_observations(
        &start,
        config.params.f,
        &data.points,
        settings,
        &config.window_grid,
        &config.mesh,
    )?;
    let residuals =
        crate::report::compute_residuals(&data.points, &outcome.model, config.params.f, &config.window_grid)?;
    let curve = evaluate_curve(&outcome.model, config)?;

    Ok(FitRun {
        data,
        outcome,
        residuals,
        curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterSource, ModelParams, PowerCoefficients, SphereGrid, WindowGrid};

    fn config() -> RunConfig {
        RunConfig {
            planet: "HD 189733".to_string(),
            filter: FilterSource::Catalog("IRAC 1".to_string()),
            filter_bins: Some(5),
            params: ModelParams {
                hotspot_offset: -0.8,
                alpha: 0.575,
                omega_drag: 4.5,
                a_b: 0.0,
                c_ml: PowerCoefficients::single(1, 1, 0.18).unwrap(),
                lmax: 1,
                f: 0.68,
            },
            n_phases: 50,
            window_grid: WindowGrid::default(),
            mesh: SphereGrid::default(),
            atol_ppm: 5.0,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_curve: None,
            export_model: None,
            report_dir: None,
        }
    }

    #[test]
    fn curve_run_uses_catalog_inputs() {
        let run = run_curve(&config()).unwrap();
        assert_eq!(run.model.filter.wavelength.len(), 5);
        assert_eq!(run.curve.len(), 50);
        assert!(run.curve.amplitude() > 100.0);
    }

    #[test]
    fn validation_passes_for_standard_parameters() {
        let run = run_validation(&config()).unwrap();
        assert!(run.comparison.within(5.0), "max diff {}", run.comparison.max_abs_diff);
        assert!(run.report.is_none());
        assert!(run.comparison.ensure_within(5.0).is_ok());
    }

    #[test]
    fn validation_over_tolerance_exits_with_one() {
        let mut cfg = config();
        cfg.atol_ppm = 1e-6;
        let run = run_validation(&cfg).unwrap();
        let err = run.comparison.ensure_within(cfg.atol_ppm).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn unknown_planet_is_registry_error() {
        let mut cfg = config();
        cfg.planet = "Nowhere 9".to_string();
        assert_eq!(run_curve(&cfg).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn simulate_then_fit_round_trip() {
        let cfg = config();
        let path = std::env::temp_dir().join(format!("kelp-sim-{}.csv", std::process::id()));
        let sim = SimulationSettings {
            n_points: 60,
            sigma_ppm: 5.0,
            seed: 7,
            output: path.clone(),
        };
        let simulated = run_simulation(&cfg, &sim).unwrap();
        assert_eq!(simulated.observations.len(), 60);

        let settings = FitSettings {
            data: path.clone(),
            default_sigma_ppm: 50.0,
            offset_range: (-1.5, 0.0),
            offset_steps: 16,
            c11_range: (0.05, 0.3),
            c11_steps: 11,
            free_circulation: false,
            max_iters: 30,
        };
        let fit = run_fit(&cfg, &settings).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(fit.residuals.len(), 60);
        assert!((fit.outcome.model.hotspot_offset + 0.8).abs() < 0.1);
        assert!((fit.outcome.model.c_11() - 0.18).abs() < 0.03);
    }
}
