//! Fitting a phase-curve model to observations.
//!
//! Given:
//! - phase angles `ξ_i`
//! - observed fluxes `y_i` (ppm) with uncertainties `σ_i`
//! - a starting model
//!
//! we:
//! - grid search `(hotspot_offset, C_11)` with the fast kernel (parallel)
//! - refine the free parameters with Levenberg–Marquardt, taking the
//!   Jacobian from the differentiable kernel
//! - report parameter uncertainties from `(JᵀWJ)⁻¹`

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{FitSettings, ModelParams, ObservationPoint, SphereGrid, WindowGrid};
use crate::error::AppError;
use crate::fit::grid::offset_c11_grid;
use crate::kernel::differentiable::{Parameter, jacobian};
use crate::kernel::fast;
use crate::math::{covariance, normal_equations, solve_least_squares};
use crate::models::Model;

/// Relative χ² change below which the refinement stops.
const REL_TOL: f64 = 1e-9;
const LAMBDA_START: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e10;

/// Why an LM trial step was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    /// Valid parameters, but χ² did not drop.
    Uphill,
    /// The step left the valid parameter region or the kernel failed.
    Invalid,
}

/// Whether a run that saturated the damping ended at a minimum.
///
/// Saturated steps are tiny, so an invalid last trial means the fit is
/// pressed against a parameter bound rather than sitting at a minimum.
fn converged_at_saturation(last: Rejection) -> bool {
    last == Rejection::Uphill
}

/// Best grid point from stage 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBest {
    pub hotspot_offset: f64,
    pub c_11: f64,
    pub chi2: f64,
}

/// Result of a full fit.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub model: Model,
    pub params: ModelParams,
    /// Refined parameters, in the order of `uncertainties`.
    pub free: Vec<Parameter>,
    /// 1σ uncertainties from the covariance diagonal.
    pub uncertainties: Vec<f64>,
    pub chi2: f64,
    pub reduced_chi2: f64,
    /// `χ² + k ln n`.
    pub bic: f64,
    pub iterations: usize,
    pub converged: bool,
    pub grid: GridBest,
}

/// Fit `observations` starting from `start`.
///
/// Only `C_11` may be non-zero in `start` (the refinement kernel carries no
/// other coefficient). `f` is held fixed.
pub fn fit_observations(
    start: &Model,
    f: f64,
    observations: &[ObservationPoint],
    settings: &FitSettings,
    window_grid: &WindowGrid,
    mesh: &SphereGrid,
) -> Result<FitOutcome, AppError> {
    if observations.is_empty() {
        return Err(AppError::input("No observations to fit."));
    }
    if observations
        .iter()
        .any(|p| !(p.xi.is_finite() && p.flux_ppm.is_finite() && p.sigma_ppm.is_finite() && p.sigma_ppm > 0.0))
    {
        return Err(AppError::input(
            "Observations must be finite with sigma > 0.",
        ));
    }
    if !start.c_ml.is_c11_only() {
        return Err(AppError::input(
            "Fitting supports C_11 only; set every other C_ml to zero.",
        ));
    }

    let grid = grid_search(start, f, observations, settings, window_grid)?;
    log::info!(
        "grid search best: hotspot_offset = {:.4}, C_11 = {:.4}, chi2 = {:.3}",
        grid.hotspot_offset,
        grid.c_11,
        grid.chi2
    );

    let mut seeded = start.clone();
    seeded.hotspot_offset = grid.hotspot_offset;
    seeded.c_ml.set(1, 1, grid.c_11)?;

    if settings.free_circulation {
        refine(
            seeded,
            f,
            observations,
            mesh,
            [Parameter::HotspotOffset, Parameter::C11, Parameter::OmegaDrag, Parameter::Alpha],
            settings.max_iters,
            grid,
        )
    } else {
        refine(
            seeded,
            f,
            observations,
            mesh,
            [Parameter::HotspotOffset, Parameter::C11],
            settings.max_iters,
            grid,
        )
    }
}

/// χ² = Σ ((y - m) / σ)².
pub fn chi_squared(observations: &[ObservationPoint], model_ppm: &[f64]) -> f64 {
    observations
        .iter()
        .zip(model_ppm.iter())
        .map(|(p, m)| ((p.flux_ppm - m) / p.sigma_ppm).powi(2))
        .sum()
}

/// Stage 1: evaluate every `(hotspot_offset, C_11)` pair in parallel.
///
/// Candidates whose map goes non-physical are skipped.
pub fn grid_search(
    start: &Model,
    f: f64,
    observations: &[ObservationPoint],
    settings: &FitSettings,
    window_grid: &WindowGrid,
) -> Result<GridBest, AppError> {
    let candidates = offset_c11_grid(
        settings.offset_range,
        settings.offset_steps,
        settings.c11_range,
        settings.c11_steps,
    )?;
    let xi: Vec<f64> = observations.iter().map(|p| p.xi).collect();

    let scored: Vec<(usize, GridBest)> = candidates
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &(offset, c11))| {
            let mut m = start.clone();
            m.hotspot_offset = offset;
            m.c_ml.set(1, 1, c11).ok()?;
            let curve = fast::thermal_phase_curve(&m, &xi, f, window_grid).ok()?;
            let chi2 = chi_squared(observations, &curve.flux);
            chi2.is_finite().then_some((
                idx,
                GridBest {
                    hotspot_offset: offset,
                    c_11: c11,
                    chi2,
                },
            ))
        })
        .collect();

    log::debug!("grid search scored {} of {} candidates", scored.len(), candidates.len());

    // Deterministic selection: minimum χ², ties broken by grid index.
    scored
        .into_iter()
        .min_by(|a, b| {
            a.1.chi2
                .partial_cmp(&b.1.chi2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        })
        .map(|(_, best)| best)
        .ok_or_else(|| AppError::runtime("No valid grid candidates; every map was non-physical."))
}

fn with_values(model: &Model, f: f64, free: &[Parameter], values: &[f64]) -> Result<(Model, f64), AppError> {
    let mut m = model.clone();
    let mut f = f;
    for (p, &v) in free.iter().zip(values.iter()) {
        match p {
            Parameter::HotspotOffset => m.hotspot_offset = v,
            Parameter::OmegaDrag => m.omega_drag = v,
            Parameter::Alpha => m.alpha = v,
            Parameter::C11 => m.c_ml.set(1, 1, v)?,
            Parameter::BondAlbedo => m.a_b = v,
            Parameter::F => f = v,
        }
    }
    m.validate()?;
    Ok((m, f))
}

struct Evaluation<const N: usize> {
    flux: Vec<f64>,
    jac: Vec<[f64; N]>,
    chi2: f64,
}

fn evaluate<const N: usize>(
    model: &Model,
    f: f64,
    xi: &[f64],
    observations: &[ObservationPoint],
    mesh: &SphereGrid,
    free: [Parameter; N],
) -> Result<Evaluation<N>, AppError> {
    let (flux, jac) = jacobian(model, xi, f, mesh, free)?;
    let chi2 = chi_squared(observations, &flux);
    Ok(Evaluation { flux, jac, chi2 })
}

fn weighted_system<const N: usize>(
    eval: &Evaluation<N>,
    observations: &[ObservationPoint],
) -> (DMatrix<f64>, DVector<f64>) {
    let n = observations.len();
    let j = DMatrix::from_fn(n, N, |i, k| eval.jac[i][k]);
    let r = DVector::from_fn(n, |i, _| observations[i].flux_ppm - eval.flux[i]);
    let w = DVector::from_fn(n, |i, _| observations[i].sigma_ppm.powi(-2));
    normal_equations(&j, &r, &w)
}

/// Stage 2: Levenberg–Marquardt on the parameters in `free`.
fn refine<const N: usize>(
    start: Model,
    f: f64,
    observations: &[ObservationPoint],
    mesh: &SphereGrid,
    free: [Parameter; N],
    max_iters: usize,
    grid: GridBest,
) -> Result<FitOutcome, AppError> {
    let n = observations.len();
    if n <= N {
        return Err(AppError::input(format!(
            "Underdetermined fit: {n} observations for {N} free parameters."
        )));
    }
    let xi: Vec<f64> = observations.iter().map(|p| p.xi).collect();

    let mut model = start;
    let mut values: Vec<f64> = free.iter().map(|p| p.value(&model, f)).collect();
    let mut current = evaluate(&model, f, &xi, observations, mesh, free)?;
    let mut lambda = LAMBDA_START;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iters {
        iterations += 1;
        let (jtwj, jtwr) = weighted_system(&current, observations);

        let mut damped = jtwj.clone();
        for k in 0..N {
            let d = jtwj[(k, k)];
            damped[(k, k)] = d + lambda * if d > 0.0 { d } else { 1.0 };
        }
        let Some(delta) = solve_least_squares(&damped, &jtwr) else {
            log::warn!("LM step {iterations}: singular normal equations, stopping");
            break;
        };

        let trial: Vec<f64> = values.iter().zip(delta.iter()).map(|(v, d)| v + d).collect();
        let accepted = match with_values(&model, f, &free, &trial)
            .and_then(|(m, _)| evaluate(&m, f, &xi, observations, mesh, free).map(|e| (m, e)))
        {
            Ok((m, e)) if e.chi2 < current.chi2 => Ok((m, e)),
            Ok(_) => Err(Rejection::Uphill),
            Err(err) => {
                log::debug!("LM step {iterations}: trial rejected: {err}");
                Err(Rejection::Invalid)
            }
        };

        match accepted {
            Ok((m, e)) => {
                let rel = (current.chi2 - e.chi2) / current.chi2.max(f64::MIN_POSITIVE);
                log::debug!("LM step {iterations}: chi2 {:.6} -> {:.6}, lambda {lambda:.1e}", current.chi2, e.chi2);
                model = m;
                values = trial;
                current = e;
                lambda /= 10.0;
                if rel < REL_TOL {
                    converged = true;
                    break;
                }
            }
            Err(rejection) => {
                lambda *= 10.0;
                if lambda > LAMBDA_MAX {
                    converged = converged_at_saturation(rejection);
                    if !converged {
                        log::warn!(
                            "LM stopped at a parameter bound after {iterations} iterations; \
                             the fit is not at an interior minimum"
                        );
                    }
                    break;
                }
            }
        }
    }

    let (jtwj, _) = weighted_system(&current, observations);
    let uncertainties = match covariance(&jtwj) {
        Some(cov) => (0..N).map(|k| cov[(k, k)].max(0.0).sqrt()).collect(),
        None => {
            log::warn!("covariance is singular; uncertainties unavailable");
            vec![f64::NAN; N]
        }
    };

    let chi2 = current.chi2;
    let dof = (n - N) as f64;
    let bic = chi2 + N as f64 * (n as f64).ln();
    log::info!("LM finished after {iterations} iterations: chi2 = {chi2:.3}, converged = {converged}");

    Ok(FitOutcome {
        params: model.params(f),
        model,
        free: free.to_vec(),
        uncertainties,
        chi2,
        reduced_chi2: chi2 / dof,
        bic,
        iterations,
        converged,
        grid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Filter, Planet, PowerCoefficients};
    use crate::math::linspace;
    use std::path::PathBuf;

    fn planet() -> Planet {
        Planet {
            name: "Toy b".to_string(),
            per: 1.0,
            t0: 0.0,
            inc: 90.0,
            rp: 0.1,
            a: 5.0,
            t_secondary: 0.5,
            ecc: 0.0,
            w: 90.0,
            u: [0.0, 0.0],
            t_s: 5000.0,
            rp_a: 0.02,
        }
    }

    fn model(offset: f64, c11: f64) -> Model {
        let filter = Filter::new("flat", vec![3.0, 3.5, 4.0], vec![1.0, 1.0, 1.0]).unwrap();
        let c = PowerCoefficients::single(1, 1, c11).unwrap();
        Model::new(offset, 0.6, 4.5, 0.0, c, 1, planet(), filter).unwrap()
    }

    fn settings() -> FitSettings {
        FitSettings {
            data: PathBuf::from("unused.csv"),
            default_sigma_ppm: 10.0,
            offset_range: (-1.5, 1.5),
            offset_steps: 13,
            c11_range: (0.02, 0.3),
            c11_steps: 8,
            free_circulation: false,
            max_iters: 50,
        }
    }

    /// Noise-free observations from the differentiable kernel.
    fn observations(truth: &Model, f: f64) -> Vec<ObservationPoint> {
        let xi = linspace(-3.0, 3.0, 40);
        let (flux, _) = jacobian(truth, &xi, f, &SphereGrid::default(), [Parameter::C11]).unwrap();
        xi.into_iter()
            .zip(flux)
            .map(|(xi, flux_ppm)| ObservationPoint {
                xi,
                flux_ppm,
                sigma_ppm: 10.0,
            })
            .collect()
    }

    #[test]
    fn recovers_noise_free_parameters() {
        let f = 0.7;
        let truth = model(-0.45, 0.17);
        let obs = observations(&truth, f);

        let start = model(0.0, 0.1);
        let fit = fit_observations(&start, f, &obs, &settings(), &WindowGrid::default(), &SphereGrid::default())
            .unwrap();

        assert!((fit.params.hotspot_offset + 0.45).abs() < 1e-4, "{:?}", fit.params);
        assert!((fit.model.c_11() - 0.17).abs() < 1e-4);
        assert!(fit.chi2 < 1e-4);
        assert_eq!(fit.free, vec![Parameter::HotspotOffset, Parameter::C11]);
        assert!(fit.uncertainties.iter().all(|u| u.is_finite() && *u > 0.0));
        assert!((fit.bic - (fit.chi2 + 2.0 * 40f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn grid_search_brackets_truth() {
        let f = 0.7;
        let obs = observations(&model(-0.5, 0.18), f);
        let best = grid_search(&model(0.0, 0.1), f, &obs, &settings(), &WindowGrid::default()).unwrap();
        assert!((best.hotspot_offset + 0.5).abs() <= 0.25 + 1e-12);
        assert!((best.c_11 - 0.18).abs() <= 0.04 + 1e-12);
    }

    #[test]
    fn rejects_higher_order_start() {
        let filter = Filter::new("flat", vec![3.0, 4.0], vec![1.0, 1.0]).unwrap();
        let c = PowerCoefficients::single(2, 1, 0.1).unwrap();
        let start = Model::new(0.0, 0.6, 4.5, 0.0, c, 2, planet(), filter).unwrap();
        let obs = [ObservationPoint {
            xi: 0.0,
            flux_ppm: 100.0,
            sigma_ppm: 1.0,
        }];
        let err = fit_observations(&start, 0.7, &obs, &settings(), &WindowGrid::default(), &SphereGrid::default())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn saturation_on_a_bound_is_not_convergence() {
        assert!(converged_at_saturation(Rejection::Uphill));
        assert!(!converged_at_saturation(Rejection::Invalid));
    }

    #[test]
    fn chi_squared_weights_by_sigma() {
        let obs = [
            ObservationPoint { xi: 0.0, flux_ppm: 10.0, sigma_ppm: 2.0 },
            ObservationPoint { xi: 1.0, flux_ppm: 0.0, sigma_ppm: 1.0 },
        ];
        assert_eq!(chi_squared(&obs, &[6.0, 3.0]), 4.0 + 9.0);
    }
}
