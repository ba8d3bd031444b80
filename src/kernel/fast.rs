//! Production phase-curve kernel.
//!
//! For each phase `ξ` the integral runs over observer-frame longitudes
//! `w ∈ [-π/2, π/2]`, evaluating the map at planet longitude `φ = w - ξ`.
//! The visible window is therefore sampled exactly (the limb sits on the
//! first and last nodes) and no masking is needed.
//!
//! Phases are independent, so they are evaluated in parallel with rayon.

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::domain::{PhaseCurve, WindowGrid};
use crate::error::AppError;
use crate::math::trapz_weights;
use crate::models::{Bandpass, Model, h_ml};

/// Thermal phase curve (ppm) of `model` at phase angles `xi`.
pub fn thermal_phase_curve(
    model: &Model,
    xi: &[f64],
    f: f64,
    grid: &WindowGrid,
) -> Result<PhaseCurve, AppError> {
    grid.validate()?;
    if !(f.is_finite() && f > 0.0) {
        return Err(AppError::input(format!("f must be finite and > 0 (got {f}).")));
    }

    let bandpass = Bandpass::new(&model.filter.wavelength_m(), &model.filter.transmittance);
    let stellar = bandpass.intensity(model.planet.t_s);
    if !(stellar.is_finite() && stellar > 0.0) {
        return Err(AppError::runtime(format!(
            "Stellar band intensity is not positive for T_s = {} K in filter '{}'.",
            model.planet.t_s, model.filter.name
        )));
    }

    let theta = grid.theta();
    let window = grid.window();
    // sin²θ and cos(w) folded into the quadrature weights.
    let theta_w: Vec<f64> = theta
        .iter()
        .zip(trapz_weights(&theta))
        .map(|(t, w)| w * t.sin().powi(2))
        .collect();
    let window_w: Vec<f64> = window
        .iter()
        .zip(trapz_weights(&window))
        .map(|(p, w)| w * p.cos())
        .collect();

    let t_eq = model.equilibrium_temperature(f);
    let circ = model.circulation();
    let terms = model.c_ml.nonzero_terms();
    let rp_rs = model.planet.rp_rs();
    let scale = 1e6 * rp_rs * rp_rs / PI;

    log::debug!(
        "fast kernel: {} phases on a {}x{} window grid, T_eq = {:.1} K, {} h_ml terms",
        xi.len(),
        grid.n_theta,
        grid.n_phi,
        t_eq,
        terms.len()
    );

    let flux = xi
        .par_iter()
        .map(|&x| {
            let mut acc = 0.0;
            for (&w, &ww) in window.iter().zip(window_w.iter()) {
                let phi = w - x;
                for (&t, &tw) in theta.iter().zip(theta_w.iter()) {
                    let h: f64 = terms.iter().map(|&(l, m, c)| h_ml(&circ, m, l, t, phi, c)).sum();
                    let temperature = t_eq * (1.0 + h);
                    if !(temperature.is_finite() && temperature > 0.0) {
                        return Err(AppError::runtime(format!(
                            "Non-physical temperature {temperature} K at theta={t:.3}, phi={phi:.3}; \
                             reduce the C_ml amplitudes."
                        )));
                    }
                    acc += ww * tw * bandpass.intensity(temperature);
                }
            }
            Ok(scale * acc / stellar)
        })
        .collect::<Result<Vec<f64>, AppError>>()?;

    PhaseCurve::new(xi.to_vec(), flux)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Filter, Planet, PowerCoefficients};
    use crate::math::linspace;

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

    fn model_with_offset(c11: f64, offset: f64) -> Model {
        let filter = Filter::new("flat", vec![3.0, 3.5, 4.0, 4.5], vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        let c = PowerCoefficients::single(1, 1, c11).unwrap();
        Model::new(offset, 0.6, 4.5, 0.0, c, 1, planet(), filter).unwrap()
    }

    fn model(c11: f64) -> Model {
        model_with_offset(c11, -0.5)
    }

    #[test]
    fn uniform_planet_gives_flat_curve() {
        let m = model(0.0);
        let f = 1.0;
        let bp = Bandpass::new(&m.filter.wavelength_m(), &m.filter.transmittance);
        let ratio = bp.intensity(m.equilibrium_temperature(f)) / bp.intensity(m.planet.t_s);
        let expected = 1e6 * 0.1 * 0.1 * ratio;

        let xi = linspace(-PI, PI, 7);
        let grid = WindowGrid { n_theta: 60, n_phi: 120 };
        let pc = thermal_phase_curve(&m, &xi, f, &grid).unwrap();
        for v in &pc.flux {
            // Coarse-grid trapezoid error on ∬ sin²θ cos w.
            assert!(((v - expected) / expected).abs() < 2e-3, "{v} vs {expected}");
        }
        assert!(pc.amplitude() < 1e-9 * expected);
    }

    #[test]
    fn peak_moves_with_hotspot_offset() {
        // The map depends on φ + offset only, so F(ξ; Δφ) = F(ξ - Δφ; 0).
        let xi = linspace(-PI, PI, 181);
        let west = model_with_offset(0.2, -0.5).thermal_phase_curve(&xi, 1.0).unwrap();
        let east = model_with_offset(0.2, 0.5).thermal_phase_curve(&xi, 1.0).unwrap();
        let shift = east.peak_offset().unwrap() - west.peak_offset().unwrap();
        assert!((shift - 1.0).abs() < 0.04, "shift = {shift}");
        assert!((west.amplitude() - east.amplitude()).abs() < 1e-3 * west.amplitude());
    }

    #[test]
    fn rejects_negative_temperatures() {
        let m = model(50.0);
        let err = thermal_phase_curve(&m, &[0.0, 1.0], 1.0, &WindowGrid::default()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn rejects_coarse_grids() {
        let m = model(0.1);
        let grid = WindowGrid { n_theta: 2, n_phi: 10 };
        assert_eq!(thermal_phase_curve(&m, &[0.0], 1.0, &grid).unwrap_err().exit_code(), 2);
    }
}
