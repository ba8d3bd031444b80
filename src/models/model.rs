//! The thermal phase-curve model: planet + bandpass + temperature-map parameters.

use std::f64::consts::PI;

use crate::domain::{
    Filter, ModelParams, PhaseCurve, Planet, PowerCoefficients, TemperatureMap, WindowGrid,
};
use crate::error::AppError;
use crate::kernel;
use crate::math::linspace;
use crate::models::temperature::{Circulation, equilibrium_temperature, h_ml_sum};

/// Parameters of one thermal phase-curve model.
#[derive(Debug, Clone)]
pub struct Model {
    pub hotspot_offset: f64,
    pub alpha: f64,
    pub omega_drag: f64,
    pub a_b: f64,
    pub c_ml: PowerCoefficients,
    pub lmax: usize,
    pub planet: Planet,
    pub filter: Filter,
}

impl Model {
    /// Build and validate a model.
    ///
    /// Argument order follows the physical parameters first, then the catalog
    /// records: `(hotspot_offset, alpha, omega_drag, A_B, C_ml, lmax, planet, filter)`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hotspot_offset: f64,
        alpha: f64,
        omega_drag: f64,
        a_b: f64,
        c_ml: PowerCoefficients,
        lmax: usize,
        planet: Planet,
        filter: Filter,
    ) -> Result<Self, AppError> {
        let model = Self {
            hotspot_offset,
            alpha,
            omega_drag,
            a_b,
            c_ml,
            lmax,
            planet,
            filter,
        };
        model.validate()?;
        Ok(model)
    }

    /// Build from serializable parameters (the `f` factor is applied per evaluation).
    pub fn from_params(params: &ModelParams, planet: Planet, filter: Filter) -> Result<Self, AppError> {
        Self::new(
            params.hotspot_offset,
            params.alpha,
            params.omega_drag,
            params.a_b,
            params.c_ml.clone(),
            params.lmax,
            planet,
            filter,
        )
    }

    pub fn params(&self, f: f64) -> ModelParams {
        ModelParams {
            hotspot_offset: self.hotspot_offset,
            alpha: self.alpha,
            omega_drag: self.omega_drag,
            a_b: self.a_b,
            c_ml: self.c_ml.clone(),
            lmax: self.lmax,
            f,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.hotspot_offset.is_finite() {
            return Err(AppError::input("hotspot_offset must be finite."));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(AppError::input(format!("alpha must be > 0 (got {}).", self.alpha)));
        }
        if !(self.omega_drag.is_finite() && self.omega_drag > 0.0) {
            return Err(AppError::input(format!(
                "omega_drag must be > 0 (got {}).",
                self.omega_drag
            )));
        }
        if !(self.a_b.is_finite() && (0.0..1.0).contains(&self.a_b)) {
            return Err(AppError::input(format!("A_B must lie in [0, 1) (got {}).", self.a_b)));
        }
        if self.c_ml.lmax() != self.lmax {
            return Err(AppError::input(format!(
                "C_ml has {} rows but lmax = {} (expected lmax + 1 rows).",
                self.c_ml.lmax() + 1,
                self.lmax
            )));
        }
        self.planet.validate()
    }

    pub fn circulation(&self) -> Circulation {
        Circulation {
            omega_drag: self.omega_drag,
            alpha: self.alpha,
            hotspot_offset: self.hotspot_offset,
        }
    }

    /// `C_11`, the coefficient the differentiable kernel supports.
    pub fn c_11(&self) -> f64 {
        self.c_ml.get(1, 1)
    }

    pub fn equilibrium_temperature(&self, f: f64) -> f64 {
        equilibrium_temperature(self.planet.t_s, self.planet.a, self.a_b, f)
    }

    /// Temperature (K) at colatitude `theta` and planet-frame longitude `phi`.
    pub fn temperature(&self, theta: f64, phi: f64, f: f64) -> f64 {
        self.equilibrium_temperature(f) * (1.0 + h_ml_sum(&self.circulation(), &self.c_ml, theta, phi))
    }

    /// Temperature map on `n_theta × n_phi` points, `phi ∈ [-π, π]`.
    pub fn temperature_map(&self, n_theta: usize, n_phi: usize, f: f64) -> Result<TemperatureMap, AppError> {
        if n_theta < 2 || n_phi < 2 {
            return Err(AppError::input("Temperature map needs at least 2×2 points."));
        }
        let theta = linspace(0.0, PI, n_theta);
        let phi = linspace(-PI, PI, n_phi);
        let mut temperature = Vec::with_capacity(n_theta * n_phi);
        for &p in &phi {
            for &t in &theta {
                temperature.push(self.temperature(t, p, f));
            }
        }
        Ok(TemperatureMap {
            theta,
            phi,
            temperature,
        })
    }

    /// Thermal phase curve (ppm) at phase angles `xi` using the fast kernel.
    pub fn thermal_phase_curve(&self, xi: &[f64], f: f64) -> Result<PhaseCurve, AppError> {
        kernel::fast::thermal_phase_curve(self, xi, f, &WindowGrid::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_planet() -> Planet {
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

    fn toy_filter() -> Filter {
        Filter::new("flat", vec![3.0, 3.5, 4.0], vec![1.0, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn rejects_unphysical_parameters() {
        let c = PowerCoefficients::new(1);
        let bad_alpha = Model::new(0.0, 0.0, 4.5, 0.0, c.clone(), 1, toy_planet(), toy_filter());
        assert!(bad_alpha.is_err());
        let bad_albedo = Model::new(0.0, 0.6, 4.5, 1.0, c.clone(), 1, toy_planet(), toy_filter());
        assert!(bad_albedo.is_err());
        let bad_lmax = Model::new(0.0, 0.6, 4.5, 0.0, c, 2, toy_planet(), toy_filter());
        assert_eq!(bad_lmax.unwrap_err().exit_code(), 2);
    }

    #[test]
    fn uniform_map_sits_at_equilibrium_temperature() {
        let m = Model::new(0.0, 0.6, 4.5, 0.0, PowerCoefficients::new(1), 1, toy_planet(), toy_filter())
            .unwrap();
        let map = m.temperature_map(5, 9, 1.0).unwrap();
        let t_eq = 5000.0 / 5.0_f64.sqrt();
        assert!((map.max() - t_eq).abs() < 1e-9);
        assert!((map.min() - t_eq).abs() < 1e-9);
    }

    #[test]
    fn hotspot_moves_with_offset() {
        let c = PowerCoefficients::single(1, 1, 0.2).unwrap();
        let east = Model::new(0.5, 0.6, 4.5, 0.0, c.clone(), 1, toy_planet(), toy_filter()).unwrap();
        let west = Model::new(-0.5, 0.6, 4.5, 0.0, c, 1, toy_planet(), toy_filter()).unwrap();

        let hottest = |m: &Model| {
            let map = m.temperature_map(3, 721, 1.0).unwrap();
            let mut best = (0usize, f64::NEG_INFINITY);
            for i in 0..map.phi.len() {
                if map.at(i, 1) > best.1 {
                    best = (i, map.at(i, 1));
                }
            }
            map.phi[best.0]
        };
        // The hotspot longitude shifts by the difference in offsets.
        let shift = hottest(&west) - hottest(&east);
        assert!((shift - 1.0).abs() < 0.02, "shift = {shift}");
    }
}
