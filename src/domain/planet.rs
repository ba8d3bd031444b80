//! Planet/star system parameters.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::wrap_angle;

/// Orbital and physical parameters of a transiting planet and its host star.
///
/// Lengths are dimensionless: `rp` is `R_p/R_s`, `a` is `a/R_s` and `rp_a` is `R_p/a`.
/// Times are BJD days, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub name: String,
    /// Orbital period (days).
    pub per: f64,
    /// Mid-transit time.
    pub t0: f64,
    /// Inclination (degrees).
    pub inc: f64,
    pub rp: f64,
    pub a: f64,
    /// Mid-eclipse time.
    pub t_secondary: f64,
    pub ecc: f64,
    /// Argument of periastron (degrees).
    pub w: f64,
    /// Quadratic limb-darkening coefficients.
    pub u: [f64; 2],
    /// Stellar effective temperature (K).
    #[serde(rename = "T_s")]
    pub t_s: f64,
    pub rp_a: f64,
}

impl Planet {
    /// `R_p/R_s`, recomputed from `rp_a` and `a`.
    pub fn rp_rs(&self) -> f64 {
        self.rp_a * self.a
    }

    /// Orbital phase angle `ξ ∈ [-π, π)` at time `t`, with `ξ = 0` at secondary eclipse.
    pub fn phase(&self, t: f64) -> f64 {
        let frac = ((t - self.t_secondary) / self.per).rem_euclid(1.0);
        wrap_angle(2.0 * PI * frac)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let positive = [
            ("per", self.per),
            ("a", self.a),
            ("rp_a", self.rp_a),
            ("T_s", self.t_s),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AppError::input(format!(
                    "Planet '{}': {field} must be finite and > 0 (got {value}).",
                    self.name
                )));
            }
        }
        Ok(())
    }
}
