//! Blackbody emission weighted by a bandpass.
//!
//! All quantities are SI: wavelengths in metres, radiance in W m⁻³ sr⁻¹.
//! Only ratios of band-integrated radiances enter the phase curve, so the
//! absolute units cancel.

use crate::math::{Real, trapz, trapz_weights};

/// Planck constant (J s).
pub const PLANCK: f64 = 6.626_070_15e-34;
/// Speed of light (m/s).
pub const SPEED_OF_LIGHT: f64 = 2.997_924_58e8;
/// Boltzmann constant (J/K).
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Spectral radiance `B_λ(T) = 2hc²/λ⁵ / (exp(hc/λkT) - 1)`.
pub fn planck_lambda<R: Real>(wavelength_m: f64, temperature: R) -> R {
    let prefactor = 2.0 * PLANCK * SPEED_OF_LIGHT * SPEED_OF_LIGHT / wavelength_m.powi(5);
    let x = R::constant(PLANCK * SPEED_OF_LIGHT / (wavelength_m * BOLTZMANN)) / temperature;
    R::constant(prefactor) / x.exp_m1()
}

/// `∫ B_λ(T) S(λ) dλ` by the trapezoid rule on the filter's own grid.
pub fn band_intensity<R: Real>(wavelength_m: &[f64], transmittance: &[f64], temperature: R) -> R {
    let weighted: Vec<R> = wavelength_m
        .iter()
        .zip(transmittance.iter())
        .map(|(&lambda, &s)| planck_lambda(lambda, temperature) * R::constant(s))
        .collect();
    trapz(&weighted, wavelength_m)
}

/// Precomputed quadrature for repeated `f64` band integrals.
///
/// Folds the trapezoid weights, transmittance and Planck prefactor into one
/// coefficient per wavelength so [`Bandpass::intensity`] allocates nothing.
#[derive(Debug, Clone)]
pub struct Bandpass {
    coefficients: Vec<f64>,
    exponents: Vec<f64>,
}

impl Bandpass {
    pub fn new(wavelength_m: &[f64], transmittance: &[f64]) -> Self {
        let weights = trapz_weights(wavelength_m);
        let coefficients = wavelength_m
            .iter()
            .zip(transmittance.iter())
            .zip(weights.iter())
            .map(|((&lambda, &s), &w)| {
                w * s * 2.0 * PLANCK * SPEED_OF_LIGHT * SPEED_OF_LIGHT / lambda.powi(5)
            })
            .collect();
        let exponents = wavelength_m
            .iter()
            .map(|&lambda| PLANCK * SPEED_OF_LIGHT / (lambda * BOLTZMANN))
            .collect();
        Self {
            coefficients,
            exponents,
        }
    }

    /// Band-integrated radiance at `temperature` (K).
    pub fn intensity(&self, temperature: f64) -> f64 {
        self.coefficients
            .iter()
            .zip(self.exponents.iter())
            .map(|(&c, &x)| c / (x / temperature).exp_m1())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Dual, linspace};

    #[test]
    fn wien_peak_near_displacement_law() {
        // λ_max T ≈ 2.898e-3 m K
        let t = 5000.0;
        let grid = linspace(300e-9, 1500e-9, 2401);
        let (mut best, mut best_val) = (0.0, 0.0);
        for &l in &grid {
            let v = planck_lambda(l, t);
            if v > best_val {
                best_val = v;
                best = l;
            }
        }
        assert!((best * t - 2.898e-3).abs() < 2e-6, "peak at {best}");
    }

    #[test]
    fn bandpass_matches_generic_trapezoid() {
        let wl: Vec<f64> = [3.17, 3.36, 3.55, 3.73, 3.92].iter().map(|w| w * 1e-6).collect();
        let tr = [0.215, 0.435, 0.455, 0.475, 0.268];
        let bp = Bandpass::new(&wl, &tr);
        for &t in &[800.0, 1500.0, 5050.0] {
            let generic: f64 = band_intensity(&wl, &tr, t);
            let fast = bp.intensity(t);
            assert!(((generic - fast) / generic).abs() < 1e-12);
        }
    }

    #[test]
    fn temperature_derivative_is_positive_and_consistent() {
        let wl = [3.5e-6, 3.7e-6];
        let tr = [1.0, 1.0];
        let t0 = 1200.0;
        let d = band_intensity(&wl, &tr, Dual::<1>::variable(t0, 0));
        let h = 1e-3;
        let fd = (band_intensity(&wl, &tr, t0 + h) - band_intensity(&wl, &tr, t0 - h)) / (2.0 * h);
        assert!(d.eps[0] > 0.0);
        assert!(((d.eps[0] - fd) / fd).abs() < 1e-6);
    }
}
