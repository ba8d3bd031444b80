//! Hermite-Gaussian temperature maps.
//!
//! The dayside-to-nightside circulation is expanded in the basis
//!
//! ```text
//! h_ml(θ, φ) = C / (ω² α⁴ + m²) · exp(-(α μ)²/2)
//!              · [ μ m H_l(α μ) cos(m φ + Δφ)
//!                + α ω (α μ H_l(α μ) - H_{l+1}(α μ)) sin(m φ + Δφ) ]
//! ```
//!
//! with `μ = cos θ`, `ω` the drag frequency, `α` the fluid number and `Δφ` the
//! hotspot offset. `m = 0` modes carry no longitudinal structure and vanish.
//!
//! The map is `T(θ, φ) = f T_s sqrt(1/a) (1 - A_B)^{1/4} (1 + Σ h_ml)`.

use crate::domain::PowerCoefficients;
use crate::math::hermite;

/// Circulation parameters shared by every `h_ml` term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circulation {
    pub omega_drag: f64,
    pub alpha: f64,
    pub hotspot_offset: f64,
}

/// A single `h_ml` basis term with coefficient `c`.
pub fn h_ml(circ: &Circulation, m: i32, l: usize, theta: f64, phi: f64, c: f64) -> f64 {
    if m == 0 || c == 0.0 {
        return 0.0;
    }
    let Circulation {
        omega_drag,
        alpha,
        hotspot_offset,
    } = *circ;

    let mu = theta.cos();
    let tmu = alpha * mu;
    let m_f = m as f64;
    let prefactor =
        c / (omega_drag.powi(2) * alpha.powi(4) + m_f * m_f) * (-0.5 * tmu * tmu).exp();
    let angle = m_f * phi + hotspot_offset;
    let h_l = hermite(l, tmu);

    prefactor
        * (mu * m_f * h_l * angle.cos()
            + alpha * omega_drag * (tmu * h_l - hermite(l + 1, tmu)) * angle.sin())
}

/// `Σ_{l >= 1, -l <= m <= l} h_ml(θ, φ)` over the non-zero coefficients.
pub fn h_ml_sum(circ: &Circulation, c_ml: &PowerCoefficients, theta: f64, phi: f64) -> f64 {
    c_ml.nonzero_terms()
        .into_iter()
        .map(|(l, m, c)| h_ml(circ, m, l, theta, phi, c))
        .sum()
}

/// Irradiation temperature `f T_s sqrt(1/a) (1 - A_B)^{1/4}`.
pub fn equilibrium_temperature(t_s: f64, a_rs: f64, a_b: f64, f: f64) -> f64 {
    f * t_s * (1.0 / a_rs).sqrt() * (1.0 - a_b).powf(0.25)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn circ() -> Circulation {
        Circulation {
            omega_drag: 4.5,
            alpha: 0.575,
            hotspot_offset: -0.8,
        }
    }

    #[test]
    fn m_zero_terms_vanish() {
        assert_eq!(h_ml(&circ(), 0, 1, 1.0, 0.3, 0.5), 0.0);
    }

    #[test]
    fn h_11_on_equator_matches_closed_form() {
        // At θ = π/2: μ = 0, H_1(0) = 0, H_2(0) = -2.
        // h_11 = C / (ω²α⁴ + 1) · α ω · 2 · sin(φ + Δφ)
        let c = circ();
        let phi = 0.4;
        let expected = 0.18 / (4.5_f64.powi(2) * 0.575_f64.powi(4) + 1.0)
            * 0.575
            * 4.5
            * 2.0
            * (phi - 0.8_f64).sin();
        let got = h_ml(&c, 1, 1, PI / 2.0, phi, 0.18);
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn sum_uses_only_stored_coefficients() {
        let coeffs = PowerCoefficients::from_rows(vec![vec![1.0], vec![0.0, 0.18, 0.0]]).unwrap();
        let direct = h_ml(&circ(), 1, 1, 1.1, -0.2, 0.18);
        assert!((h_ml_sum(&circ(), &coeffs, 1.1, -0.2) - direct).abs() < 1e-15);
    }

    #[test]
    fn equilibrium_temperature_scaling() {
        let t = equilibrium_temperature(5050.0, 8.84, 0.0, 1.0);
        assert!((t - 5050.0 / 8.84_f64.sqrt()).abs() < 1e-9);
        let dimmed = equilibrium_temperature(5050.0, 8.84, 0.5, 1.0);
        assert!((dimmed / t - 0.5_f64.powf(0.25)).abs() < 1e-12);
    }
}
