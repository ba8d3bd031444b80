//! Differentiable phase-curve kernel.
//!
//! Written once against [`Real`], so the same code evaluates plain `f64`
//! fluxes and, with [`Dual<N>`], their partial derivatives with respect to
//! any seeded parameter.
//!
//! Unlike the fast kernel this one works on a fixed planet-frame mesh
//! (`θ ∈ [0, π]`, `φ ∈ [-2π, 2π]`): cell intensities are computed once and
//! each phase masks the mesh down to its visible window
//! `-ξ - π/2 < φ < -ξ + π/2`. The temperature expansion is restricted to the
//! `C_11` term.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::domain::{PhaseCurve, SphereGrid};
use crate::error::AppError;
use crate::math::{Dual, Real, hermite, trapz_2d};
use crate::models::{Model, band_intensity};

/// Inputs to [`thermal_phase_curve`].
///
/// Parameters that can carry derivatives are generic; the stellar and
/// orbital geometry is fixed.
#[derive(Debug, Clone, Copy)]
pub struct PhaseCurveParams<R> {
    pub hotspot_offset: R,
    pub omega_drag: R,
    pub alpha: R,
    pub c_11: R,
    /// Stellar effective temperature (K).
    pub t_s: f64,
    /// Semi-major axis in stellar radii.
    pub a_rs: f64,
    /// `R_p / a`.
    pub rp_a: f64,
    pub a_b: R,
    pub f: R,
}

impl<R: Real> PhaseCurveParams<R> {
    /// Lift a model's values as constants (no derivatives).
    pub fn from_model(model: &Model, f: f64) -> Self {
        Self {
            hotspot_offset: R::constant(model.hotspot_offset),
            omega_drag: R::constant(model.omega_drag),
            alpha: R::constant(model.alpha),
            c_11: R::constant(model.c_11()),
            t_s: model.planet.t_s,
            a_rs: model.planet.a,
            rp_a: model.planet.rp_a,
            a_b: R::constant(model.a_b),
            f: R::constant(f),
        }
    }
}

/// A parameter the kernel can differentiate with respect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    HotspotOffset,
    OmegaDrag,
    Alpha,
    C11,
    BondAlbedo,
    F,
}

impl Parameter {
    pub const ALL: [Parameter; 6] = [
        Parameter::HotspotOffset,
        Parameter::OmegaDrag,
        Parameter::Alpha,
        Parameter::C11,
        Parameter::BondAlbedo,
        Parameter::F,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::HotspotOffset => "hotspot_offset",
            Parameter::OmegaDrag => "omega_drag",
            Parameter::Alpha => "alpha",
            Parameter::C11 => "C_11",
            Parameter::BondAlbedo => "A_B",
            Parameter::F => "f",
        }
    }

    /// Current value of this parameter in `model` (with redistribution factor `f`).
    pub fn value(&self, model: &Model, f: f64) -> f64 {
        match self {
            Parameter::HotspotOffset => model.hotspot_offset,
            Parameter::OmegaDrag => model.omega_drag,
            Parameter::Alpha => model.alpha,
            Parameter::C11 => model.c_11(),
            Parameter::BondAlbedo => model.a_b,
            Parameter::F => f,
        }
    }
}

impl<const N: usize> PhaseCurveParams<Dual<N>> {
    /// Seed `free[k]` as the `k`-th tangent direction; everything else is constant.
    pub fn seeded(model: &Model, f: f64, free: [Parameter; N]) -> Self {
        let mut params = Self::from_model(model, f);
        for (k, p) in free.iter().enumerate() {
            let var = Dual::variable(p.value(model, f), k);
            match p {
                Parameter::HotspotOffset => params.hotspot_offset = var,
                Parameter::OmegaDrag => params.omega_drag = var,
                Parameter::Alpha => params.alpha = var,
                Parameter::C11 => params.c_11 = var,
                Parameter::BondAlbedo => params.a_b = var,
                Parameter::F => params.f = var,
            }
        }
        params
    }
}

/// Kernel output: flux (ppm) per phase and the mesh temperatures.
///
/// `temperature` is row-major by longitude: `i_phi * theta.len() + i_theta`.
#[derive(Debug, Clone)]
pub struct KernelOutput<R> {
    pub flux: Vec<R>,
    pub temperature: Vec<R>,
}

/// `h_11(θ, φ)` with generic parameters.
fn h_11<R: Real>(params: &PhaseCurveParams<R>, theta: f64, phi: f64) -> R {
    let PhaseCurveParams {
        hotspot_offset,
        omega_drag,
        alpha,
        c_11,
        ..
    } = *params;
    let one = R::constant(1.0);
    let mu = R::constant(theta.cos());
    let tmu = alpha * mu;
    let alpha2 = alpha * alpha;
    let prefactor = c_11 / (omega_drag * omega_drag * alpha2 * alpha2 + one)
        * (R::constant(-0.5) * tmu * tmu).exp();
    let angle = R::constant(phi) + hotspot_offset;
    let h_1 = hermite(1, tmu);
    let h_2 = hermite(2, tmu);
    prefactor * (mu * h_1 * angle.cos() + alpha * omega_drag * (tmu * h_1 - h_2) * angle.sin())
}

/// Thermal phase curve on a fixed `(phi, theta)` mesh.
///
/// `theta` and `phi` are the mesh axes; wavelengths are in metres.
pub fn thermal_phase_curve<R: Real>(
    xi: &[f64],
    params: &PhaseCurveParams<R>,
    theta: &[f64],
    phi: &[f64],
    wavelength_m: &[f64],
    transmittance: &[f64],
) -> Result<KernelOutput<R>, AppError> {
    if theta.len() < 2 || phi.len() < 2 {
        return Err(AppError::input("Differentiable kernel needs at least a 2x2 mesh."));
    }
    if wavelength_m.len() != transmittance.len() || wavelength_m.len() < 2 {
        return Err(AppError::input(
            "Bandpass needs matching wavelength/transmittance arrays with >= 2 samples.",
        ));
    }

    let stellar: f64 = band_intensity(wavelength_m, transmittance, params.t_s);
    if !(stellar.is_finite() && stellar > 0.0) {
        return Err(AppError::runtime(format!(
            "Stellar band intensity is not positive for T_s = {} K.",
            params.t_s
        )));
    }

    let t_eq = params.f
        * R::constant(params.t_s * (1.0 / params.a_rs).sqrt())
        * (R::constant(1.0) - params.a_b).powf(0.25);

    let n_theta = theta.len();
    let mut temperature = Vec::with_capacity(n_theta * phi.len());
    let mut ratio = Vec::with_capacity(n_theta * phi.len());
    for &p in phi {
        for &t in theta {
            let temp = t_eq * (R::constant(1.0) + h_11(params, t, p));
            if !(temp.value().is_finite() && temp.value() > 0.0) {
                return Err(AppError::runtime(format!(
                    "Non-physical temperature {} K at theta={t:.3}, phi={p:.3}.",
                    temp.value()
                )));
            }
            ratio.push(band_intensity(wavelength_m, transmittance, temp) / R::constant(stellar));
            temperature.push(temp);
        }
    }

    let rp_rs = params.rp_a * params.a_rs;
    let scale = R::constant(1e6 * rp_rs * rp_rs / PI);
    let sin2: Vec<f64> = theta.iter().map(|t| t.sin().powi(2)).collect();
    let zero = R::constant(0.0);

    let mut flux = Vec::with_capacity(xi.len());
    let mut integrand = vec![zero; ratio.len()];
    for &x in xi {
        let lo = -x - FRAC_PI_2;
        let hi = -x + FRAC_PI_2;
        for (i_phi, &p) in phi.iter().enumerate() {
            let row = i_phi * n_theta;
            if p > lo && p < hi {
                let weight = (p + x).cos();
                for i_theta in 0..n_theta {
                    integrand[row + i_theta] = ratio[row + i_theta] * R::constant(sin2[i_theta] * weight);
                }
            } else {
                integrand[row..row + n_theta].fill(zero);
            }
        }
        flux.push(scale * trapz_2d(&integrand, theta, phi));
    }

    log::debug!(
        "differentiable kernel: {} phases on a {}x{} mesh",
        xi.len(),
        n_theta,
        phi.len()
    );

    Ok(KernelOutput { flux, temperature })
}

fn check_inputs(model: &Model, mesh: &SphereGrid) -> Result<(), AppError> {
    mesh.validate()?;
    if !model.c_ml.is_c11_only() {
        return Err(AppError::input(
            "The differentiable kernel carries C_11 only; other C_ml must be zero.",
        ));
    }
    Ok(())
}

/// Evaluate `model` on `mesh` as plain `f64`.
pub fn phase_curve(model: &Model, xi: &[f64], f: f64, mesh: &SphereGrid) -> Result<PhaseCurve, AppError> {
    check_inputs(model, mesh)?;
    let params = PhaseCurveParams::<f64>::from_model(model, f);
    let out = thermal_phase_curve(
        xi,
        &params,
        &mesh.theta(),
        &mesh.phi(),
        &model.filter.wavelength_m(),
        &model.filter.transmittance,
    )?;
    PhaseCurve::new(xi.to_vec(), out.flux)
}

/// Flux and its Jacobian with respect to `free`, one row per phase.
pub fn jacobian<const N: usize>(
    model: &Model,
    xi: &[f64],
    f: f64,
    mesh: &SphereGrid,
    free: [Parameter; N],
) -> Result<(Vec<f64>, Vec<[f64; N]>), AppError> {
    check_inputs(model, mesh)?;
    let params = PhaseCurveParams::<Dual<N>>::seeded(model, f, free);
    let out = thermal_phase_curve(
        xi,
        &params,
        &mesh.theta(),
        &mesh.phi(),
        &model.filter.wavelength_m(),
        &model.filter.transmittance,
    )?;
    Ok(out.flux.iter().map(|d| (d.re, d.eps)).unzip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Filter, Planet, PowerCoefficients};
    use crate::math::linspace;

    fn model(offset: f64, c11: f64) -> Model {
        let planet = Planet {
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
        };
        let filter = Filter::new("flat", vec![3.0, 3.5, 4.0], vec![1.0, 1.0, 1.0]).unwrap();
        let c = PowerCoefficients::single(1, 1, c11).unwrap();
        Model::new(offset, 0.6, 4.5, 0.0, c, 1, planet, filter).unwrap()
    }

    #[test]
    fn h_11_matches_general_basis() {
        let m = model(-0.7, 0.18);
        let params = PhaseCurveParams::<f64>::from_model(&m, 1.0);
        for &(t, p) in &[(0.3, -1.0), (1.2, 0.4), (2.9, 5.5)] {
            let general = crate::models::h_ml(&m.circulation(), 1, 1, t, p, 0.18);
            assert!((h_11(&params, t, p) - general).abs() < 1e-14);
        }
    }

    #[test]
    fn mesh_temperatures_match_model() {
        let m = model(-0.7, 0.18);
        let mesh = SphereGrid::default();
        let params = PhaseCurveParams::<f64>::from_model(&m, 0.9);
        let (theta, phi) = (mesh.theta(), mesh.phi());
        let out = thermal_phase_curve(
            &[0.0],
            &params,
            &theta,
            &phi,
            &m.filter.wavelength_m(),
            &m.filter.transmittance,
        )
        .unwrap();
        let (i_phi, i_theta) = (37, 4);
        let expected = m.temperature(theta[i_theta], phi[i_phi], 0.9);
        assert!((out.temperature[i_phi * theta.len() + i_theta] - expected).abs() < 1e-9);
    }

    #[test]
    fn dual_gradient_matches_finite_difference() {
        let m = model(-0.7, 0.18);
        let mesh = SphereGrid::default();
        let xi = [-1.0, 0.5];
        let free = [Parameter::HotspotOffset, Parameter::C11, Parameter::F];
        let (flux, jac) = jacobian(&m, &xi, 0.8, &mesh, free).unwrap();

        let plain = phase_curve(&m, &xi, 0.8, &mesh).unwrap();
        assert!((flux[0] - plain.flux[0]).abs() < 1e-9);

        let h = 1e-6;
        let bumped = |offset: f64, c11: f64, f: f64| {
            phase_curve(&model(offset, c11), &xi, f, &mesh).unwrap().flux
        };
        let fd_offset: Vec<f64> = bumped(-0.7 + h, 0.18, 0.8)
            .iter()
            .zip(bumped(-0.7 - h, 0.18, 0.8))
            .map(|(a, b)| (a - b) / (2.0 * h))
            .collect();
        let fd_c11: Vec<f64> = bumped(-0.7, 0.18 + h, 0.8)
            .iter()
            .zip(bumped(-0.7, 0.18 - h, 0.8))
            .map(|(a, b)| (a - b) / (2.0 * h))
            .collect();
        let fd_f: Vec<f64> = bumped(-0.7, 0.18, 0.8 + h)
            .iter()
            .zip(bumped(-0.7, 0.18, 0.8 - h))
            .map(|(a, b)| (a - b) / (2.0 * h))
            .collect();
        for i in 0..xi.len() {
            let tol = |fd: f64| 1e-4 * fd.abs().max(1.0);
            assert!((jac[i][0] - fd_offset[i]).abs() < tol(fd_offset[i]), "{:?} {fd_offset:?}", jac);
            assert!((jac[i][1] - fd_c11[i]).abs() < tol(fd_c11[i]));
            assert!((jac[i][2] - fd_f[i]).abs() < tol(fd_f[i]));
        }
    }

    #[test]
    fn phases_outside_the_mesh_see_nothing() {
        // With φ ∈ [-π/2, π/2] only, ξ = π looks at the far side of the mesh.
        let m = model(0.0, 0.0);
        let params = PhaseCurveParams::<f64>::from_model(&m, 1.0);
        let theta = linspace(0.0, PI, 10);
        let phi = linspace(-FRAC_PI_2, FRAC_PI_2, 50);
        let out = thermal_phase_curve(
            &[0.0, PI],
            &params,
            &theta,
            &phi,
            &m.filter.wavelength_m(),
            &m.filter.transmittance,
        )
        .unwrap();
        assert!(out.flux[0] > 0.0);
        assert_eq!(out.flux[1], 0.0);
    }

    #[test]
    fn parameter_names_are_unique() {
        let mut names: Vec<&str> = Parameter::ALL.iter().map(|p| p.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Parameter::ALL.len());
    }
}
