use std::f64::consts::PI;

use kelp::domain::{Filter, Planet, PowerCoefficients, SphereGrid, WindowGrid};
use kelp::kernel::{DEFAULT_ATOL_PPM, cross_validate, differentiable, fast};
use kelp::math::linspace;
use kelp::models::Model;

const F: f64 = 0.68;

fn hd189733_irac1() -> Model {
    let planet = Planet::from_name("HD 189733").unwrap();
    let mut filter = Filter::from_name("IRAC 1").unwrap();
    filter.bin_down(5).unwrap();

    let c_ml = PowerCoefficients::from_rows(vec![vec![0.0], vec![0.0, 0.18, 0.0]]).unwrap();
    Model::new(-0.8, 0.575, 4.5, 0.0, c_ml, 1, planet, filter).unwrap()
}

#[test]
fn kernels_agree_within_tolerance() {
    let model = hd189733_irac1();
    let xi = linspace(-PI, PI, 100);

    let cmp = cross_validate(&model, &xi, F, &WindowGrid::default(), &SphereGrid::default()).unwrap();

    assert_eq!(cmp.fast.len(), 100);
    assert_eq!(cmp.differentiable.len(), 100);
    for (i, (a, b)) in cmp.fast.iter().zip(cmp.differentiable.iter()).enumerate() {
        assert!(
            (a - b).abs() <= DEFAULT_ATOL_PPM,
            "xi={:.4}: fast={a:.4} differentiable={b:.4}",
            xi[i]
        );
    }
    assert!(cmp.within(DEFAULT_ATOL_PPM));
}

#[test]
fn curve_is_physical() {
    let model = hd189733_irac1();
    let xi = linspace(-PI, PI, 100);
    let curve = fast::thermal_phase_curve(&model, &xi, F, &WindowGrid::default()).unwrap();

    assert!(curve.flux.iter().all(|&v| v.is_finite() && v > 0.0));
    assert!(curve.amplitude() > 500.0);
    assert!(curve.peak_offset().unwrap() < 0.0);
}

#[test]
fn model_default_path_is_the_fast_kernel() {
    let model = hd189733_irac1();
    let xi = linspace(-PI, PI, 25);
    let via_model = model.thermal_phase_curve(&xi, F).unwrap();
    let direct = fast::thermal_phase_curve(&model, &xi, F, &WindowGrid::default()).unwrap();
    assert_eq!(via_model, direct);
}

#[test]
fn differentiable_kernel_rejects_higher_order_maps() {
    let mut model = hd189733_irac1();
    model.c_ml = PowerCoefficients::single(2, 1, 0.05).unwrap();
    model.lmax = 2;
    let xi = linspace(-PI, PI, 10);

    let err = cross_validate(&model, &xi, F, &WindowGrid::default(), &SphereGrid::default()).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    let err = differentiable::phase_curve(&model, &xi, F, &SphereGrid::default()).unwrap_err();
    assert_eq!(err.exit_code(), 2);

    // The fast kernel still handles the general expansion.
    assert!(fast::thermal_phase_curve(&model, &xi, F, &WindowGrid::default()).is_ok());
}
