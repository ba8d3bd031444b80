//! Synthetic phase-curve observations.

use std::f64::consts::PI;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ObservationPoint, SimulationSettings};
use crate::error::AppError;
use crate::models::Model;

/// Draw `settings.n_points` noisy samples of `model`'s phase curve.
///
/// Phases are uniform on `[-π, π)` and returned in ascending order; noise is
/// Gaussian with standard deviation `settings.sigma_ppm`. The same seed always
/// yields the same observations.
pub fn generate_observations(
    model: &Model,
    f: f64,
    settings: &SimulationSettings,
) -> Result<Vec<ObservationPoint>, AppError> {
    if settings.n_points == 0 {
        return Err(AppError::input("Observation count must be > 0."));
    }
    if !(settings.sigma_ppm.is_finite() && settings.sigma_ppm > 0.0) {
        return Err(AppError::input(format!(
            "Noise sigma must be finite and > 0 (got {}).",
            settings.sigma_ppm
        )));
    }

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let noise = Normal::new(0.0, settings.sigma_ppm)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    let mut xi: Vec<f64> = (0..settings.n_points).map(|_| rng.gen_range(-PI..PI)).collect();
    xi.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let curve = model.thermal_phase_curve(&xi, f)?;
    let points = curve
        .xi
        .iter()
        .zip(curve.flux.iter())
        .map(|(&x, &flux)| ObservationPoint {
            xi: x,
            flux_ppm: flux + rng.sample(noise),
            sigma_ppm: settings.sigma_ppm,
        })
        .collect();

    log::info!(
        "generated {} synthetic observations (sigma = {} ppm, seed = {})",
        settings.n_points,
        settings.sigma_ppm,
        settings.seed
    );
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Filter, Planet, PowerCoefficients};
    use std::path::PathBuf;

    fn model() -> Model {
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
        let filter = Filter::new("flat", vec![3.0, 4.0], vec![1.0, 1.0]).unwrap();
        let c = PowerCoefficients::single(1, 1, 0.15).unwrap();
        Model::new(-0.6, 0.6, 4.5, 0.0, c, 1, planet, filter).unwrap()
    }

    fn settings(seed: u64) -> SimulationSettings {
        SimulationSettings {
            n_points: 40,
            sigma_ppm: 25.0,
            seed,
            output: PathBuf::from("unused.csv"),
        }
    }

    #[test]
    fn same_seed_same_observations() {
        let a = generate_observations(&model(), 0.7, &settings(7)).unwrap();
        let b = generate_observations(&model(), 0.7, &settings(7)).unwrap();
        let c = generate_observations(&model(), 0.7, &settings(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn phases_are_sorted_and_in_range() {
        let obs = generate_observations(&model(), 0.7, &settings(1)).unwrap();
        assert_eq!(obs.len(), 40);
        assert!(obs.windows(2).all(|w| w[0].xi <= w[1].xi));
        assert!(obs.iter().all(|p| (-PI..PI).contains(&p.xi) && p.sigma_ppm == 25.0));
    }

    #[test]
    fn rejects_zero_sigma() {
        let mut s = settings(1);
        s.sigma_ppm = 0.0;
        assert_eq!(generate_observations(&model(), 0.7, &s).unwrap_err().exit_code(), 2);
    }
}
