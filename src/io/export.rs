//! CSV exports: model phase curves, observations and fit residuals.
//!
//! Exports are meant to be easy to consume in spreadsheets or downstream
//! scripts. Observation exports use the same schema `kelp fit` reads.

use std::f64::consts::PI;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{ObservationPoint, ObservationResidual, PhaseCurve};
use crate::error::AppError;

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_err(e: std::io::Error) -> AppError {
    AppError::input(format!("Failed to write export CSV: {e}"))
}

/// Write a phase curve as `xi,phase,flux_ppm` (`phase` is the orbital fraction from eclipse).
pub fn write_curve_csv(path: &Path, curve: &PhaseCurve) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_curve(&mut file, curve)
}

pub fn write_curve<W: Write>(out: &mut W, curve: &PhaseCurve) -> Result<(), AppError> {
    writeln!(out, "xi,phase,flux_ppm").map_err(write_err)?;
    for (&xi, &flux) in curve.xi.iter().zip(curve.flux.iter()) {
        writeln!(out, "{:.10},{:.10},{:.6}", xi, xi / (2.0 * PI), flux).map_err(write_err)?;
    }
    Ok(())
}

/// Write observations as `xi,flux,sigma`.
pub fn write_observations_csv(path: &Path, points: &[ObservationPoint]) -> Result<(), AppError> {
    let mut file = create(path)?;
    write_observations(&mut file, points)
}

pub fn write_observations<W: Write>(out: &mut W, points: &[ObservationPoint]) -> Result<(), AppError> {
    writeln!(out, "xi,flux,sigma").map_err(write_err)?;
    for p in points {
        writeln!(out, "{:.10},{:.6},{:.6}", p.xi, p.flux_ppm, p.sigma_ppm).map_err(write_err)?;
    }
    Ok(())
}

/// Write per-observation fit residuals.
pub fn write_residuals_csv(path: &Path, residuals: &[ObservationResidual]) -> Result<(), AppError> {
    let mut file = create(path)?;
    writeln!(file, "xi,flux,sigma,model_ppm,residual_ppm").map_err(write_err)?;
    for r in residuals {
        writeln!(
            file,
            "{:.10},{:.6},{:.6},{:.6},{:.6}",
            r.point.xi, r.point.flux_ppm, r.point.sigma_ppm, r.model_ppm, r.residual_ppm
        )
        .map_err(write_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Planet;
    use crate::io::ingest::read_observations;

    #[test]
    fn curve_csv_has_phase_fraction() {
        let curve = PhaseCurve::new(vec![-PI, 0.0], vec![100.0, 1500.5]).unwrap();
        let mut buf = Vec::new();
        write_curve(&mut buf, &curve).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "xi,phase,flux_ppm");
        assert_eq!(lines[1], "-3.1415926536,-0.5000000000,100.000000");
        assert_eq!(lines[2], "0.0000000000,0.0000000000,1500.500000");
    }

    #[test]
    fn observations_round_trip_through_ingest() {
        let points = vec![
            ObservationPoint { xi: -1.25, flux_ppm: 800.0, sigma_ppm: 20.0 },
            ObservationPoint { xi: 0.5, flux_ppm: 1200.0, sigma_ppm: 25.0 },
        ];
        let mut buf = Vec::new();
        write_observations(&mut buf, &points).unwrap();

        let planet = Planet {
            name: "Test b".to_string(),
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
        let data = read_observations(buf.as_slice(), &planet, 1.0).unwrap();
        assert_eq!(data.rows_used, 2);
        assert!((data.points[0].xi + 1.25).abs() < 1e-9);
        assert_eq!(data.points[1].sigma_ppm, 25.0);
    }
}
