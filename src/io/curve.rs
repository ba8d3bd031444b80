//! Read/write model JSON files.
//!
//! Model JSON is the portable representation of a phase-curve model:
//! - planet record and filter source (catalog name or SVO ID, plus binning)
//! - model parameters (`hotspot_offset`, `alpha`, `omega_drag`, `A_B`, `C_ml`, `f`)
//! - a precomputed phase-curve grid for quick plotting
//!
//! The schema is defined by `domain::ModelFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CurveGrid, FilterSource, ModelFile, PhaseCurve};
use crate::error::AppError;
use crate::models::Model;

/// Assemble the file contents for `model` and its evaluated `curve`.
pub fn model_file(
    model: &Model,
    f: f64,
    filter: &FilterSource,
    filter_bins: Option<usize>,
    curve: &PhaseCurve,
) -> ModelFile {
    ModelFile {
        tool: "kelp".to_string(),
        created: Utc::now(),
        planet: model.planet.clone(),
        filter: filter.clone(),
        filter_bins,
        params: model.params(f),
        grid: CurveGrid {
            xi: curve.xi.clone(),
            flux_ppm: curve.flux.clone(),
        },
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, file: &ModelFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::input(format!("Failed to write model JSON: {e}")))?;
    log::info!("wrote model JSON to {}", path.display());
    Ok(())
}

/// Read a model JSON file, checking the curve grid is consistent.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let input = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let file: ModelFile =
        serde_json::from_reader(input).map_err(|e| AppError::input(format!("Invalid model JSON: {e}")))?;
    if file.grid.xi.len() != file.grid.flux_ppm.len() {
        return Err(AppError::input(format!(
            "Model JSON grid has {} phases but {} flux values.",
            file.grid.xi.len(),
            file.grid.flux_ppm.len()
        )));
    }
    Ok(file)
}

impl ModelFile {
    pub fn curve(&self) -> Result<PhaseCurve, AppError> {
        PhaseCurve::new(self.grid.xi.clone(), self.grid.flux_ppm.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Filter, Planet, PowerCoefficients};

    #[test]
    fn model_json_round_trip() {
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
            u: [0.1, 0.2],
            t_s: 5000.0,
            rp_a: 0.02,
        };
        let filter = Filter::new("flat", vec![3.0, 4.0], vec![1.0, 1.0]).unwrap();
        let c = PowerCoefficients::single(1, 1, 0.18).unwrap();
        let model = Model::new(-0.8, 0.575, 4.5, 0.0, c, 1, planet, filter).unwrap();
        let curve = PhaseCurve::new(vec![-1.0, 0.0, 1.0], vec![10.0, 20.0, 15.0]).unwrap();
        let source = FilterSource::Svo("Spitzer/IRAC.I1".to_string());
        let file = model_file(&model, 0.68, &source, Some(5), &curve);

        let path = std::env::temp_dir().join(format!("kelp-model-{}.json", std::process::id()));
        write_model_json(&path, &file).unwrap();
        let back = read_model_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back.tool, "kelp");
        assert_eq!(back.planet, model.planet);
        assert_eq!(back.filter, source);
        assert_eq!(back.filter_bins, Some(5));
        assert_eq!(back.params, model.params(0.68));
        assert_eq!(back.curve().unwrap(), curve);
    }
}
