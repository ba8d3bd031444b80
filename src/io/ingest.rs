//! Observation CSV ingest.
//!
//! Turns a phase-curve CSV into validated [`ObservationPoint`]s.
//!
//! Schema (header names are case-insensitive):
//! - one phase column: `xi` (radians, 0 at secondary eclipse), `phase`
//!   (orbital fraction, 0 at secondary eclipse) or `time` (BJD days,
//!   converted with the planet ephemeris)
//! - `flux` or `flux_ppm` (ppm)
//! - optional `sigma`, `sigma_ppm` or `flux_err` (ppm); a default applies when absent
//!
//! Bad rows are skipped and reported with their line numbers.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{ObservationPoint, Planet};
use crate::error::AppError;
use crate::math::wrap_angle;

/// Which column supplied the phase angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseColumn {
    Xi,
    Phase,
    Time,
}

impl PhaseColumn {
    pub fn label(&self) -> &'static str {
        match self {
            PhaseColumn::Xi => "xi",
            PhaseColumn::Phase => "phase",
            PhaseColumn::Time => "time",
        }
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: points sorted by phase, plus row diagnostics.
#[derive(Debug, Clone)]
pub struct ObservationData {
    pub points: Vec<ObservationPoint>,
    pub phase_column: PhaseColumn,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// True when no uncertainty column was present.
    pub default_sigma_used: bool,
}

/// Load observations from a CSV file.
pub fn load_observations(
    path: &Path,
    planet: &Planet,
    default_sigma_ppm: f64,
) -> Result<ObservationData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_observations(file, planet, default_sigma_ppm)
}

/// Parse observations from any CSV reader.
pub fn read_observations<R: Read>(
    input: R,
    planet: &Planet,
    default_sigma_ppm: f64,
) -> Result<ObservationData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let (phase_column, phase_idx) = resolve_phase_column(&header_map)?;
    let flux_idx = first_column(&header_map, &["flux", "flux_ppm"])
        .ok_or_else(|| AppError::input("Missing required column: `flux` (or `flux_ppm`)."))?;
    let sigma_idx = first_column(&header_map, &["sigma", "sigma_ppm", "flux_err"]);

    let default_sigma_used = sigma_idx.is_none();
    if default_sigma_used && !(default_sigma_ppm.is_finite() && default_sigma_ppm > 0.0) {
        return Err(AppError::input(
            "CSV has no `sigma` column and the default sigma is not > 0.",
        ));
    }

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(idx + 2);
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line() as usize).unwrap_or(idx + 2);

        let parsed = parse_field(&record, phase_idx, phase_column.label()).and_then(|raw| {
            let xi = match phase_column {
                PhaseColumn::Xi => wrap_angle(raw),
                PhaseColumn::Phase => wrap_angle(2.0 * PI * raw),
                PhaseColumn::Time => planet.phase(raw),
            };
            let flux_ppm = parse_field(&record, flux_idx, "flux")?;
            let sigma_ppm = match sigma_idx {
                Some(i) => parse_field(&record, i, "sigma")?,
                None => default_sigma_ppm,
            };
            if sigma_ppm <= 0.0 {
                return Err(format!("sigma must be > 0 (got {sigma_ppm})."));
            }
            Ok(ObservationPoint { xi, flux_ppm, sigma_ppm })
        });

        match parsed {
            Ok(p) => points.push(p),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if points.is_empty() {
        return Err(AppError::input("No valid observation rows in CSV."));
    }
    for e in &row_errors {
        log::warn!("skipping CSV line {}: {}", e.line, e.message);
    }

    points.sort_by(|a, b| a.xi.partial_cmp(&b.xi).unwrap_or(std::cmp::Ordering::Equal));
    let rows_used = points.len();
    Ok(ObservationData {
        points,
        phase_column,
        row_errors,
        rows_read,
        rows_used,
        default_sigma_used,
    })
}

/// Column layout of an observation CSV, read from its header only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSummary {
    pub phase_column: PhaseColumn,
    pub has_sigma: bool,
}

/// Check that a CSV header carries a phase and a flux column.
pub fn inspect_header<R: Read>(input: R) -> Result<HeaderSummary, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?;
    let header_map = build_header_map(headers);

    let (phase_column, _) = resolve_phase_column(&header_map)?;
    if first_column(&header_map, &["flux", "flux_ppm"]).is_none() {
        return Err(AppError::input("Missing required column: `flux` (or `flux_ppm`)."));
    }
    Ok(HeaderSummary {
        phase_column,
        has_sigma: first_column(&header_map, &["sigma", "sigma_ppm", "flux_err"]).is_some(),
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports can prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn first_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

fn resolve_phase_column(header_map: &HashMap<String, usize>) -> Result<(PhaseColumn, usize), AppError> {
    for kind in [PhaseColumn::Xi, PhaseColumn::Phase, PhaseColumn::Time] {
        if let Some(&idx) = header_map.get(kind.label()) {
            return Ok((kind, idx));
        }
    }
    Err(AppError::input(
        "Missing phase column: expected one of `xi`, `phase` or `time`.",
    ))
}

fn parse_field(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing `{name}` value."))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("Invalid `{name}` value '{raw}'."))?;
    if !value.is_finite() {
        return Err(format!("Non-finite `{name}` value."));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planet() -> Planet {
        Planet {
            name: "Test b".to_string(),
            per: 2.0,
            t0: 100.0,
            inc: 90.0,
            rp: 0.1,
            a: 10.0,
            t_secondary: 101.0,
            ecc: 0.0,
            w: 90.0,
            u: [0.0, 0.0],
            t_s: 5000.0,
            rp_a: 0.01,
        }
    }

    #[test]
    fn reads_xi_flux_sigma_case_insensitively() {
        let csv = "XI,Flux,Sigma\n0.5,120.0,4.0\n-0.5,100.0,5.0\n";
        let data = read_observations(csv.as_bytes(), &planet(), 10.0).unwrap();
        assert_eq!(data.phase_column, PhaseColumn::Xi);
        assert_eq!(data.rows_used, 2);
        // Sorted by phase.
        assert!((data.points[0].xi + 0.5).abs() < 1e-12);
        assert_eq!(data.points[1].sigma_ppm, 4.0);
        assert!(!data.default_sigma_used);
    }

    #[test]
    fn converts_times_with_the_ephemeris() {
        let csv = "time,flux\n101.0,500\n101.5,400\n";
        let data = read_observations(csv.as_bytes(), &planet(), 10.0).unwrap();
        assert_eq!(data.phase_column, PhaseColumn::Time);
        assert!(data.points[0].xi.abs() < 1e-12);
        assert!((data.points[1].xi - PI / 2.0).abs() < 1e-12);
        assert!(data.default_sigma_used);
        assert_eq!(data.points[0].sigma_ppm, 10.0);
    }

    #[test]
    fn orbital_fraction_phase_column() {
        let csv = "phase,flux_ppm\n0.25,1\n0.75,2\n";
        let data = read_observations(csv.as_bytes(), &planet(), 1.0).unwrap();
        assert!((data.points[0].xi + PI / 2.0).abs() < 1e-12);
        assert!((data.points[1].xi - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn bad_rows_are_reported_with_line_numbers() {
        let csv = "xi,flux,sigma\n0.1,10,1\noops,10,1\n0.2,,1\n0.3,10,-1\n";
        let data = read_observations(csv.as_bytes(), &planet(), 1.0).unwrap();
        assert_eq!(data.rows_read, 4);
        assert_eq!(data.rows_used, 1);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(data.row_errors[0].message.contains("xi"));
    }

    #[test]
    fn missing_columns_are_input_errors() {
        let err = read_observations("xi,sigma\n0,1\n".as_bytes(), &planet(), 1.0).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let err = read_observations("flux\n1\n".as_bytes(), &planet(), 1.0).unwrap_err();
        assert!(err.message().contains("phase column"));
    }

    #[test]
    fn header_inspection_without_rows() {
        let summary = inspect_header("\u{feff}Time,FLUX_PPM\n".as_bytes()).unwrap();
        assert_eq!(summary.phase_column, PhaseColumn::Time);
        assert!(!summary.has_sigma);
        assert!(inspect_header("xi,flux,flux_err\n".as_bytes()).unwrap().has_sigma);
        assert!(inspect_header("wavelength,transmission\n".as_bytes()).is_err());
    }
}
