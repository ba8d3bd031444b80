//! Markdown validation report for inspecting kernel agreement.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{SphereGrid, WindowGrid};
use crate::error::AppError;
use crate::kernel::KernelComparison;
use crate::models::Model;

/// Grids and tolerance a comparison was run with.
#[derive(Debug, Clone, Copy)]
pub struct ValidationSetup {
    pub f: f64,
    pub window_grid: WindowGrid,
    pub mesh: SphereGrid,
    pub atol_ppm: f64,
}

/// Write `kelp_validation_<planet>_<timestamp>.md` into `dir` and return its path.
pub fn write_validation_report(
    dir: &Path,
    model: &Model,
    setup: &ValidationSetup,
    comparison: &KernelComparison,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::runtime(format!("Failed to create report dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let slug: String = model
        .planet
        .name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    let path = dir.join(format!("kelp_validation_{slug}_{ts}.md"));

    let mut file =
        File::create(&path).map_err(|e| AppError::runtime(format!("Failed to create report file: {e}")))?;
    write_report(&mut file, model, setup, comparison)?;

    log::info!("wrote validation report to {}", path.display());
    Ok(path)
}

fn write_report<W: Write>(
    out: &mut W,
    model: &Model,
    setup: &ValidationSetup,
    comparison: &KernelComparison,
) -> Result<(), AppError> {
    let err = |e: std::io::Error| AppError::runtime(format!("Failed to write report: {e}"));

    writeln!(out, "# kelp kernel validation").map_err(err)?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339()).map_err(err)?;
    writeln!(out, "- planet: {}", model.planet.name).map_err(err)?;
    writeln!(
        out,
        "- filter: {} ({} bins, {:.3}..{:.3} µm)",
        model.filter.name,
        model.filter.wavelength.len(),
        model.filter.wavelength.first().copied().unwrap_or(f64::NAN),
        model.filter.wavelength.last().copied().unwrap_or(f64::NAN)
    )
    .map_err(err)?;
    writeln!(
        out,
        "- params: offset={:.4}, alpha={:.4}, omega_drag={:.4}, A_B={:.3}, C_11={:.4}, f={:.4}",
        model.hotspot_offset,
        model.alpha,
        model.omega_drag,
        model.a_b,
        model.c_11(),
        setup.f
    )
    .map_err(err)?;
    writeln!(
        out,
        "- fast grid: {} theta x {} window phi",
        setup.window_grid.n_theta, setup.window_grid.n_phi
    )
    .map_err(err)?;
    writeln!(
        out,
        "- differentiable mesh: {} theta x {} phi on [-2pi, 2pi]",
        setup.mesh.n_theta, setup.mesh.n_phi
    )
    .map_err(err)?;
    writeln!(
        out,
        "- max |diff|: {:.4} ppm (atol {:.2} ppm, {})",
        comparison.max_abs_diff,
        setup.atol_ppm,
        if comparison.within(setup.atol_ppm) { "pass" } else { "fail" }
    )
    .map_err(err)?;

    writeln!(out, "\n## Phases (ppm)").map_err(err)?;
    writeln!(out, "| xi | fast | differentiable | abs diff |").map_err(err)?;
    writeln!(out, "| - | - | - | - |").map_err(err)?;
    for ((xi, a), b) in comparison
        .xi
        .iter()
        .zip(comparison.fast.iter())
        .zip(comparison.differentiable.iter())
    {
        writeln!(out, "| {xi:.4} | {a:.4} | {b:.4} | {:.4} |", (a - b).abs()).map_err(err)?;
    }
    Ok(())
}
