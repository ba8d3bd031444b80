//! Formatted terminal output for curves, maps, kernel comparisons and fits.
//!
//! We keep formatting code in one place so:
//! - the physics/fitting code stays clean and testable
//! - output changes are localized (snapshot tests below)

use crate::domain::{ObservationResidual, PhaseCurve, PowerCoefficients, TemperatureMap};
use crate::fit::FitOutcome;
use crate::io::ingest::ObservationData;
use crate::kernel::KernelComparison;
use crate::models::Model;

/// Header shared by every summary: planet, filter and model parameters.
pub fn format_model_header(model: &Model, f: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Planet: {} | T_s={:.0} K | a/R_s={:.3} | Rp/R_s={:.5}\n",
        model.planet.name,
        model.planet.t_s,
        model.planet.a,
        model.planet.rp_rs(),
    ));
    out.push_str(&format!(
        "Filter: {} | {} bins | λ=[{:.3}, {:.3}] µm\n",
        model.filter.name,
        model.filter.wavelength.len(),
        model.filter.wavelength.first().copied().unwrap_or(f64::NAN),
        model.filter.wavelength.last().copied().unwrap_or(f64::NAN),
    ));
    out.push_str(&format!(
        "Params: offset={:.4} rad | alpha={:.4} | omega_drag={:.4} | A_B={:.3} | f={:.4}\n",
        model.hotspot_offset, model.alpha, model.omega_drag, model.a_b, f
    ));
    out.push_str(&format!("C_ml (lmax={}): {}\n", model.lmax, fmt_coefficients(&model.c_ml)));
    out.push_str(&format!("T_eq: {:.1} K\n", model.equilibrium_temperature(f)));
    out
}

/// Summary statistics of a phase curve.
pub fn format_curve_summary(model: &Model, f: f64, curve: &PhaseCurve) -> String {
    let mut out = String::new();
    out.push_str("=== kelp - thermal phase curve ===\n");
    out.push_str(&format_model_header(model, f));
    out.push('\n');
    out.push_str(&format!("Phases: n={}\n", curve.len()));
    out.push_str(&format!("Amplitude: {:.2} ppm\n", curve.amplitude()));
    out.push_str(&format!("Peak offset: {}\n", fmt_angle(curve.peak_offset())));
    out.push_str(&format!("Eclipse depth: {}\n", fmt_ppm(curve.eclipse_depth())));
    out.push_str(&format!("Nightside flux: {}\n", fmt_ppm(curve.nightside_flux())));
    out
}

/// Summary statistics of a temperature map.
pub fn format_map_summary(model: &Model, f: f64, map: &TemperatureMap) -> String {
    let mut out = String::new();
    out.push_str("=== kelp - temperature map ===\n");
    out.push_str(&format_model_header(model, f));
    out.push('\n');
    out.push_str(&format!("Grid: {} theta x {} phi\n", map.theta.len(), map.phi.len()));
    out.push_str(&format!("T range: [{:.1}, {:.1}] K\n", map.min(), map.max()));
    out.push_str(&format!("Dayside mean: {:.1} K\n", map.dayside_mean()));
    out.push_str(&format!("Nightside mean: {:.1} K\n", map.nightside_mean()));
    out
}

/// Kernel cross-validation result against `atol` (ppm).
pub fn format_comparison(comparison: &KernelComparison, atol: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("Kernels: n={} phases\n", comparison.xi.len()));
    out.push_str(&format!("Max |fast - differentiable|: {:.4} ppm (atol {atol:.2})\n", comparison.max_abs_diff));
    if let Some((xi, diff)) = comparison.worst_phase() {
        out.push_str(&format!("Worst phase: xi={xi:.4} rad ({diff:.4} ppm)\n"));
    }
    let verdict = if comparison.within(atol) { "PASS" } else { "FAIL" };
    out.push_str(&format!("Result: {verdict}\n"));
    out
}

/// Fit diagnostics: dataset, grid stage, refined parameters.
pub fn format_fit_summary(data: &ObservationData, outcome: &FitOutcome) -> String {
    let mut out = String::new();
    out.push_str("=== kelp - phase curve fit ===\n");
    out.push_str(&format!(
        "Data: rows={} used={} | phase column: {}{}\n",
        data.rows_read,
        data.rows_used,
        data.phase_column.label(),
        if data.default_sigma_used { " | default sigma" } else { "" },
    ));
    if !data.row_errors.is_empty() {
        out.push_str(&format!("Skipped rows: {}\n", data.row_errors.len()));
        for e in data.row_errors.iter().take(5) {
            out.push_str(&format!("  line {}: {}\n", e.line, e.message));
        }
    }

    out.push_str(&format!(
        "\nGrid best: offset={:.4} rad | C_11={:.4} | chi2={:.3}\n",
        outcome.grid.hotspot_offset, outcome.grid.c_11, outcome.grid.chi2
    ));

    out.push_str(&format!(
        "\nRefined ({} iterations{}):\n",
        outcome.iterations,
        if outcome.converged { "" } else { ", not converged" },
    ));
    for (p, sigma) in outcome.free.iter().zip(outcome.uncertainties.iter()) {
        out.push_str(&format!(
            "- {:<14} {:>12.6} ± {:.6}\n",
            p.name(),
            p.value(&outcome.model, outcome.params.f),
            sigma
        ));
    }
    out.push_str(&format!(
        "chi2={:.3} | reduced={:.4} | BIC={:.3}\n",
        outcome.chi2, outcome.reduced_chi2, outcome.bic
    ));
    out
}

/// Per-observation residual table.
pub fn format_residual_table(rows: &[ObservationResidual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>10} {:>12} {:>10} {:>12} {:>12} {:>8}",
            "xi", "flux", "sigma", "model", "residual", "pull"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!("{:-<10} {:-<12} {:-<10} {:-<12} {:-<12} {:-<8}", "", "", "", "", "", "").trim_end(),
    );
    out.push('\n');

    for r in rows {
        let p = &r.point;
        out.push_str(
            format!(
                "{:>10.4} {:>12.2} {:>10.2} {:>12.2} {:>12.2} {:>8.2}",
                p.xi,
                p.flux_ppm,
                p.sigma_ppm,
                r.model_ppm,
                r.residual_ppm,
                r.residual_ppm / p.sigma_ppm
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn fmt_coefficients(c: &PowerCoefficients) -> String {
    let terms = c.nonzero_terms();
    if terms.is_empty() {
        return "(uniform)".to_string();
    }
    let parts: Vec<String> = terms
        .iter()
        .map(|(l, m, v)| format!("C{l}{m}={v:.4}"))
        .collect();
    parts.join(", ")
}

fn fmt_angle(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.4} rad ({:.1} deg)", v.to_degrees()),
        _ => "-".to_string(),
    }
}

fn fmt_ppm(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2} ppm"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObservationPoint;

    #[test]
    fn residual_table_snapshot() {
        let rows = [ObservationResidual {
            point: ObservationPoint { xi: -1.5, flux_ppm: 812.5, sigma_ppm: 25.0 },
            model_ppm: 800.0,
            residual_ppm: 12.5,
        }];
        let txt = format_residual_table(&rows);
        let expected = concat!(
            "        xi         flux      sigma        model     residual     pull\n",
            "---------- ------------ ---------- ------------ ------------ --------\n",
            "   -1.5000       812.50      25.00       800.00        12.50     0.50\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn comparison_verdict() {
        let comparison = KernelComparison {
            xi: vec![-1.0, 0.0, 1.0],
            fast: vec![100.0, 200.0, 150.0],
            differentiable: vec![100.5, 203.0, 150.0],
            max_abs_diff: 3.0,
        };
        let pass = format_comparison(&comparison, 5.0);
        assert!(pass.contains("Worst phase: xi=0.0000 rad (3.0000 ppm)"));
        assert!(pass.ends_with("Result: PASS\n"));
        assert!(format_comparison(&comparison, 1.0).ends_with("Result: FAIL\n"));
    }

    #[test]
    fn curve_summary_reports_shape() {
        let planet = crate::domain::Planet {
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
        let filter = crate::domain::Filter::new("flat", vec![3.0, 4.0], vec![1.0, 1.0]).unwrap();
        let c = PowerCoefficients::single(1, 1, 0.18).unwrap();
        let model = Model::new(-0.8, 0.575, 4.5, 0.0, c, 1, planet, filter).unwrap();
        let curve = PhaseCurve::new(
            vec![-std::f64::consts::PI, 0.0, 1.0, std::f64::consts::PI],
            vec![100.0, 500.0, 600.0, 120.0],
        )
        .unwrap();

        let txt = format_curve_summary(&model, 0.7, &curve);
        assert!(txt.contains("Planet: Toy b"));
        assert!(txt.contains("C_ml (lmax=1): C11=0.1800"));
        assert!(txt.contains("Amplitude: 500.00 ppm"));
        assert!(txt.contains("Peak offset: 1.0000 rad (57.3 deg)"));
        assert!(txt.contains("Eclipse depth: 500.00 ppm"));
        assert!(txt.contains("Nightside flux: 110.00 ppm"));
    }
}
