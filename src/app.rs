//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves planets and filters
//! - evaluates kernels, maps and fits
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, CurveArgs, FitArgs, MapArgs, ModelArgs, PlotArgs, SimulateArgs, ValidateArgs};
use crate::domain::{
    FilterSource, FitSettings, ModelParams, PowerCoefficients, RunConfig, SimulationSettings, SphereGrid,
    WindowGrid,
};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `kelp` binary.
pub fn run() -> Result<(), AppError> {
    // We want `kelp` and `kelp -p "WASP-43"` to behave like `kelp tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Curve(args) => handle_curve(args),
        Command::Map(args) => handle_map(args),
        Command::Validate(args) => handle_validate(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Fit(args) => handle_fit(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_curve(args: CurveArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.model)?;
    let run = pipeline::run_curve(&config)?;

    println!(
        "{}",
        crate::report::format_curve_summary(&run.model, config.params.f, &run.curve)
    );
    if config.plot {
        let plot = crate::plot::render_phase_curve(&run.curve, &[], config.plot_width, config.plot_height);
        println!("{plot}");
    }

    write_exports(&config, &run.model, &run.curve)
}

fn handle_map(args: MapArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.model)?;
    let run = pipeline::run_map(&config, args.map_theta, args.map_phi)?;

    println!(
        "{}",
        crate::report::format_map_summary(&run.model, config.params.f, &run.map)
    );
    if config.plot {
        println!(
            "{}",
            crate::plot::render_heat_map(&run.map, config.plot_width, config.plot_height)
        );
    }
    Ok(())
}

fn handle_validate(args: ValidateArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.model)?;
    let run = pipeline::run_validation(&config)?;

    print!("{}", crate::report::format_model_header(&run.model, config.params.f));
    println!();
    println!("{}", crate::report::format_comparison(&run.comparison, config.atol_ppm));
    if let Some(path) = &run.report {
        println!("Report: {}", path.display());
    }

    run.comparison.ensure_within(config.atol_ppm)
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.model)?;
    let settings = SimulationSettings {
        n_points: args.points,
        sigma_ppm: args.sigma,
        seed: args.seed,
        output: args.output,
    };
    let run = pipeline::run_simulation(&config, &settings)?;

    println!(
        "Wrote {} observations (sigma={:.1} ppm, seed={}) to {}",
        run.observations.len(),
        settings.sigma_ppm,
        settings.seed,
        settings.output.display()
    );
    if config.plot {
        let curve = pipeline::evaluate_curve(&run.model, &config)?;
        let plot = crate::plot::render_phase_curve(&curve, &run.observations, config.plot_width, config.plot_height);
        println!("{plot}");
    }
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.model)?;
    let data = match &args.data {
        Some(path) => crate::cli::picker::validate_csv_path(path)?,
        None => crate::cli::picker::prompt_for_csv_path()?,
    };
    let settings = fit_settings_from_args(&args, data);
    let run = pipeline::run_fit(&config, &settings)?;

    println!("{}", crate::report::format_fit_summary(&run.data, &run.outcome));
    println!(
        "{}",
        crate::report::format_curve_summary(&run.outcome.model, config.params.f, &run.curve)
    );

    let worst = crate::report::largest_residuals(&run.residuals, args.top);
    if !worst.is_empty() {
        println!("Largest residuals:");
        println!("{}", crate::report::format_residual_table(&worst));
    }

    if config.plot {
        let plot = crate::plot::render_phase_curve(&run.curve, &run.data.points, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    if let Some(path) = &args.export_residuals {
        crate::io::export::write_residuals_csv(path, &run.residuals)?;
    }
    write_exports(&config, &run.outcome.model, &run.curve)
}

fn handle_tui(args: ModelArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    crate::tui::run(config)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::curve::read_model_json(&args.model)?;
    let curve = file.curve()?;

    let observations = match &args.data {
        Some(path) => crate::io::ingest::load_observations(path, &file.planet, 1.0)?.points,
        None => Vec::new(),
    };

    println!(
        "{} | {} | offset={:.4} C_11={:.4} | created {}",
        file.planet.name,
        file.filter.label(),
        file.params.hotspot_offset,
        file.params.c_ml.get(1, 1),
        file.created.to_rfc3339()
    );
    let plot = crate::plot::render_phase_curve(&curve, &observations, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn write_exports(config: &RunConfig, model: &crate::models::Model, curve: &crate::domain::PhaseCurve) -> Result<(), AppError> {
    if let Some(path) = &config.export_curve {
        crate::io::export::write_curve_csv(path, curve)?;
    }
    if let Some(path) = &config.export_model {
        let file = crate::io::curve::model_file(model, config.params.f, &config.filter, config.filter_bins, curve);
        crate::io::curve::write_model_json(path, &file)?;
    }
    Ok(())
}

/// Derive the run configuration from CLI flags.
pub fn run_config_from_args(args: &ModelArgs) -> Result<RunConfig, AppError> {
    let c_ml = match &args.c_ml {
        Some(json) => {
            let rows: Vec<Vec<f64>> = serde_json::from_str(json)
                .map_err(|e| AppError::input(format!("Invalid --c-ml JSON: {e}")))?;
            PowerCoefficients::from_rows(rows)?
        }
        None => PowerCoefficients::single(1, 1, args.c11)?,
    };
    let lmax = c_ml.lmax();

    let filter = if args.svo {
        FilterSource::Svo(args.filter.clone())
    } else {
        FilterSource::Catalog(args.filter.clone())
    };

    Ok(RunConfig {
        planet: args.planet.clone(),
        filter,
        filter_bins: args.bins,
        params: ModelParams {
            hotspot_offset: args.offset,
            alpha: args.alpha,
            omega_drag: args.omega,
            a_b: args.a_b,
            c_ml,
            lmax,
            f: args.f,
        },
        n_phases: args.phases,
        window_grid: WindowGrid {
            n_theta: args.window_theta,
            n_phi: args.window_phi,
        },
        mesh: SphereGrid {
            n_theta: args.mesh_theta,
            n_phi: args.mesh_phi,
        },
        atol_ppm: args.atol,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_curve: args.export.clone(),
        export_model: args.export_model.clone(),
        report_dir: args.report.clone(),
    })
}

fn fit_settings_from_args(args: &FitArgs, data: std::path::PathBuf) -> FitSettings {
    FitSettings {
        data,
        default_sigma_ppm: args.default_sigma,
        offset_range: (args.offset_min, args.offset_max),
        offset_steps: args.offset_steps,
        c11_range: (args.c11_min, args.c11_max),
        c11_steps: args.c11_steps,
        free_circulation: args.free_circulation,
        max_iters: args.max_iters,
    }
}

/// Rewrite argv so `kelp` defaults to `kelp tui`.
///
/// Rules:
/// - `kelp`                      -> `kelp tui`
/// - `kelp -p "WASP-43" ...`     -> `kelp tui -p "WASP-43" ...`
/// - `kelp --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "curve" | "map" | "validate" | "simulate" | "fit" | "plot" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
