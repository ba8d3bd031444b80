//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - model phase curve: `-` line
//! - observations: `o`
//! - secondary eclipse (`ξ = 0`): `|` where nothing else is drawn

use std::f64::consts::PI;

use crate::domain::{ObservationPoint, PhaseCurve, TemperatureMap};

/// Brightness ramp for heat maps, coolest first.
const RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Render a phase curve, optionally with observations overlaid.
pub fn render_phase_curve(
    curve: &PhaseCurve,
    observations: &[ObservationPoint],
    width: usize,
    height: usize,
) -> String {
    let points: Vec<(f64, f64)> = curve
        .xi
        .iter()
        .zip(curve.flux.iter())
        .map(|(&x, &y)| (x, y))
        .collect();
    let (x_min, x_max) = x_range(&points, observations).unwrap_or((-PI, PI));
    render_plot(observations, &points, x_min, x_max, width, height)
}

fn render_plot(
    observations: &[ObservationPoint],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = y_range(observations, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curve first so points overlay it.
    draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);

    for p in observations {
        let x = map_x(p.xi, x_min, x_max, width);
        let y = map_y(p.flux_ppm, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    if x_min < 0.0 && x_max > 0.0 {
        let x = map_x(0.0, x_min, x_max, width);
        for row in grid.iter_mut() {
            if row[x] == ' ' {
                row[x] = '|';
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: xi=[{x_min:.3}, {x_max:.3}] rad | flux=[{y_min:.2}, {y_max:.2}] ppm\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Render a temperature map as a character heat map.
///
/// Rows run from the north pole (`θ = 0`, top) to the south pole; columns
/// span the map's longitudes. Each cell samples the nearest map node.
pub fn render_heat_map(map: &TemperatureMap, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let n_theta = map.theta.len();
    let n_phi = map.phi.len();

    let mut out = String::new();
    if n_theta == 0 || n_phi == 0 {
        out.push_str("Map: (empty)\n");
        return out;
    }

    let (t_min, t_max) = (map.min(), map.max());
    let span = t_max - t_min;
    out.push_str(&format!(
        "Map: phi=[{:.3}, {:.3}] rad | T=[{t_min:.1}, {t_max:.1}] K\n",
        map.phi[0],
        map.phi[n_phi - 1]
    ));

    for r in 0..height {
        let i_theta = nearest(r, height, n_theta);
        let row: String = (0..width)
            .map(|c| {
                let t = map.at(nearest(c, width, n_phi), i_theta);
                let u = if span > 0.0 { ((t - t_min) / span).clamp(0.0, 1.0) } else { 0.5 };
                RAMP[(u * (RAMP.len() - 1) as f64).round() as usize]
            })
            .collect();
        out.push_str(&row);
        out.push('\n');
    }
    out
}

/// Index into `n` nodes for cell `i` of `cells`.
fn nearest(i: usize, cells: usize, n: usize) -> usize {
    if cells < 2 || n < 2 {
        return 0;
    }
    ((i as f64 * (n - 1) as f64) / (cells - 1) as f64).round() as usize
}

fn x_range(curve: &[(f64, f64)], observations: &[ObservationPoint]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in curve {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    for p in observations {
        min_x = min_x.min(p.xi);
        max_x = max_x.max(p.xi);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(observations: &[ObservationPoint], curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for p in observations {
        min_y = min_y.min(p.flux_ppm);
        max_y = max_y.max(p.flux_ppm);
    }
    for &(_, y) in curve {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // Flat curves (uniform planets) still get a visible band.
        Some((min_y - 1.0, min_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let xx = map_x(x, x_min, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, xx, yy, '-');
        } else {
            grid[yy][xx] = '-';
        }
        prev = Some((xx, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
