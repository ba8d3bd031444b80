//! Grids, trapezoid integration and linear interpolation.

use crate::math::Real;

/// `n` evenly spaced points on `[start, end]` (inclusive).
///
/// `n = 1` yields `[start]`; `n = 0` yields an empty vector.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n as f64 - 1.0);
            (0..n)
                .map(|i| if i + 1 == n { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Trapezoid rule for samples `y` at abscissae `x`.
///
/// Extra samples on either side are ignored; fewer than two samples integrate to zero.
pub fn trapz<R: Real>(y: &[R], x: &[f64]) -> R {
    let n = y.len().min(x.len());
    let mut acc = R::constant(0.0);
    for i in 1..n {
        let dx = R::constant(0.5 * (x[i] - x[i - 1]));
        acc = acc + (y[i] + y[i - 1]) * dx;
    }
    acc
}

/// Nested trapezoid over a row-major grid: `values[i_outer * inner.len() + i_inner]`.
///
/// Integrates each row along `inner`, then the row integrals along `outer`.
pub fn trapz_2d<R: Real>(values: &[R], inner: &[f64], outer: &[f64]) -> R {
    let stride = inner.len();
    if stride == 0 {
        return R::constant(0.0);
    }
    let rows: Vec<R> = values
        .chunks_exact(stride)
        .take(outer.len())
        .map(|row| trapz(row, inner))
        .collect();
    trapz(&rows, outer)
}

/// Trapezoid weights `w` such that `Σ w_i y_i == trapz(y, x)`.
pub fn trapz_weights(x: &[f64]) -> Vec<f64> {
    let mut w = vec![0.0; x.len()];
    for i in 1..x.len() {
        let half = 0.5 * (x[i] - x[i - 1]);
        w[i - 1] += half;
        w[i] += half;
    }
    w
}

/// Linear interpolation on ascending `xs`.
///
/// Returns `None` outside `[xs[0], xs[last]]` or for mismatched inputs.
pub fn interp(x: f64, xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.is_empty() || !x.is_finite() {
        return None;
    }
    let last = xs.len() - 1;
    if x < xs[0] || x > xs[last] {
        return None;
    }
    if xs.len() == 1 {
        return Some(ys[0]);
    }
    let idx = xs.partition_point(|&v| v <= x).clamp(1, last);
    let (x0, x1) = (xs[idx - 1], xs[idx]);
    let (y0, y1) = (ys[idx - 1], ys[idx]);
    if x1 == x0 {
        return Some(y0);
    }
    Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
}

/// Wrap an angle into `[-π, π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    (angle + std::f64::consts::PI).rem_euclid(two_pi) - std::f64::consts::PI
}
