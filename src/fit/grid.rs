//! Search grid generation.
//!
//! Stage 1 of the fit is a deterministic grid search over
//! `(hotspot_offset, C_11)`. The phase curve is strongly non-linear in the
//! offset, so the grid gives Levenberg–Marquardt a start inside the right
//! basin.

use crate::error::AppError;

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn linear_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(AppError::input(format!(
            "Invalid grid range: min={min}, max={max} (must be finite and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::input("Grid steps must be >= 2."));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    Ok((0..steps)
        .map(|i| if i + 1 == steps { max } else { min + step * i as f64 })
        .collect())
}

/// Cartesian `(hotspot_offset, C_11)` grid, offset-major.
pub fn offset_c11_grid(
    offset_range: (f64, f64),
    offset_steps: usize,
    c11_range: (f64, f64),
    c11_steps: usize,
) -> Result<Vec<(f64, f64)>, AppError> {
    let offsets = linear_space(offset_range.0, offset_range.1, offset_steps)?;
    let c11s = linear_space(c11_range.0, c11_range.1, c11_steps)?;
    let mut out = Vec::with_capacity(offsets.len() * c11s.len());
    for &o in &offsets {
        for &c in &c11s {
            out.push((o, c));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_space_endpoints() {
        let v = linear_space(-1.0, 1.0, 5).unwrap();
        assert_eq!(v, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(linear_space(1.0, 1.0, 5).is_err());
        assert!(linear_space(0.0, 1.0, 1).is_err());
        assert!(linear_space(f64::NAN, 1.0, 3).is_err());
    }

    #[test]
    fn grid_is_offset_major() {
        let g = offset_c11_grid((0.0, 1.0), 2, (0.1, 0.3), 3).unwrap();
        assert_eq!(g.len(), 6);
        assert_eq!(g[0], (0.0, 0.1));
        assert_eq!(g[2].1, 0.3);
        assert_eq!(g[3], (1.0, 0.1));
    }
}
