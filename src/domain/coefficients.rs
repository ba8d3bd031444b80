//! `C_ml` power coefficients of the `h_ml` temperature expansion.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Coefficients `C_ml` for `l = 0..=lmax`, `m = -l..=l`.
///
/// Stored as rows (one per `l`) of length `2l + 1`. Slot `m` holds `m >= 0`
/// and negative `m` wraps from the end of the row (slot `2l + 1 + m`), so
/// `[[0.0], [0.0, 0.18, 0.0]]` reads `[[C_00], [C_10, C_11, C_1-1]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerCoefficients {
    rows: Vec<Vec<f64>>,
}

impl PowerCoefficients {
    /// All-zero coefficients up to `lmax`.
    pub fn new(lmax: usize) -> Self {
        Self {
            rows: (0..=lmax).map(|l| vec![0.0; 2 * l + 1]).collect(),
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, AppError> {
        if rows.is_empty() {
            return Err(AppError::input("C_ml needs at least the l = 0 row."));
        }
        for (l, row) in rows.iter().enumerate() {
            if row.len() != 2 * l + 1 {
                return Err(AppError::input(format!(
                    "C_ml row l={l} must have {} entries (got {}).",
                    2 * l + 1,
                    row.len()
                )));
            }
            if row.iter().any(|c| !c.is_finite()) {
                return Err(AppError::input(format!("C_ml row l={l} has non-finite entries.")));
            }
        }
        Ok(Self { rows })
    }

    /// Coefficients up to `l` with a single non-zero entry `C_lm = value`.
    pub fn single(l: usize, m: i32, value: f64) -> Result<Self, AppError> {
        let mut c = Self::new(l);
        c.set(l, m, value)?;
        Ok(c)
    }

    pub fn lmax(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// `C_lm`, or `0.0` outside the stored range.
    pub fn get(&self, l: usize, m: i32) -> f64 {
        Self::index(l, m)
            .and_then(|idx| self.rows.get(l).and_then(|row| row.get(idx)))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, l: usize, m: i32, value: f64) -> Result<(), AppError> {
        let slot = Self::index(l, m)
            .and_then(|idx| self.rows.get_mut(l).and_then(|row| row.get_mut(idx)))
            .ok_or_else(|| {
                AppError::input(format!("C_ml index (l={l}, m={m}) is out of range."))
            })?;
        *slot = value;
        Ok(())
    }

    /// Non-zero `(l, m, C_lm)` triples with `l >= 1`.
    pub fn nonzero_terms(&self) -> Vec<(usize, i32, f64)> {
        let mut out = Vec::new();
        for (l, row) in self.rows.iter().enumerate().skip(1) {
            for (idx, &c) in row.iter().enumerate() {
                if c != 0.0 {
                    out.push((l, Self::order(l, idx), c));
                }
            }
        }
        out
    }

    /// True when `C_11` is the only coefficient that can perturb the map.
    pub fn is_c11_only(&self) -> bool {
        self.nonzero_terms().iter().all(|&(l, m, _)| l == 1 && m == 1)
    }

    fn index(l: usize, m: i32) -> Option<usize> {
        let l_i = l as i32;
        if m < -l_i || m > l_i {
            return None;
        }
        if m >= 0 {
            Some(m as usize)
        } else {
            Some((2 * l_i + 1 + m) as usize)
        }
    }

    /// Inverse of `index`.
    fn order(l: usize, idx: usize) -> i32 {
        if idx <= l {
            idx as i32
        } else {
            idx as i32 - (2 * l as i32 + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_orders_wrap_from_row_end() {
        let c = PowerCoefficients::from_rows(vec![vec![0.0], vec![0.0, 0.18, 0.0]]).unwrap();
        assert_eq!(c.lmax(), 1);
        assert_eq!(c.get(1, 1), 0.18);
        assert_eq!(c.get(1, 0), 0.0);
        assert_eq!(c.get(1, -1), 0.0);
        assert_eq!(c.get(2, 0), 0.0);
        assert!(c.is_c11_only());

        let c = PowerCoefficients::from_rows(vec![vec![0.0], vec![0.1, 0.2, 0.3]]).unwrap();
        assert_eq!((c.get(1, 0), c.get(1, 1), c.get(1, -1)), (0.1, 0.2, 0.3));
        assert_eq!(c.nonzero_terms(), vec![(1, 0, 0.1), (1, 1, 0.2), (1, -1, 0.3)]);
    }

    #[test]
    fn from_rows_validates_row_lengths() {
        let err = PowerCoefficients::from_rows(vec![vec![0.0], vec![0.0, 0.18]]).unwrap_err();
        assert!(err.message().contains("l=1"));
    }

    #[test]
    fn set_rejects_out_of_range_m() {
        let mut c = PowerCoefficients::new(1);
        assert!(c.set(1, 2, 1.0).is_err());
        c.set(1, -1, 0.3).unwrap();
        assert_eq!(c.nonzero_terms(), vec![(1, -1, 0.3)]);
        assert!(!c.is_c11_only());
    }

    #[test]
    fn single_builds_up_to_l() {
        let c = PowerCoefficients::single(2, -2, 0.5).unwrap();
        assert_eq!(c.lmax(), 2);
        assert_eq!(c.rows()[2], vec![0.0, 0.0, 0.0, 0.5, 0.0]);
        assert_eq!(c.nonzero_terms(), vec![(2, -2, 0.5)]);

        let c = PowerCoefficients::single(2, 1, 0.05).unwrap();
        assert_eq!(c.rows()[2], vec![0.0, 0.05, 0.0, 0.0, 0.0]);
    }
}
