//! Physicists' Hermite polynomials.
//!
//! The temperature perturbation basis `h_ml` is built from `H_l(α μ)`, where
//! `μ = cos θ`. We evaluate with the three-term recurrence:
//!
//! - `H_0(x) = 1`
//! - `H_1(x) = 2x`
//! - `H_{n+1}(x) = 2x H_n(x) - 2n H_{n-1}(x)`
//!
//! The recurrence is generic over [`Real`] so the differentiable kernel can
//! carry derivatives through it.

use crate::math::Real;

/// Evaluate `H_n(x)`.
pub fn hermite<R: Real>(n: usize, x: R) -> R {
    let two = R::constant(2.0);
    let mut prev = R::constant(1.0);
    if n == 0 {
        return prev;
    }
    let mut cur = two * x;
    for k in 1..n {
        let next = two * x * cur - R::constant(2.0 * k as f64) * prev;
        prev = cur;
        cur = next;
    }
    cur
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Dual;

    #[test]
    fn low_orders_match_closed_forms() {
        for &x in &[-1.3, -0.2, 0.0, 0.4, 2.0] {
            assert!((hermite(0, x) - 1.0).abs() < 1e-12);
            assert!((hermite(1, x) - 2.0 * x).abs() < 1e-12);
            assert!((hermite(2, x) - (4.0 * x * x - 2.0)).abs() < 1e-12);
            assert!((hermite(3, x) - (8.0 * x * x * x - 12.0 * x)).abs() < 1e-12);
            let x4 = x * x * x * x;
            assert!((hermite(4, x) - (16.0 * x4 - 48.0 * x * x + 12.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn derivative_follows_appell_identity() {
        // d/dx H_n(x) = 2n H_{n-1}(x)
        let x = 0.37;
        for n in 1..6 {
            let d = hermite(n, Dual::<1>::variable(x, 0));
            let expected = 2.0 * n as f64 * hermite(n - 1, x);
            assert!((d.eps[0] - expected).abs() < 1e-9, "n={n}: {} vs {expected}", d.eps[0]);
        }
    }
}
