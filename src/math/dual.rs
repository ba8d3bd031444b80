//! Scalar abstraction and forward-mode dual numbers.
//!
//! The differentiable phase-curve kernel is written once against [`Real`] and
//! instantiated twice:
//!
//! - `f64` for plain evaluation
//! - [`Dual<N>`] to propagate `N` partial derivatives alongside the value
//!
//! Only the operations the physics needs are provided (`exp`, `exp_m1`,
//! `sqrt`, `powf`, `sin`, `cos` and the four arithmetic operators).

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A scalar the kernels can compute with.
pub trait Real:
    Copy
    + Debug
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Lift a constant (zero derivative).
    fn constant(value: f64) -> Self;
    /// Primal value.
    fn value(&self) -> f64;
    fn exp(self) -> Self;
    fn exp_m1(self) -> Self;
    fn sqrt(self) -> Self;
    fn powf(self, n: f64) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
}

impl Real for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    fn value(&self) -> f64 {
        *self
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn exp_m1(self) -> Self {
        f64::exp_m1(self)
    }

    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    fn powf(self, n: f64) -> Self {
        f64::powf(self, n)
    }

    fn sin(self) -> Self {
        f64::sin(self)
    }

    fn cos(self) -> Self {
        f64::cos(self)
    }
}

/// Forward-mode dual number with `N` tangent directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual<const N: usize> {
    pub re: f64,
    pub eps: [f64; N],
}

impl<const N: usize> Dual<N> {
    /// An independent variable: unit tangent along `index`.
    ///
    /// # Panics
    /// Panics if `index >= N`.
    pub fn variable(value: f64, index: usize) -> Self {
        let mut eps = [0.0; N];
        eps[index] = 1.0;
        Self { re: value, eps }
    }

    /// Apply the chain rule for a unary function with value `f` and slope `df`.
    fn chain(self, f: f64, df: f64) -> Self {
        let mut eps = self.eps;
        for e in &mut eps {
            *e *= df;
        }
        Self { re: f, eps }
    }
}

impl<const N: usize> Add for Dual<N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let mut eps = self.eps;
        for (a, b) in eps.iter_mut().zip(rhs.eps.iter()) {
            *a += b;
        }
        Self { re: self.re + rhs.re, eps }
    }
}

impl<const N: usize> Sub for Dual<N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let mut eps = self.eps;
        for (a, b) in eps.iter_mut().zip(rhs.eps.iter()) {
            *a -= b;
        }
        Self { re: self.re - rhs.re, eps }
    }
}

impl<const N: usize> Mul for Dual<N> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut eps = [0.0; N];
        for (i, e) in eps.iter_mut().enumerate() {
            *e = self.eps[i] * rhs.re + self.re * rhs.eps[i];
        }
        Self { re: self.re * rhs.re, eps }
    }
}

impl<const N: usize> Div for Dual<N> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let inv = 1.0 / rhs.re;
        let mut eps = [0.0; N];
        for (i, e) in eps.iter_mut().enumerate() {
            *e = (self.eps[i] * rhs.re - self.re * rhs.eps[i]) * inv * inv;
        }
        Self { re: self.re * inv, eps }
    }
}

impl<const N: usize> Neg for Dual<N> {
    type Output = Self;

    fn neg(self) -> Self {
        let mut eps = self.eps;
        for e in &mut eps {
            *e = -*e;
        }
        Self { re: -self.re, eps }
    }
}

impl<const N: usize> Real for Dual<N> {
    fn constant(value: f64) -> Self {
        Self { re: value, eps: [0.0; N] }
    }

    fn value(&self) -> f64 {
        self.re
    }

    fn exp(self) -> Self {
        let e = self.re.exp();
        self.chain(e, e)
    }

    fn exp_m1(self) -> Self {
        self.chain(self.re.exp_m1(), self.re.exp())
    }

    fn sqrt(self) -> Self {
        let s = self.re.sqrt();
        self.chain(s, 0.5 / s)
    }

    fn powf(self, n: f64) -> Self {
        self.chain(self.re.powf(n), n * self.re.powf(n - 1.0))
    }

    fn sin(self) -> Self {
        self.chain(self.re.sin(), self.re.cos())
    }

    fn cos(self) -> Self {
        self.chain(self.re.cos(), -self.re.sin())
    }
}
