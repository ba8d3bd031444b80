//! Mathematical utilities: Hermite polynomials, quadrature, dual numbers and
//! small least-squares solves.

pub mod dual;
pub mod hermite;
pub mod ols;
pub mod quadrature;

pub use dual::*;
pub use hermite::*;
pub use ols::*;
pub use quadrature::*;
