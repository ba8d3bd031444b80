//! Phase-curve fitting.
//!
//! Responsibilities:
//!
//! - generate the `(hotspot_offset, C_11)` search grid
//! - evaluate each grid candidate (parallel)
//! - refine with Levenberg–Marquardt and report uncertainties + BIC

pub mod fitter;
pub mod grid;

pub use fitter::*;
pub use grid::*;
