//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the planet/star system (`Planet`) and bandpasses (`Filter`)
//! - temperature-map coefficients (`PowerCoefficients`)
//! - integration grids and outputs (`SphereGrid`, `WindowGrid`, `PhaseCurve`, `TemperatureMap`)
//! - run configuration, observations and model files

pub mod coefficients;
pub mod curve;
pub mod filter;
pub mod planet;
pub mod types;

pub use coefficients::*;
pub use curve::*;
pub use filter::*;
pub use planet::*;
pub use types::*;
