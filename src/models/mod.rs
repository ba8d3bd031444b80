//! Physical model: temperature maps, blackbody band intensities and the
//! [`Model`] that ties them to a planet and a bandpass.
//!
//! The pieces are small, pure functions so the kernels and the fitter can
//! stay generic.

pub mod model;
pub mod planck;
pub mod temperature;

pub use model::*;
pub use planck::*;
pub use temperature::*;
