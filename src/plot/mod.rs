//! Terminal plots (phase curves and temperature heat maps).

pub mod ascii;

pub use ascii::*;
