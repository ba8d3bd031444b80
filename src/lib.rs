//! `kelp` library crate: thermal phase curves of exoplanets.
//!
//! The binary (`kelp`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the kernels, fitting and catalogs are reusable from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod kernel;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
