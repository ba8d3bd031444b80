//! Photometric bandpasses.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::trapz;

/// A tabulated bandpass.
///
/// Invariants (checked by [`Filter::new`]):
/// - `wavelength` (µm) is strictly increasing and has the same length as `transmittance`
/// - at least two samples
/// - all values finite, transmittance non-negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub wavelength: Vec<f64>,
    pub transmittance: Vec<f64>,
}

impl Filter {
    pub fn new(
        name: impl Into<String>,
        wavelength: Vec<f64>,
        transmittance: Vec<f64>,
    ) -> Result<Self, AppError> {
        let filter = Self {
            name: name.into(),
            wavelength,
            transmittance,
        };
        filter.validate()?;
        Ok(filter)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.wavelength.len() != self.transmittance.len() {
            return Err(AppError::input(format!(
                "Filter '{}': {} wavelengths but {} transmittance values.",
                self.name,
                self.wavelength.len(),
                self.transmittance.len()
            )));
        }
        if self.wavelength.len() < 2 {
            return Err(AppError::input(format!(
                "Filter '{}' needs at least 2 samples.",
                self.name
            )));
        }
        if self.wavelength.iter().any(|w| !(w.is_finite() && *w > 0.0)) {
            return Err(AppError::input(format!(
                "Filter '{}' has non-positive or non-finite wavelengths.",
                self.name
            )));
        }
        if self.transmittance.iter().any(|t| !(t.is_finite() && *t >= 0.0)) {
            return Err(AppError::input(format!(
                "Filter '{}' has negative or non-finite transmittance.",
                self.name
            )));
        }
        if self.wavelength.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AppError::input(format!(
                "Filter '{}': wavelengths must be strictly increasing.",
                self.name
            )));
        }
        Ok(())
    }

    /// Resample onto `bins` equal-width wavelength bins.
    ///
    /// Each bin reports its center and the mean transmittance of the samples
    /// falling inside it (the right edge belongs to the last bin). Empty bins are
    /// dropped. The filter is left untouched on error.
    pub fn bin_down(&mut self, bins: usize) -> Result<(), AppError> {
        if bins < 2 {
            return Err(AppError::input(format!("bin_down needs >= 2 bins (got {bins}).")));
        }

        let lo = self.wavelength[0];
        let hi = self.wavelength[self.wavelength.len() - 1];
        let width = (hi - lo) / bins as f64;

        let mut sums = vec![0.0; bins];
        let mut counts = vec![0usize; bins];
        for (&w, &t) in self.wavelength.iter().zip(self.transmittance.iter()) {
            let idx = (((w - lo) / width) as usize).min(bins - 1);
            sums[idx] += t;
            counts[idx] += 1;
        }

        let mut wavelength = Vec::with_capacity(bins);
        let mut transmittance = Vec::with_capacity(bins);
        for (i, (&sum, &count)) in sums.iter().zip(counts.iter()).enumerate() {
            if count == 0 {
                continue;
            }
            wavelength.push(lo + width * (i as f64 + 0.5));
            transmittance.push(sum / count as f64);
        }

        if wavelength.len() < 2 {
            return Err(AppError::input(format!(
                "Filter '{}' has fewer than 2 populated bins after bin_down({bins}).",
                self.name
            )));
        }

        log::debug!(
            "binned filter '{}' from {} to {} samples",
            self.name,
            self.wavelength.len(),
            wavelength.len()
        );
        self.wavelength = wavelength;
        self.transmittance = transmittance;
        Ok(())
    }

    /// Wavelengths in metres.
    pub fn wavelength_m(&self) -> Vec<f64> {
        self.wavelength.iter().map(|w| w * 1e-6).collect()
    }

    /// Transmittance-weighted mean wavelength (µm).
    pub fn mean_wavelength(&self) -> f64 {
        let weighted: Vec<f64> = self
            .wavelength
            .iter()
            .zip(self.transmittance.iter())
            .map(|(w, t)| w * t)
            .collect();
        trapz(&weighted, &self.wavelength) / trapz(&self.transmittance, &self.wavelength)
    }

    /// Equivalent width (µm): `∫ S dλ / max S`.
    pub fn width(&self) -> f64 {
        let peak = self.transmittance.iter().copied().fold(0.0_f64, f64::max);
        if peak <= 0.0 {
            return 0.0;
        }
        trapz(&self.transmittance, &self.wavelength) / peak
    }
}
