//! Bundled planet and filter catalogs.
//!
//! Both catalogs are JSON files compiled into the binary, so lookups work
//! offline. Names match case- and whitespace-insensitively, and a trailing
//! planet letter `b` may be omitted (`"HD 189733"` finds `"HD 189733 b"`).

use serde::Deserialize;

use crate::domain::{Filter, Planet};
use crate::error::AppError;

const PLANETS_JSON: &str = include_str!("../../data/planets.json");
const FILTERS_JSON: &str = include_str!("../../data/filters.json");

#[derive(Debug, Deserialize)]
struct PlanetRecord {
    name: String,
    per: f64,
    t0: f64,
    inc: f64,
    rp: f64,
    a: f64,
    ecc: f64,
    w: f64,
    u: [f64; 2],
    #[serde(rename = "T_s")]
    t_s: f64,
}

impl PlanetRecord {
    fn into_planet(self) -> Planet {
        Planet {
            t_secondary: self.t0 + 0.5 * self.per,
            rp_a: self.rp / self.a,
            name: self.name,
            per: self.per,
            t0: self.t0,
            inc: self.inc,
            rp: self.rp,
            a: self.a,
            ecc: self.ecc,
            w: self.w,
            u: self.u,
            t_s: self.t_s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FilterRecord {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    wavelength_um: Vec<f64>,
    transmittance: Vec<f64>,
}

impl FilterRecord {
    fn matches(&self, key: &str) -> bool {
        normalize(&self.name) == key || self.aliases.iter().any(|a| normalize(a) == key)
    }
}

fn planet_records() -> Result<Vec<PlanetRecord>, AppError> {
    serde_json::from_str(PLANETS_JSON)
        .map_err(|e| AppError::registry(format!("Bundled planet catalog is invalid: {e}")))
}

fn filter_records() -> Result<Vec<FilterRecord>, AppError> {
    serde_json::from_str(FILTERS_JSON)
        .map_err(|e| AppError::registry(format!("Bundled filter catalog is invalid: {e}")))
}

/// Lowercase with whitespace removed.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Names of all bundled planets.
pub fn planet_names() -> Result<Vec<String>, AppError> {
    Ok(planet_records()?.into_iter().map(|r| r.name).collect())
}

/// Names of all bundled filters.
pub fn filter_names() -> Result<Vec<String>, AppError> {
    Ok(filter_records()?.into_iter().map(|r| r.name).collect())
}

impl Planet {
    /// Look up a planet in the bundled catalog.
    pub fn from_name(name: &str) -> Result<Planet, AppError> {
        let key = normalize(name);
        if key.is_empty() {
            return Err(AppError::input("Planet name is empty."));
        }
        let with_letter = format!("{key}b");
        let records = planet_records()?;
        let known: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
        let record = records
            .into_iter()
            .find(|r| {
                let candidate = normalize(&r.name);
                candidate == key || candidate == with_letter
            })
            .ok_or_else(|| {
                AppError::registry(format!(
                    "Unknown planet '{name}'. Known planets: {}.",
                    known.join(", ")
                ))
            })?;
        let planet = record.into_planet();
        planet.validate()?;
        log::debug!("resolved planet '{name}' to '{}'", planet.name);
        Ok(planet)
    }
}

impl Filter {
    /// Look up a bandpass (by name or alias) in the bundled catalog.
    pub fn from_name(name: &str) -> Result<Filter, AppError> {
        let key = normalize(name);
        let records = filter_records()?;
        let known: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
        let record = records
            .into_iter()
            .find(|r| r.matches(&key))
            .ok_or_else(|| {
                AppError::registry(format!(
                    "Unknown filter '{name}'. Known filters: {}.",
                    known.join(", ")
                ))
            })?;
        Filter::new(record.name, record.wavelength_um, record.transmittance)
    }
}
