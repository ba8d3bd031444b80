//! SVO Filter Profile Service client.
//!
//! Full-resolution bandpasses are fetched as two-column ASCII
//! (wavelength in Å, transmission) and converted to µm.

use reqwest::blocking::Client;

use crate::domain::Filter;
use crate::error::AppError;

const DEFAULT_URL: &str = "http://svo2.cab.inta-csic.es/theory/fps/getdata.php";
const ANGSTROM_PER_MICRON: f64 = 1e4;

pub struct SvoClient {
    client: Client,
    base_url: String,
}

impl SvoClient {
    /// Build a client; `KELP_SVO_URL` (environment or `.env`) overrides the service URL.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("KELP_SVO_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetch filter `id` (e.g. `"Spitzer/IRAC.I1"`).
    pub fn fetch(&self, id: &str) -> Result<Filter, AppError> {
        log::info!("fetching filter '{id}' from {}", self.base_url);
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("format", "ascii"), ("id", id)])
            .send()
            .map_err(|e| AppError::network(format!("SVO request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::network(format!(
                "SVO request for '{id}' failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::network(format!("Failed to read SVO response: {e}")))?;
        parse_svo_ascii(id, &body)
    }
}

/// Parse the two-column ASCII payload.
///
/// Comment (`#`) and blank lines are skipped. Rows are sorted by wavelength
/// and duplicate wavelengths keep their first transmission value. Negative
/// transmission (a detector artefact in some profiles) is clamped to zero.
pub fn parse_svo_ascii(id: &str, body: &str) -> Result<Filter, AppError> {
    let mut rows: Vec<(f64, f64)> = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut cols = line.split_whitespace();
        let (Some(w), Some(t)) = (cols.next(), cols.next()) else {
            return Err(AppError::network(format!(
                "SVO profile '{id}' line {}: expected two columns.",
                idx + 1
            )));
        };
        let parse = |s: &str| {
            s.parse::<f64>().map_err(|_| {
                AppError::network(format!(
                    "SVO profile '{id}' line {}: cannot parse '{s}'.",
                    idx + 1
                ))
            })
        };
        rows.push((parse(w)? / ANGSTROM_PER_MICRON, parse(t)?.max(0.0)));
    }

    if rows.is_empty() {
        // The service answers unknown IDs with an empty (or VOTable error) body.
        return Err(AppError::input(format!("SVO returned no data for filter '{id}'.")));
    }

    rows.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    rows.dedup_by(|b, a| a.0 == b.0);
    let (wavelength, transmittance) = rows.into_iter().unzip();
    Filter::new(id, wavelength, transmittance)
}
