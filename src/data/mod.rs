//! Data sources: bundled catalogs, the SVO filter service and synthetic observations.

pub mod catalog;
pub mod sample;
pub mod svo;

pub use catalog::*;
pub use sample::*;
pub use svo::*;

use crate::domain::{Filter, FilterSource};
use crate::error::{AppError, EXIT_NETWORK};

/// Resolve a bandpass and optionally bin it down.
///
/// SVO lookups that fail on the network fall back to a bundled filter
/// carrying the same ID as an alias, when there is one.
pub fn resolve_filter(source: &FilterSource, bins: Option<usize>) -> Result<Filter, AppError> {
    resolve_filter_with(source, bins, SvoClient::from_env)
}

/// `resolve_filter` with the SVO client built by `connect`, only when needed.
fn resolve_filter_with<C>(source: &FilterSource, bins: Option<usize>, connect: C) -> Result<Filter, AppError>
where
    C: FnOnce() -> Result<SvoClient, AppError>,
{
    let mut filter = match source {
        FilterSource::Catalog(name) => Filter::from_name(name)?,
        FilterSource::Svo(id) => match connect().and_then(|c| c.fetch(id)) {
            Ok(f) => f,
            Err(err) if err.exit_code() == EXIT_NETWORK => match Filter::from_name(id) {
                Ok(bundled) => {
                    log::warn!("{err}; using bundled filter '{}' instead", bundled.name);
                    bundled
                }
                Err(_) => return Err(err),
            },
            Err(err) => return Err(err),
        },
    };
    if let Some(bins) = bins {
        filter.bin_down(bins)?;
    }
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_source_with_binning() {
        let f = resolve_filter(&FilterSource::Catalog("IRAC 1".into()), Some(5)).unwrap();
        assert_eq!(f.wavelength.len(), 5);
        assert!((f.wavelength[0] - 3.1739).abs() < 1e-9);
        assert!((f.transmittance[4] - 0.268).abs() < 1e-9);
    }

    fn offline() -> Result<SvoClient, AppError> {
        SvoClient::new("http://127.0.0.1:9")
    }

    #[test]
    fn unreachable_svo_falls_back_to_bundled_alias() {
        let source = FilterSource::Svo("Spitzer/IRAC.I1".into());
        let f = resolve_filter_with(&source, Some(5), offline).unwrap();
        assert_eq!(f.name, "IRAC 1");
        assert_eq!(f.wavelength.len(), 5);
    }

    #[test]
    fn unreachable_svo_without_alias_keeps_network_error() {
        let source = FilterSource::Svo("JWST/NIRCam.F444W".into());
        let err = resolve_filter_with(&source, None, offline).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("SVO request failed"));
    }
}
