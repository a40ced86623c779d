//! WKT parsing and geometry normalization

use crate::domain::{LossportError, Result};
use geo_types::{Geometry, MultiPolygon};
use wkt::TryFromWkt;

/// Parses a WKT string as produced by `STAsText()`
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    Geometry::<f64>::try_from_wkt_str(text.trim())
        .map_err(|e| LossportError::Export(format!("Invalid WKT geometry: {e}")))
}

/// Wraps a lone polygon in a multipolygon; other shapes pass through
pub fn promote_polygon(geometry: Geometry<f64>) -> Geometry<f64> {
    match geometry {
        Geometry::Polygon(p) => Geometry::MultiPolygon(MultiPolygon(vec![p])),
        other => other,
    }
}

/// Parses every present WKT value, keeping row positions
///
/// Unparseable values become `None` and are counted.
pub fn parse_all(wkts: &[Option<String>]) -> (Vec<Option<Geometry<f64>>>, usize) {
    let mut invalid = 0;
    let parsed = wkts
        .iter()
        .map(|w| {
            w.as_deref().and_then(|text| match parse_wkt(text) {
                Ok(g) => Some(g),
                Err(e) => {
                    invalid += 1;
                    tracing::debug!(error = %e, "Skipping geometry");
                    None
                }
            })
        })
        .collect();
    (parsed, invalid)
}
