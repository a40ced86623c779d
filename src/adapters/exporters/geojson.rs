//! GeoJSON writer
//!
//! Writes a FeatureCollection with one feature per row. Polygons are promoted
//! to multipolygons so every feature of a polygon layer has the same type.

use super::geometry::{parse_all, promote_polygon};
use super::{parent_dir, require_geometry, Exporter};
use crate::domain::{OutputFormat, Result, ResultSet, Value};
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub struct GeoJsonExporter;

fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(s) => JsonValue::String(s.clone()),
    }
}

/// Builds the feature collection for a result set
pub fn feature_collection(set: &ResultSet) -> FeatureCollection {
    let wkts = set.geometry.as_deref().unwrap_or_default();
    let (shapes, invalid) = parse_all(wkts);
    if invalid > 0 {
        tracing::warn!(kind = %set.kind, invalid, "Rows with invalid geometry written without shape");
    }

    let columns = set.table.columns();
    let features = set
        .table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let properties: JsonObject = columns
                .iter()
                .zip(row)
                .map(|(name, value)| (name.clone(), to_json(value)))
                .collect();
            let geometry = shapes
                .get(i)
                .cloned()
                .flatten()
                .map(|g| geojson::Geometry::new(geojson::Value::from(&promote_polygon(g))));
            Feature {
                bbox: None,
                geometry,
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

impl Exporter for GeoJsonExporter {
    fn format(&self) -> OutputFormat {
        OutputFormat::GeoJson
    }

    fn export(&self, set: &ResultSet, path: &Path) -> Result<()> {
        require_geometry(set, self.format())?;
        let collection = feature_collection(set);

        let mut tmp = NamedTempFile::new_in(parent_dir(path)?)?;
        serde_json::to_writer(tmp.as_file_mut(), &collection)?;
        tmp.as_file_mut().flush()?;
        tmp.persist(path).map_err(|e| e.error)?;

        tracing::debug!(path = %path.display(), features = collection.features.len(), "Wrote GeoJSON");
        Ok(())
    }
}
