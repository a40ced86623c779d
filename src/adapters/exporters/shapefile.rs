//! ESRI shapefile writer
//!
//! A shapefile holds a single shape type, so the layer takes the most common
//! geometry family among the rows and skips rows of any other family or
//! without a shape. Attribute names are cut to the 10 characters dBase
//! allows and made unique. Numeric columns become `N(18,6)` fields and
//! everything else `C(<=254)`.

use super::geometry::parse_all;
use super::{parent_dir, require_geometry, Exporter};
use crate::domain::{LossportError, OutputFormat, Result, ResultSet, Value};
use geo_types::{Geometry, LineString, Polygon as GeoPolygon};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::record::EsriShape;
use shapefile::{Multipoint, Point, Polygon, PolygonRing, Polyline};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Coordinate system of Hazus inventory geometry
const PRJ_NAD83: &str = "GEOGCS[\"GCS_North_American_1983\",DATUM[\"D_North_American_1983\",\
SPHEROID[\"GRS_1980\",6378137.0,298.257222101]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]]";

const MAX_FIELD_NAME: usize = 10;
const MAX_CHARACTER_LENGTH: usize = 254;

/// Files making up one shapefile, moved into place `.shp` last
const SIDECARS: [&str; 4] = ["dbf", "shx", "prj", "shp"];

pub struct ShapefileExporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Family {
    Point,
    Multipoint,
    Polyline,
    Polygon,
}

fn family(geometry: &Geometry<f64>) -> Option<Family> {
    match geometry {
        Geometry::Point(_) => Some(Family::Point),
        Geometry::MultiPoint(_) => Some(Family::Multipoint),
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
            Some(Family::Polyline)
        }
        Geometry::Polygon(_)
        | Geometry::MultiPolygon(_)
        | Geometry::Rect(_)
        | Geometry::Triangle(_) => Some(Family::Polygon),
        Geometry::GeometryCollection(_) => None,
    }
}

fn points(line: &LineString<f64>) -> Vec<Point> {
    line.coords().map(|c| Point::new(c.x, c.y)).collect()
}

fn polygon_rings(polygon: &GeoPolygon<f64>) -> Vec<PolygonRing<Point>> {
    let mut rings = vec![PolygonRing::Outer(points(polygon.exterior()))];
    rings.extend(polygon.interiors().iter().map(|r| PolygonRing::Inner(points(r))));
    rings
}

fn to_polyline(geometry: &Geometry<f64>) -> Option<Polyline> {
    let parts: Vec<Vec<Point>> = match geometry {
        Geometry::Line(l) => vec![vec![Point::new(l.start.x, l.start.y), Point::new(l.end.x, l.end.y)]],
        Geometry::LineString(ls) => vec![points(ls)],
        Geometry::MultiLineString(mls) => mls.0.iter().map(points).collect(),
        _ => return None,
    };
    if parts.is_empty() || parts.iter().any(|p| p.len() < 2) {
        return None;
    }
    Some(Polyline::with_parts(parts))
}

fn to_polygon(geometry: &Geometry<f64>) -> Option<Polygon> {
    let rings: Vec<PolygonRing<Point>> = match geometry {
        Geometry::Polygon(p) => polygon_rings(p),
        Geometry::MultiPolygon(mp) => mp.0.iter().flat_map(polygon_rings).collect(),
        Geometry::Rect(r) => polygon_rings(&r.to_polygon()),
        Geometry::Triangle(t) => polygon_rings(&t.to_polygon()),
        _ => return None,
    };
    let degenerate = rings.iter().any(|r| match r {
        PolygonRing::Outer(p) | PolygonRing::Inner(p) => p.len() < 4,
    });
    if rings.is_empty() || degenerate {
        return None;
    }
    Some(Polygon::with_rings(rings))
}

/// Unique dBase field names for `columns`
pub fn field_names(columns: &[String]) -> Vec<String> {
    let mut used = HashSet::new();
    columns
        .iter()
        .map(|column| {
            let mut base: String = column
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .take(MAX_FIELD_NAME)
                .collect();
            if base.is_empty() {
                base = "field".to_string();
            }

            let mut name = base.clone();
            let mut n = 1;
            while !used.insert(name.to_ascii_uppercase()) {
                let suffix = n.to_string();
                let keep = base.len().min(MAX_FIELD_NAME - suffix.len());
                name = format!("{}{}", &base[..keep], suffix);
                n += 1;
            }
            name
        })
        .collect()
}

/// Cuts a string to at most `max` bytes on a character boundary
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Numeric,
    Character(u8),
}

fn field_kinds(set: &ResultSet) -> Vec<FieldKind> {
    (0..set.table.columns().len())
        .map(|i| {
            let values = set.table.rows().iter().map(|r| &r[i]);
            let numeric = values
                .clone()
                .all(|v| matches!(v, Value::Null | Value::Int(_) | Value::Float(_)));
            if numeric {
                FieldKind::Numeric
            } else {
                let longest = values
                    .map(|v| v.to_string().len())
                    .max()
                    .unwrap_or(1)
                    .clamp(1, MAX_CHARACTER_LENGTH);
                FieldKind::Character(longest as u8)
            }
        })
        .collect()
}

fn table_builder(names: &[String], kinds: &[FieldKind]) -> Result<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new();
    for (name, kind) in names.iter().zip(kinds) {
        let field = FieldName::try_from(name.as_str())
            .map_err(|e| LossportError::Export(format!("Invalid dBase field name '{name}': {e:?}")))?;
        builder = match kind {
            FieldKind::Numeric => builder.add_numeric_field(field, 18, 6),
            FieldKind::Character(len) => builder.add_character_field(field, *len),
        };
    }
    Ok(builder)
}

fn record(row: &[Value], names: &[String], kinds: &[FieldKind]) -> Record {
    let mut record = Record::default();
    for ((value, name), kind) in row.iter().zip(names).zip(kinds) {
        let field = match kind {
            FieldKind::Numeric => FieldValue::Numeric(value.as_f64()),
            FieldKind::Character(len) => FieldValue::Character(if value.is_null() {
                None
            } else {
                Some(truncate(&value.to_string(), usize::from(*len)).to_string())
            }),
        };
        record.insert(name.clone(), field);
    }
    record
}

fn write_layer<S: EsriShape>(
    path: &Path,
    builder: TableWriterBuilder,
    features: Vec<(S, Record)>,
) -> Result<()> {
    let failed = |e: shapefile::Error| LossportError::Export(format!("Shapefile write failed: {e}"));
    let mut writer = shapefile::Writer::from_path(path, builder).map_err(failed)?;
    for (shape, record) in &features {
        writer.write_shape_and_record(shape, record).map_err(failed)?;
    }
    Ok(())
}

impl Exporter for ShapefileExporter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Shapefile
    }

    fn export(&self, set: &ResultSet, path: &Path) -> Result<()> {
        require_geometry(set, self.format())?;
        let dir = parent_dir(path)?;
        let stem = path
            .file_stem()
            .ok_or_else(|| LossportError::Export(format!("{} has no file name", path.display())))?;

        let wkts = set.geometry.as_deref().unwrap_or_default();
        let (shapes, invalid) = parse_all(wkts);

        let mut counts: HashMap<Family, usize> = HashMap::new();
        for family in shapes.iter().flatten().filter_map(family) {
            *counts.entry(family).or_default() += 1;
        }
        let layer = counts
            .into_iter()
            .max_by_key(|(family, count)| (*count, std::cmp::Reverse(*family as u8)))
            .map(|(family, _)| family)
            .ok_or_else(|| LossportError::Export(format!("{} has no writable geometry", set.kind)))?;

        let names = field_names(set.table.columns());
        let kinds = field_kinds(set);
        let builder = table_builder(&names, &kinds)?;

        let stage = tempfile::Builder::new().prefix(".lossport-").tempdir_in(dir)?;
        let staged = stage.path().join(path.file_name().unwrap_or(stem));

        let rows = set.table.rows().iter().zip(&shapes);
        let mut skipped = invalid;
        macro_rules! features {
            ($convert:expr) => {
                rows.filter_map(|(row, shape)| {
                    let converted = shape.as_ref().and_then($convert);
                    if converted.is_none() {
                        skipped += 1;
                    }
                    converted.map(|s| (s, record(row, &names, &kinds)))
                })
                .collect::<Vec<_>>()
            };
        }

        let written = match layer {
            Family::Point => {
                let features = features!(|g: &Geometry<f64>| match g {
                    Geometry::Point(p) => Some(Point::new(p.x(), p.y())),
                    _ => None,
                });
                let count = features.len();
                write_layer(&staged, builder, features)?;
                count
            }
            Family::Multipoint => {
                let features = features!(|g: &Geometry<f64>| match g {
                    Geometry::MultiPoint(mp) => {
                        Some(Multipoint::new(mp.0.iter().map(|p| Point::new(p.x(), p.y())).collect()))
                    }
                    _ => None,
                });
                let count = features.len();
                write_layer(&staged, builder, features)?;
                count
            }
            Family::Polyline => {
                let features = features!(to_polyline);
                let count = features.len();
                write_layer(&staged, builder, features)?;
                count
            }
            Family::Polygon => {
                let features = features!(to_polygon);
                let count = features.len();
                write_layer(&staged, builder, features)?;
                count
            }
        };
        std::fs::write(staged.with_extension("prj"), PRJ_NAD83)?;

        move_into_place(&staged, path)?;

        if skipped > 0 {
            tracing::warn!(
                kind = %set.kind,
                skipped,
                "Rows without a {:?} shape left out of shapefile",
                layer
            );
        }
        tracing::debug!(path = %path.display(), features = written, "Wrote shapefile");
        Ok(())
    }
}

/// Moves every staged sidecar next to `path`
///
/// A failed move removes the sidecars already moved, so a layer lands whole
/// or not at all.
fn move_into_place(staged: &Path, path: &Path) -> Result<()> {
    let mut moved: Vec<std::path::PathBuf> = Vec::with_capacity(SIDECARS.len());
    for extension in SIDECARS {
        let from = staged.with_extension(extension);
        if !from.exists() {
            continue;
        }
        let to = path.with_extension(extension);
        if let Err(e) = std::fs::rename(&from, &to) {
            for done in &moved {
                if let Err(cleanup) = std::fs::remove_file(done) {
                    tracing::warn!(path = %done.display(), error = %cleanup, "Failed to remove partial shapefile");
                }
            }
            return Err(e.into());
        }
        moved.push(to);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ResultKind, Table};
    use tempfile::TempDir;

    #[test]
    fn test_field_names_are_short_and_unique() {
        let columns: Vec<String> = [
            "Injury_NightLevel1",
            "Injury_NightLevel2",
            "tract",
            "Fatalities Day",
            "",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let names = field_names(&columns);
        assert_eq!(names[0], "Injury_Nig");
        assert_eq!(names[1], "Injury_Ni1");
        assert_eq!(names[2], "tract");
        assert_eq!(names[3], "Fatalities");
        assert_eq!(names[4], "field");
        assert!(names.iter().all(|n| n.len() <= MAX_FIELD_NAME));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("héllo", 2), "h");
    }

    #[test]
    fn test_polygon_with_too_few_points_is_skipped() {
        let g = Geometry::LineString(LineString::from(vec![(0.0, 0.0)]));
        assert!(to_polyline(&g).is_none());
    }

    fn polygon_results() -> ResultSet {
        let mut table = Table::new(["tract", "EconLoss", "geometry"]);
        table
            .push_row(vec![
                Value::from("29095000100"),
                Value::Float(1250.0),
                Value::from("POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))"),
            ])
            .unwrap();
        ResultSet::with_geometry_column(ResultKind::Results, table, "geometry")
    }

    #[test]
    fn test_failed_move_leaves_no_partial_layer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.shp");
        // A directory squatting on the .prj path fails that move
        std::fs::create_dir(path.with_extension("prj")).unwrap();

        assert!(ShapefileExporter.export(&polygon_results(), &path).is_err());

        for ext in ["shp", "shx", "dbf"] {
            assert!(!path.with_extension(ext).exists(), "partial .{ext} left behind");
        }
        assert!(path.with_extension("prj").is_dir());
    }

    #[test]
    fn test_shapefile_export_writes_all_sidecars() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::new(["tract", "EconLoss", "geometry"]);
        table
            .push_row(vec![
                Value::from("29095000100"),
                Value::Float(1250.0),
                Value::from("POLYGON ((0 0, 0 1, 1 1, 1 0, 0 0))"),
            ])
            .unwrap();
        table
            .push_row(vec![Value::from("29095000200"), Value::Int(3), Value::Null])
            .unwrap();
        let set = ResultSet::with_geometry_column(ResultKind::Results, table, "geometry");

        let path = dir.path().join("results.shp");
        ShapefileExporter.export(&set, &path).unwrap();

        for ext in ["shp", "shx", "dbf", "prj"] {
            assert!(path.with_extension(ext).exists(), "missing .{ext}");
        }
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".lossport-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
