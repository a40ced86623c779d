//! Result set writers
//!
//! Exporters write into a temporary file beside the target and move it into
//! place only once the write succeeded, so a failed export leaves nothing
//! behind in the output directory.

pub mod csv;
pub mod geojson;
pub mod geometry;
pub mod shapefile;

use crate::domain::{LossportError, OutputFormat, Result, ResultSet};
use std::path::Path;

pub use self::csv::CsvExporter;
pub use self::geojson::GeoJsonExporter;
pub use self::shapefile::ShapefileExporter;

/// Writes a result set to one file format
pub trait Exporter: Send + Sync {
    fn format(&self) -> OutputFormat;

    /// Writes `set` to `path`, replacing any existing file
    fn export(&self, set: &ResultSet, path: &Path) -> Result<()>;
}

/// Returns the exporter for a format
pub fn exporter_for(format: OutputFormat) -> Box<dyn Exporter> {
    match format {
        OutputFormat::Csv => Box::new(CsvExporter),
        OutputFormat::Shapefile => Box::new(ShapefileExporter),
        OutputFormat::GeoJson => Box::new(GeoJsonExporter),
    }
}

/// Directory an export target lives in
fn parent_dir(path: &Path) -> Result<&Path> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| LossportError::Export(format!("{} has no parent directory", path.display())))
}

/// Fails unless the set carries at least one shape
fn require_geometry(set: &ResultSet, format: OutputFormat) -> Result<()> {
    if set.has_geometry() {
        Ok(())
    } else {
        Err(LossportError::Export(format!(
            "{} has no geometry to write as {}",
            set.kind, format
        )))
    }
}
