//! Exported files and their catalog metadata

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::AnalysisId;
use super::results::ResultKind;

/// Subcategory recorded for every exported result file
pub const RESULTS_SUBCATEGORY: &str = "Results";

/// Output file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Shapefile,
    GeoJson,
}

impl OutputFormat {
    /// Formats in export order
    pub const ALL: [OutputFormat; 3] = [
        OutputFormat::Csv,
        OutputFormat::Shapefile,
        OutputFormat::GeoJson,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Shapefile => "shp",
            OutputFormat::GeoJson => "geojson",
        }
    }

    pub fn is_spatial(&self) -> bool {
        !matches!(self, OutputFormat::Csv)
    }

    pub fn icon(&self) -> Icon {
        if self.is_spatial() {
            Icon::Spatial
        } else {
            Icon::Spreadsheet
        }
    }

    /// Whether a result kind can be written in this format
    pub fn accepts(&self, kind: ResultKind) -> bool {
        !self.is_spatial() || kind.is_spatial()
    }

    /// `<kind>.<extension>`
    pub fn file_name(&self, kind: ResultKind) -> String {
        format!("{}.{}", kind.file_stem(), self.extension())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Shapefile => "shapefile",
            OutputFormat::GeoJson => "geojson",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "shapefile" | "shp" => Ok(OutputFormat::Shapefile),
            "geojson" => Ok(OutputFormat::GeoJson),
            other => Err(format!(
                "Unknown output format '{other}'. Must be one of: csv, shapefile, geojson"
            )),
        }
    }
}

/// Display hint for the loss library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Spreadsheet,
    Spatial,
}

impl Icon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Spreadsheet => "spreadsheet",
            Icon::Spatial => "spatial",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exported file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    /// Trimmed return period
    pub category: String,
    pub subcategory: String,
    pub name: String,
    pub icon: Icon,
    /// Path relative to the package output directory, `/` separated
    pub file: String,
    pub analysis_id: AnalysisId,
}
