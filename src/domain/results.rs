//! Result kinds and result sets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::table::{Table, Value};

/// A derived result a provider can produce for one selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    /// Summarized losses at the lowest level of geography
    Results,
    BuildingDamageByOccupancy,
    BuildingDamageByType,
    /// Essential facility damage, one row per facility
    DamagedFacilities,
    /// Fatalities and injuries at the lowest level of geography
    Casualties,
}

impl ResultKind {
    /// Every kind in export order
    pub const ALL: [ResultKind; 5] = [
        ResultKind::Results,
        ResultKind::BuildingDamageByOccupancy,
        ResultKind::BuildingDamageByType,
        ResultKind::DamagedFacilities,
        ResultKind::Casualties,
    ];

    /// File name without extension
    pub fn file_stem(&self) -> &'static str {
        match self {
            ResultKind::Results => "results",
            ResultKind::BuildingDamageByOccupancy => "building_damage_by_occupancy",
            ResultKind::BuildingDamageByType => "building_damage_by_type",
            ResultKind::DamagedFacilities => "damaged_facilities",
            ResultKind::Casualties => "casualties",
        }
    }

    /// Whether rows of this kind carry geometry and can go to spatial formats
    pub fn is_spatial(&self) -> bool {
        matches!(self, ResultKind::Results | ResultKind::DamagedFacilities)
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

impl FromStr for ResultKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        ResultKind::ALL
            .into_iter()
            .find(|k| k.file_stem() == needle)
            .ok_or_else(|| format!("Unknown result kind '{s}'"))
    }
}

/// A named table with optional per-row WKT geometry
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub kind: ResultKind,
    pub table: Table,
    /// One WKT string per row when present; `None` entries have no shape
    pub geometry: Option<Vec<Option<String>>>,
}

impl ResultSet {
    /// A result set without geometry
    pub fn new(kind: ResultKind, table: Table) -> Self {
        Self {
            kind,
            table,
            geometry: None,
        }
    }

    /// Splits `column` out of the table as the geometry of each row
    ///
    /// A table without that column yields a result set without geometry.
    pub fn with_geometry_column(kind: ResultKind, mut table: Table, column: &str) -> Self {
        let geometry = table.take_column(column).map(|values| {
            values
                .into_iter()
                .map(|v| match v {
                    Value::Text(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .collect()
        });
        Self {
            kind,
            table,
            geometry,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(|g| g.iter().any(Option::is_some))
    }
}
