//! Damaged essential facilities
//!
//! Every facility kind has a hazard result table (`<prefix><Facility>`) and a
//! descriptive inventory table (`hz<Facility>`). Their columns differ between
//! kinds and product versions, so the join is assembled from
//! `INFORMATION_SCHEMA.COLUMNS` at query time. The per-kind tables are then
//! unioned into one.

use crate::adapters::store::{sql, StoreSession};
use crate::domain::{Result, ResultKind, ResultSet, Table};

/// Facility kinds carried by a Hazus study region
pub const ESSENTIAL_FACILITIES: [&str; 34] = [
    "AirportFlty",
    "BusFlty",
    "CareFlty",
    "CommunicationFlty",
    "Dams",
    "ElectricPowerFlty",
    "EmergencyCtr",
    "FerryFlty",
    "FireStation",
    "HighwayBridge",
    "HighwaySegment",
    "HighwayTunnel",
    "Levees",
    "LightRailBridge",
    "LightRailFlty",
    "LightRailSegment",
    "LightRailTunnel",
    "Military",
    "NaturalGasFlty",
    "NaturalGasPl",
    "NuclearFlty",
    "OilFlty",
    "OilPl",
    "PoliceStation",
    "PortFlty",
    "PotableWaterFlty",
    "RailFlty",
    "RailwayBridge",
    "RailwaySegment",
    "RailwayTunnel",
    "Runway",
    "School",
    "WasteWaterFlty",
    "WasteWaterPl",
];

/// Result columns that identify the analysis case rather than the facility
const CASE_COLUMNS: [&str; 2] = ["StudyCaseId", "ReturnPeriodId"];

/// Inventory columns carried into the output
const INVENTORY_FIELDS: [&str; 6] = ["Name", "City", "County", "State", "Fips", "Shape"];

/// Damage state columns and their loss-library names
const DAMAGE_STATES: [(&str, &str); 4] = [
    ("MINOR", "Affected"),
    ("MODERATE", "Minor"),
    ("SEVERE", "Major"),
    ("COMPLETE", "Destroyed"),
];

/// Columns of `table` in ordinal order
async fn table_columns(session: &mut StoreSession, table: &str) -> Result<Vec<String>> {
    let query = format!(
        "SELECT COLUMN_NAME AS fieldName FROM {}.INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_NAME = {} ORDER BY ORDINAL_POSITION",
        sql::ident(session.store_name()),
        sql::literal(table)
    );
    let columns = session.query(&query).await?;
    Ok(columns
        .column_values("fieldName")
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| v.as_text().map(str::to_string))
        .collect())
}

/// Picks the facility id column
///
/// Prefers a column named after the facility kind (`FireStationId`), then any
/// column ending in `Id`.
pub fn id_column<'a>(facility: &str, columns: &'a [String]) -> Option<&'a str> {
    columns
        .iter()
        .find(|c| c.contains(facility))
        .or_else(|| columns.iter().find(|c| c.ends_with("Id")))
        .map(String::as_str)
}

/// Builds the join query for one facility kind
///
/// `result_columns` and `inventory_columns` are the raw schema listings;
/// `filter` is the hazard's `WHERE` condition on the result table.
pub fn facility_query(
    session: &StoreSession,
    prefix: &str,
    facility: &str,
    filter: &str,
    result_columns: &[String],
    inventory_columns: &[String],
) -> Option<String> {
    let result_columns: Vec<String> = result_columns
        .iter()
        .filter(|c| !CASE_COLUMNS.iter().any(|k| c.eq_ignore_ascii_case(k)))
        .cloned()
        .collect();
    let id = id_column(facility, &result_columns)?;

    let mut inner = vec![
        format!("{} AS FacilityId", sql::ident(id)),
        format!("{} AS FacilityType", sql::literal(facility)),
    ];
    let mut outer = vec!["sr.FacilityType".to_string(), "sr.FacilityId".to_string()];

    for column in result_columns.iter().filter(|c| *c != id) {
        inner.push(sql::ident(column));
        let renamed = DAMAGE_STATES
            .iter()
            .find(|(state, _)| column.eq_ignore_ascii_case(state))
            .map(|(_, name)| *name);
        let selected = match renamed {
            Some(name) => format!("sr.{} AS {}", sql::ident(column), name),
            None if column.eq_ignore_ascii_case("EconLoss") => {
                format!("sr.{} * 1000 AS EconLoss", sql::ident(column))
            }
            None => format!("sr.{}", sql::ident(column)),
        };
        outer.push(selected);
    }

    let mut descriptive = vec![format!("{} AS FacilityId", sql::ident(id))];
    for column in inventory_columns
        .iter()
        .filter(|c| INVENTORY_FIELDS.iter().any(|f| c.contains(f)))
    {
        if column == "Shape" {
            descriptive.push("Shape.STAsText() AS geometry".to_string());
            outer.push("hz.geometry".to_string());
        } else if column == "Statea" {
            descriptive.push("[Statea] AS State".to_string());
            outer.push("hz.State".to_string());
        } else {
            descriptive.push(sql::ident(column));
            outer.push(format!("hz.{}", sql::ident(column)));
        }
    }

    Some(format!(
        "SELECT {outer} FROM (SELECT {inner} FROM {results} WHERE {filter}) sr \
         LEFT JOIN (SELECT {descriptive} FROM {inventory}) hz ON hz.FacilityId = sr.FacilityId",
        outer = outer.join(", "),
        inner = inner.join(", "),
        results = session.table(&format!("{prefix}{facility}")),
        descriptive = descriptive.join(", "),
        inventory = session.table(&format!("hz{facility}")),
    ))
}

async fn facility_table(
    session: &mut StoreSession,
    prefix: &str,
    facility: &str,
    filter: &str,
) -> Result<Option<Table>> {
    let result_columns = table_columns(session, &format!("{prefix}{facility}")).await?;
    if result_columns.is_empty() {
        return Ok(None);
    }
    let inventory_columns = table_columns(session, &format!("hz{facility}")).await?;

    let Some(query) = facility_query(
        session,
        prefix,
        facility,
        filter,
        &result_columns,
        &inventory_columns,
    ) else {
        tracing::debug!(facility, "No facility id column found");
        return Ok(None);
    };

    let table = session.query(&query).await?;
    Ok((!table.is_empty()).then_some(table))
}

/// Union of damaged facilities across every facility kind
///
/// A kind whose tables are missing or whose query fails is skipped.
pub async fn damaged_facilities(
    session: &mut StoreSession,
    prefix: &str,
    filter: &str,
) -> Result<ResultSet> {
    let mut tables = Vec::new();
    for facility in ESSENTIAL_FACILITIES {
        match facility_table(session, prefix, facility, filter).await {
            Ok(Some(table)) => {
                tracing::debug!(facility, rows = table.len(), "Loaded damaged facilities");
                tables.push(table);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(facility, error = %e, "Skipping facility kind");
            }
        }
    }

    if tables.is_empty() {
        tracing::info!(store = session.store_name(), "No essential facility losses");
    }

    Ok(ResultSet::with_geometry_column(
        ResultKind::DamagedFacilities,
        Table::concat(tables),
        "geometry",
    ))
}
