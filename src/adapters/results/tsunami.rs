//! Tsunami results
//!
//! Tsunami regions carry no return periods; every scenario reports a single
//! `"0"` period. Building damage is derived per structure from the loss ratio
//! `BldgLoss / (ValStruct + ValCont)`.

use super::common::{self, GeoKey, THOUSANDS};
use super::facilities;
use super::ResultProvider;
use crate::adapters::store::StoreSession;
use crate::domain::{Hazard, Result, ResultKind, ResultSet, Selection};
use async_trait::async_trait;

/// Loss-ratio buckets shared by every damage query
const DAMAGE_BUCKETS: [(&str, &str); 4] = [
    ("Affected", "<= 0.05"),
    ("Minor", "> 0.05 AND {r} <= 0.3"),
    ("Major", "> 0.3 AND {r} <= 0.5"),
    ("Destroyed", "> 0.5"),
];

/// Casualty tables by day/night and building quality
const CASUALTY_TABLES: [(&str, &str, &str); 6] = [
    ("cdf", "tsCasualtyDayFair", "DayFair"),
    ("cdg", "tsCasualtyDayGood", "DayGood"),
    ("cdp", "tsCasualtyDayPoor", "DayPoor"),
    ("cnf", "tsCasualtyNightFair", "NightFair"),
    ("cng", "tsCasualtyNightGood", "NightGood"),
    ("cnp", "tsCasualtyNightPoor", "NightPoor"),
];

pub struct TsunamiProvider;

impl TsunamiProvider {
    /// `COUNT(CASE ...)` per damage bucket over structures with value
    fn damage_counts(ratio: &str) -> String {
        DAMAGE_BUCKETS
            .iter()
            .map(|(name, bounds)| {
                format!(
                    "COUNT(CASE WHEN haz.ValStruct > 0 AND haz.ValCont > 0 AND {ratio} {} \
                     THEN 1 ELSE NULL END) AS {name}",
                    bounds.replace("{r}", ratio)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn building_damage(session: &StoreSession) -> String {
        let ratio = "frn.BldgLoss / NULLIF(haz.ValStruct + haz.ValCont, 0)";
        let buckets = DAMAGE_BUCKETS
            .iter()
            .map(|(name, bounds)| {
                format!(
                    "ISNULL(COUNT(CASE WHEN {ratio} {} THEN 1 END), 0) AS {name}",
                    bounds.replace("{r}", ratio)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT gbs.CBFips AS block, {buckets} \
             FROM (SELECT NsiID, ValStruct, ValCont FROM {}) haz \
             LEFT JOIN (SELECT NsiID, CBFips FROM {}) gbs ON haz.NsiID = gbs.NsiID \
             LEFT JOIN (SELECT NsiID, BldgLoss FROM {}) frn ON haz.NsiID = frn.NsiID \
             GROUP BY gbs.CBFips",
            session.table("tsHazNsiGbs"),
            session.table("tsNsiGbs"),
            session.table("tsFRNsiGbs")
        )
    }

    fn damage_by_occupancy(session: &StoreSession) -> String {
        let ratio = "frn.BldgLoss / (haz.ValStruct + haz.ValCont)";
        format!(
            "SELECT LEFT(haz.NsiID, 3) AS Occupancy, COUNT(haz.NsiID) AS Total, {} \
             FROM {} haz FULL JOIN {} gbs ON haz.NsiID = gbs.NsiID \
             FULL JOIN {} frn ON gbs.NsiID = frn.NsiID \
             WHERE haz.NsiID IS NOT NULL GROUP BY LEFT(haz.NsiID, 3)",
            Self::damage_counts(ratio),
            session.table("tsHazNsiGbs"),
            session.table("tsNsiGbs"),
            session.table("tsFRNsiGbs")
        )
    }

    fn damage_by_type(session: &StoreSession) -> String {
        let ratio = "frn.BldgLoss / (haz.ValStruct + haz.ValCont)";
        format!(
            "SELECT bt.eqBldgType AS BldgType, bt.[Description], COUNT(haz.NsiID) AS Structures, {} \
             FROM {} haz FULL JOIN {} bt ON haz.EqBldgTypeID = bt.DisplayOrder \
             FULL JOIN {} frn ON haz.NsiID = frn.NsiID \
             WHERE haz.EqBldgTypeID IS NOT NULL GROUP BY bt.eqBldgType, bt.[Description]",
            Self::damage_counts(ratio),
            session.table("tsHazNsiGbs"),
            session.table("eqclBldgType"),
            session.table("tsFRNsiGbs")
        )
    }

    /// Sums one casualty column across the six casualty tables
    fn casualty_query(session: &StoreSession, day: &str, night: &str, label: &str) -> String {
        let sums = CASUALTY_TABLES
            .iter()
            .map(|(alias, _, suffix)| {
                let column = if suffix.starts_with("Day") { day } else { night };
                format!("SUM({alias}.{column}) AS {label}_{suffix}")
            })
            .collect::<Vec<_>>()
            .join(", ");

        let (first_alias, first_table, _) = CASUALTY_TABLES[0];
        let joins = CASUALTY_TABLES[1..]
            .iter()
            .map(|(alias, table, _)| {
                format!(
                    "FULL JOIN {} AS {alias} ON {first_alias}.CensusBlock = {alias}.CensusBlock",
                    session.table(table)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "SELECT {first_alias}.CensusBlock AS block, {sums} FROM {} AS {first_alias} {joins} \
             GROUP BY {first_alias}.CensusBlock",
            session.table(first_table)
        )
    }

    fn fatalities(session: &StoreSession) -> String {
        Self::casualty_query(session, "FatalityDayTotal", "FatalityNightTotal", "Fatalities")
    }

    fn injuries(session: &StoreSession) -> String {
        Self::casualty_query(session, "InjuryDayTotal", "InjuryNightTotal", "Injuries")
    }

    fn summary_queries(session: &StoreSession) -> Vec<String> {
        vec![
            format!(
                "SELECT CensusBlock AS block, SUM(ISNULL(TotalLoss, 0)) * {THOUSANDS} AS EconLoss \
                 FROM {} GROUP BY CensusBlock",
                session.table("tsuvResDelKTotB")
            ),
            Self::building_damage(session),
            Self::fatalities(session),
            Self::injuries(session),
            format!(
                "SELECT CensusBlock AS block, SUM(FinishTons) * {THOUSANDS} AS DebrisTotal \
                 FROM {} GROUP BY CensusBlock",
                session.table("flFRDebris")
            ),
            format!(
                "SELECT CensusBlock AS block, Population, Households FROM {}",
                session.table("hzDemographicsB")
            ),
        ]
    }
}

#[async_trait]
impl ResultProvider for TsunamiProvider {
    fn hazard(&self) -> Hazard {
        Hazard::Tsunami
    }

    async fn scenarios(&self, session: &mut StoreSession) -> Result<Vec<String>> {
        let query = format!(
            "SELECT [ScenarioName] AS scenarios FROM {}",
            session.table("tsScenario")
        );
        let table = session.query(&query).await?;
        Ok(common::text_column(&table, "scenarios"))
    }

    async fn return_periods(&self, session: &mut StoreSession, _scenario: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT '0' AS returnPeriod FROM {}",
            session.table("tsScenario")
        );
        let table = session.query(&query).await?;
        Ok(common::distinct(common::text_column(&table, "returnPeriod")))
    }

    async fn result_set(
        &self,
        session: &mut StoreSession,
        _selection: &Selection,
        kind: ResultKind,
    ) -> Result<ResultSet> {
        match kind {
            ResultKind::Results => {
                let queries = Self::summary_queries(session);
                common::summarize(session, GeoKey::Block, &queries).await
            }
            ResultKind::BuildingDamageByOccupancy => {
                let query = Self::damage_by_occupancy(session);
                common::tabular(session, kind, &query).await
            }
            ResultKind::BuildingDamageByType => {
                let query = Self::damage_by_type(session);
                common::tabular(session, kind, &query).await
            }
            ResultKind::DamagedFacilities => {
                facilities::damaged_facilities(session, "ts", "EconLoss > 0").await
            }
            ResultKind::Casualties => {
                let fatalities = Self::fatalities(session);
                let injuries = Self::injuries(session);
                common::casualties(session, GeoKey::Block, fatalities, injuries).await
            }
        }
    }
}
