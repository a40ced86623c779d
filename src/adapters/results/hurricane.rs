//! Hurricane results

use super::common::{self, GeoKey, THOUSANDS};
use super::facilities;
use super::ResultProvider;
use crate::adapters::store::{sql, StoreSession};
use crate::domain::{Hazard, ProviderError, Result, ResultKind, ResultSet, Selection};
use async_trait::async_trait;

/// `huSummaryDamage` rows describing general occupancies
const OCCUPANCY_GROUPS: &str = "'COM', 'AGR', 'GOV', 'EDU', 'REL', 'RES', 'IND'";

/// `huSummaryDamage` rows describing general building types
const BUILDING_TYPE_GROUPS: &str = "'CONCRETE', 'MASONRY', 'STEEL', 'WOOD', 'MH'";

pub struct HurricaneProvider;

impl HurricaneProvider {
    /// Damage counts from `huSummaryDamage`, which spells its column `ReturnPeriod`
    fn summary_damage(
        session: &StoreSession,
        selection: &Selection,
        groups: &str,
        key: &str,
        alias: &str,
    ) -> String {
        format!(
            "SELECT {key} AS {alias}, SUM(ISNULL(NonDamage, 0)) AS NoDamage, \
             SUM(ISNULL(MinDamage, 0)) AS Affected, SUM(ISNULL(ModDamage, 0)) AS Minor, \
             SUM(ISNULL(SevDamage, 0)) AS Major, SUM(ISNULL(ComDamage, 0)) AS Destroyed \
             FROM {} WHERE GenBldgOrGenOcc IN ({groups}) AND ReturnPeriod = {} \
             AND huScenarioName = {} GROUP BY {key}",
            session.table("huSummaryDamage"),
            sql::literal(selection.return_period()),
            sql::literal(selection.scenario())
        )
    }

    fn summary_queries(session: &StoreSession, selection: &Selection) -> Vec<String> {
        let filter = common::hurricane_case_filter(selection);
        let shelter = session.table("huShelterResultsT");
        vec![
            format!(
                "SELECT TRACT AS tract, SUM(ISNULL(Total, 0)) * {THOUSANDS} AS EconLoss \
                 FROM {} WHERE {filter} GROUP BY Tract",
                session.table("hv_huResultsOccAllLossT")
            ),
            Self::summary_damage(session, selection, OCCUPANCY_GROUPS, "Tract", "tract"),
            format!(
                "SELECT TRACT AS tract, SUM(SHORTTERMSHELTERNEEDS) AS ShelterNeeds \
                 FROM {shelter} WHERE {filter} GROUP BY Tract"
            ),
            format!(
                "SELECT TRACT AS tract, SUM(DISPLACEDHOUSEHOLDS) AS DisplacedHouseholds \
                 FROM {shelter} WHERE {filter} GROUP BY Tract"
            ),
            // Hurricane debris is stored in tons already
            format!(
                "SELECT d.tract, d.DebrisTotal, d.DebrisBW, d.DebrisCS, d.DebrisTree, \
                 (d.DebrisTree * p.TreeCollectionFactor) AS DebrisEligibleTree FROM \
                 (SELECT Tract AS tract, SUM(BRICKANDWOOD) AS DebrisBW, SUM(CONCRETEANDSTEEL) AS DebrisCS, \
                 SUM(Tree) AS DebrisTree, SUM(BRICKANDWOOD + CONCRETEANDSTEEL + Tree) AS DebrisTotal \
                 FROM {} WHERE {filter} GROUP BY Tract) d \
                 INNER JOIN (SELECT Tract AS tract, TreeCollectionFactor FROM {}) p ON d.tract = p.tract",
                session.table("huDebrisResultsT"),
                session.table("huTreeParameters")
            ),
            format!(
                "SELECT Tract AS tract, Population, Households FROM {}",
                session.table("hzDemographicsT")
            ),
        ]
    }
}

#[async_trait]
impl ResultProvider for HurricaneProvider {
    fn hazard(&self) -> Hazard {
        Hazard::Hurricane
    }

    async fn scenarios(&self, session: &mut StoreSession) -> Result<Vec<String>> {
        let query = format!(
            "SELECT DISTINCT huScenarioName AS scenarios FROM {}",
            session.table("huSummaryLoss")
        );
        let table = session.query(&query).await?;
        Ok(common::distinct(common::text_column(&table, "scenarios")))
    }

    async fn return_periods(&self, session: &mut StoreSession, scenario: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT DISTINCT [Return_Period] AS returnPeriod FROM {} WHERE huScenarioName = {}",
            session.table("hv_huQsrEconLoss"),
            sql::literal(scenario)
        );
        let table = session.query(&query).await?;
        Ok(common::distinct(common::text_column(&table, "returnPeriod")))
    }

    async fn result_set(
        &self,
        session: &mut StoreSession,
        selection: &Selection,
        kind: ResultKind,
    ) -> Result<ResultSet> {
        match kind {
            ResultKind::Results => {
                let queries = Self::summary_queries(session, selection);
                common::summarize(session, GeoKey::Tract, &queries).await
            }
            ResultKind::BuildingDamageByOccupancy => {
                let query = Self::summary_damage(
                    session,
                    selection,
                    OCCUPANCY_GROUPS,
                    "GenBldgOrGenOcc",
                    "Occupancy",
                );
                common::tabular(session, kind, &query).await
            }
            ResultKind::BuildingDamageByType => {
                let query = Self::summary_damage(
                    session,
                    selection,
                    BUILDING_TYPE_GROUPS,
                    "GenBldgOrGenOcc",
                    "BldgType",
                );
                common::tabular(session, kind, &query).await
            }
            ResultKind::DamagedFacilities => {
                let filter = common::hurricane_case_filter(selection);
                facilities::damaged_facilities(session, "huResults", &filter).await
            }
            ResultKind::Casualties => Err(ProviderError::Unsupported {
                hazard: Hazard::Hurricane,
                kind,
            }
            .into()),
        }
    }
}
