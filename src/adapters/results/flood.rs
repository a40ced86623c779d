//! Flood results
//!
//! Flood scenarios are study cases; every result table is filtered by study
//! case and return period and summarized per census block.

use super::common::{self, GeoKey, THOUSANDS};
use super::facilities;
use super::ResultProvider;
use crate::adapters::store::{sql, StoreSession};
use crate::domain::{Hazard, ProviderError, Result, ResultKind, ResultSet, Selection};
use async_trait::async_trait;

pub struct FloodProvider;

impl FloodProvider {
    fn losses(session: &StoreSession, selection: &Selection, table: &str, group: &str, alias: &str) -> String {
        format!(
            "SELECT {group} AS {alias}, SUM(ISNULL(TotalLoss, 0)) * {THOUSANDS} AS TotalLoss, \
             SUM(ISNULL(BuildingLoss, 0)) * {THOUSANDS} AS BldgLoss, \
             SUM(ISNULL(ContentsLoss, 0)) * {THOUSANDS} AS ContLoss \
             FROM {} WHERE {} GROUP BY {group}",
            session.table(table),
            common::flood_case_filter(session, selection)
        )
    }

    fn summary_queries(session: &StoreSession, selection: &Selection) -> Vec<String> {
        let filter = common::flood_case_filter(session, selection);
        let shelter = session.table("flFRShelter");
        vec![
            format!(
                "SELECT CensusBlock AS block, SUM(ISNULL(TotalLoss, 0)) * {THOUSANDS} AS EconLoss \
                 FROM {} WHERE {filter} GROUP BY CensusBlock",
                session.table("flFRGBSEcLossByTotal")
            ),
            Self::losses(session, selection, "flFRGBSEcLossBySOccup", "CensusBlock", "block"),
            format!(
                "SELECT CensusBlock AS block, SUM(ShortTermNeeds) AS ShelterNeeds \
                 FROM {shelter} WHERE {filter} GROUP BY CensusBlock"
            ),
            format!(
                "SELECT CensusBlock AS block, SUM(DisplacedPop) AS DisplacedHouseholds \
                 FROM {shelter} WHERE {filter} GROUP BY CensusBlock"
            ),
            format!(
                "SELECT CensusBlock AS block, SUM(FinishTons) * {THOUSANDS} AS DebrisTotal \
                 FROM {} WHERE {filter} GROUP BY CensusBlock",
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
impl ResultProvider for FloodProvider {
    fn hazard(&self) -> Hazard {
        Hazard::Flood
    }

    async fn scenarios(&self, session: &mut StoreSession) -> Result<Vec<String>> {
        let query = format!(
            "SELECT [StudyCaseName] AS scenarios FROM {}",
            session.table("flStudyCase")
        );
        let table = session.query(&query).await?;
        Ok(common::text_column(&table, "scenarios"))
    }

    async fn return_periods(&self, session: &mut StoreSession, scenario: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT DISTINCT [ReturnPeriodID] AS returnPeriod FROM {} \
             WHERE StudyCaseId = (SELECT StudyCaseID FROM {} WHERE StudyCaseName = {})",
            session.table("flFRGBSEcLossByTotal"),
            session.table("flStudyCase"),
            sql::literal(scenario)
        );
        let table = session.query(&query).await?;
        Ok(common::text_column(&table, "returnPeriod"))
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
                common::summarize(session, GeoKey::Block, &queries).await
            }
            ResultKind::BuildingDamageByOccupancy => {
                let query =
                    Self::losses(session, selection, "flFRGBSEcLossBySOccup", "SOccup", "Occupancy");
                common::tabular(session, kind, &query).await
            }
            ResultKind::BuildingDamageByType => {
                let query =
                    Self::losses(session, selection, "flFRGBSEcLossByGBldgType", "BldgType", "BldgType");
                common::tabular(session, kind, &query).await
            }
            ResultKind::DamagedFacilities => {
                let filter = common::flood_case_filter(session, selection);
                facilities::damaged_facilities(session, "flFR", &filter).await
            }
            ResultKind::Casualties => Err(ProviderError::Unsupported {
                hazard: Hazard::Flood,
                kind,
            }
            .into()),
        }
    }
}
