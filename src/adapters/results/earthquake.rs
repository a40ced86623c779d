//! Earthquake results
//!
//! Earthquake regions hold a single scenario; result tables are not keyed by
//! scenario or return period and are summarized per census tract.

use super::common::{self, GeoKey, THOUSANDS};
use super::facilities;
use super::ResultProvider;
use crate::adapters::store::StoreSession;
use crate::domain::{Hazard, Result, ResultKind, ResultSet, Selection};
use async_trait::async_trait;

pub struct EarthquakeProvider;

impl EarthquakeProvider {
    fn economic_loss(session: &StoreSession) -> String {
        format!(
            "SELECT Tract AS tract, SUM(ISNULL(TotalLoss, 0)) * {THOUSANDS} AS EconLoss \
             FROM {} GROUP BY Tract",
            session.table("eqTractEconLoss")
        )
    }

    fn building_damage(session: &StoreSession, group: &str, alias: &str) -> String {
        format!(
            "SELECT {group} AS {alias}, SUM(ISNULL(PDsNoneBC, 0)) AS NoDamage, \
             SUM(ISNULL(PDsSlightBC, 0)) AS Affected, SUM(ISNULL(PDsModerateBC, 0)) AS Minor, \
             SUM(ISNULL(PDsExtensiveBC, 0)) AS Major, SUM(ISNULL(PDsCompleteBC, 0)) AS Destroyed \
             FROM {} WHERE DmgMechType = 'STR' GROUP BY {group}",
            session.table("eqTractDmg")
        )
    }

    fn fatalities(session: &StoreSession) -> String {
        format!(
            "SELECT Tract AS tract, \
             SUM(CASE WHEN CasTime = 'N' THEN Level4Injury ELSE 0 END) AS Fatalities_Night, \
             SUM(CASE WHEN CasTime = 'D' THEN Level4Injury ELSE 0 END) AS Fatalities_Day \
             FROM {} WHERE CasTime IN ('N', 'D') AND InOutTot = 'Tot' GROUP BY Tract",
            session.table("eqTractCasOccup")
        )
    }

    fn injuries(session: &StoreSession) -> String {
        let mut sums = Vec::new();
        for (time, label) in [("N", "Night"), ("D", "Day")] {
            for level in 1..=3 {
                sums.push(format!(
                    "SUM(CASE WHEN CasTime = '{time}' THEN Level{level}Injury ELSE 0 END) \
                     AS Injury_{label}Level{level}"
                ));
            }
        }
        format!(
            "SELECT Tract AS tract, {} FROM {} WHERE CasTime IN ('N', 'D') AND InOutTot = 'Tot' \
             GROUP BY Tract",
            sums.join(", "),
            session.table("eqTractCasOccup")
        )
    }

    fn summary_queries(session: &StoreSession) -> Vec<String> {
        let tract = session.table("eqTract");
        vec![
            Self::economic_loss(session),
            Self::building_damage(session, "Tract", "tract"),
            Self::fatalities(session),
            Self::injuries(session),
            format!(
                "SELECT Tract AS tract, SUM(ShortTermShelter) AS ShelterNeeds FROM {tract} GROUP BY Tract"
            ),
            format!(
                "SELECT Tract AS tract, SUM(DisplacedHouseholds) AS DisplacedHouseholds \
                 FROM {tract} GROUP BY Tract"
            ),
            format!(
                "SELECT Tract AS tract, SUM(DebrisW) * {THOUSANDS} AS DebrisBW, \
                 SUM(DebrisS) * {THOUSANDS} AS DebrisCS, SUM(DebrisTotal) * {THOUSANDS} AS DebrisTotal \
                 FROM {tract} GROUP BY Tract"
            ),
            format!(
                "SELECT Tract AS tract, Population, Households FROM {}",
                session.table("hzDemographicsT")
            ),
        ]
    }
}

#[async_trait]
impl ResultProvider for EarthquakeProvider {
    fn hazard(&self) -> Hazard {
        Hazard::Earthquake
    }

    async fn scenarios(&self, session: &mut StoreSession) -> Result<Vec<String>> {
        let query = format!(
            "SELECT [eqScenarioname] AS scenarios FROM {}",
            session.table("RgnExpeqScenario")
        );
        let table = session.query(&query).await?;
        Ok(common::text_column(&table, "scenarios"))
    }

    async fn return_periods(
        &self,
        session: &mut StoreSession,
        _scenario: &str,
    ) -> Result<Vec<String>> {
        let query = format!(
            "SELECT [ReturnPeriod] AS returnPeriod FROM {}",
            session.table("RgnExpeqScenario")
        );
        let table = session.query(&query).await?;
        Ok(common::text_column(&table, "returnPeriod"))
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
                common::summarize(session, GeoKey::Tract, &queries).await
            }
            ResultKind::BuildingDamageByOccupancy => {
                let query = Self::building_damage(session, "Occupancy", "Occupancy");
                common::tabular(session, kind, &query).await
            }
            ResultKind::BuildingDamageByType => {
                let query = Self::building_damage(session, "eqBldgType", "BldgType");
                common::tabular(session, kind, &query).await
            }
            ResultKind::DamagedFacilities => {
                facilities::damaged_facilities(session, "eq", "EconLoss > 0").await
            }
            ResultKind::Casualties => {
                let fatalities = Self::fatalities(session);
                let injuries = Self::injuries(session);
                common::casualties(session, GeoKey::Tract, fatalities, injuries).await
            }
        }
    }
}
