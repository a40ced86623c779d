//! Hazard × scenario × return period enumeration

use crate::adapters::results::ProviderRegistry;
use crate::adapters::store::StoreSession;
use crate::config::ExportConfig;
use crate::core::export::summary::{RunFailure, RunFailureKind, RunSummary};
use crate::domain::Hazard;
use serde::Serialize;

/// Return period used when a scenario reports none
pub const DEFAULT_RETURN_PERIOD: &str = "0";

/// One scenario and its trimmed return periods
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioCombinations {
    pub name: String,
    pub return_periods: Vec<String>,
}

/// The scenarios found for one hazard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HazardCombinations {
    pub hazard: Hazard,
    pub scenarios: Vec<ScenarioCombinations>,
}

impl HazardCombinations {
    /// Number of (scenario, return period) pairs
    pub fn combination_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.return_periods.len()).sum()
    }
}

/// Trims return periods, substituting `"0"` for an empty list
pub fn normalize_return_periods(raw: Vec<String>) -> Vec<String> {
    let trimmed: Vec<String> = raw.into_iter().map(|rp| rp.trim().to_string()).collect();
    if trimmed.is_empty() {
        vec![DEFAULT_RETURN_PERIOD.to_string()]
    } else {
        trimmed
    }
}

/// Lists every combination present in the store
///
/// A hazard whose scenarios cannot be listed, or a scenario whose return
/// periods cannot be listed, is recorded in `summary` and skipped.
pub async fn enumerate(
    session: &mut StoreSession,
    registry: &ProviderRegistry,
    hazards: &[Hazard],
    filter: &ExportConfig,
    summary: &mut RunSummary,
) -> Vec<HazardCombinations> {
    let mut combinations = Vec::new();

    for &hazard in hazards {
        if !filter.includes_hazard(hazard) {
            tracing::info!(hazard = %hazard, "Hazard excluded by configuration");
            continue;
        }

        let provider = match registry.get(hazard) {
            Ok(provider) => provider,
            Err(e) => {
                tracing::error!(hazard = %hazard, error = %e, "No provider for hazard");
                summary.add_failure(
                    RunFailure::new(RunFailureKind::Enumeration, e.to_string())
                        .with_context(format!("hazard={hazard}")),
                );
                continue;
            }
        };

        let scenario_names = match provider.scenarios(session).await {
            Ok(names) => names,
            Err(e) => {
                tracing::error!(hazard = %hazard, error = %e, "Failed to list scenarios");
                summary.add_failure(
                    RunFailure::new(
                        RunFailureKind::Enumeration,
                        format!("Failed to list scenarios: {e}"),
                    )
                    .with_context(format!("hazard={hazard}")),
                );
                continue;
            }
        };

        let mut scenarios = Vec::new();
        for name in scenario_names {
            if !filter.includes_scenario(&name) {
                tracing::debug!(hazard = %hazard, scenario = %name, "Scenario excluded by configuration");
                continue;
            }

            match provider.return_periods(session, &name).await {
                Ok(raw) => scenarios.push(ScenarioCombinations {
                    return_periods: normalize_return_periods(raw),
                    name,
                }),
                Err(e) => {
                    tracing::error!(
                        hazard = %hazard,
                        scenario = %name,
                        error = %e,
                        "Failed to list return periods"
                    );
                    summary.add_failure(
                        RunFailure::new(
                            RunFailureKind::Enumeration,
                            format!("Failed to list return periods: {e}"),
                        )
                        .with_context(format!("hazard={hazard}, scenario={name}")),
                    );
                }
            }
        }

        let found = HazardCombinations { hazard, scenarios };
        tracing::info!(
            hazard = %hazard,
            scenarios = found.scenarios.len(),
            combinations = found.combination_count(),
            "Enumerated hazard"
        );
        combinations.push(found);
    }

    combinations
}
