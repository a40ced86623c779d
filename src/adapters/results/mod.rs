//! Per-hazard result providers
//!
//! Each hazard stores its loss model output in its own set of tables. A
//! [`ResultProvider`] knows where to find scenarios, return periods and the
//! aggregated result sets for one hazard, so the export loop never branches
//! on hazard itself.

pub mod common;
pub mod earthquake;
pub mod facilities;
pub mod flood;
pub mod hurricane;
pub mod tsunami;

use crate::adapters::store::StoreSession;
use crate::domain::{Hazard, ProviderError, Result, ResultKind, ResultSet, Selection};
use async_trait::async_trait;
use std::collections::HashMap;

pub use earthquake::EarthquakeProvider;
pub use flood::FloodProvider;
pub use hurricane::HurricaneProvider;
pub use tsunami::TsunamiProvider;

/// Source of scenarios, return periods and result sets for one hazard
#[async_trait]
pub trait ResultProvider: Send + Sync {
    /// The hazard this provider serves
    fn hazard(&self) -> Hazard;

    /// Scenario names in store order
    async fn scenarios(&self, session: &mut StoreSession) -> Result<Vec<String>>;

    /// Raw return periods for a scenario
    ///
    /// Values are returned as stored; callers trim them and substitute `"0"`
    /// for an empty list.
    async fn return_periods(&self, session: &mut StoreSession, scenario: &str)
        -> Result<Vec<String>>;

    /// Builds one result set for a selection
    ///
    /// Returns [`ProviderError::Unsupported`] for kinds the hazard's model
    /// does not produce.
    async fn result_set(
        &self,
        session: &mut StoreSession,
        selection: &Selection,
        kind: ResultKind,
    ) -> Result<ResultSet>;
}

/// Lookup from hazard to its provider
pub struct ProviderRegistry {
    providers: HashMap<Hazard, Box<dyn ResultProvider>>,
}

impl ProviderRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry with the four Hazus providers
    pub fn hazus() -> Self {
        Self::new()
            .with_provider(Box::new(EarthquakeProvider))
            .with_provider(Box::new(FloodProvider))
            .with_provider(Box::new(HurricaneProvider))
            .with_provider(Box::new(TsunamiProvider))
    }

    /// Registers a provider, replacing any previous one for the same hazard
    pub fn with_provider(mut self, provider: Box<dyn ResultProvider>) -> Self {
        self.providers.insert(provider.hazard(), provider);
        self
    }

    pub fn get(&self, hazard: Hazard) -> Result<&dyn ResultProvider> {
        self.providers
            .get(&hazard)
            .map(|p| p.as_ref())
            .ok_or_else(|| ProviderError::MissingProvider(hazard).into())
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::hazus()
    }
}
