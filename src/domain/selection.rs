//! The (hazard, scenario, return period) triple passed to providers

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::hazard::Hazard;

/// One combination to export
///
/// Built once per combination and passed by reference; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Selection {
    hazard: Hazard,
    scenario: String,
    return_period: String,
}

impl Selection {
    /// Creates a selection; the return period is stored trimmed
    pub fn new(hazard: Hazard, scenario: impl Into<String>, return_period: impl AsRef<str>) -> Self {
        Self {
            hazard,
            scenario: scenario.into(),
            return_period: return_period.as_ref().trim().to_string(),
        }
    }

    pub fn hazard(&self) -> Hazard {
        self.hazard
    }

    /// Scenario name exactly as the store reports it
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn return_period(&self) -> &str {
        &self.return_period
    }

    /// `<package_dir>/<hazard>/<scenario>/<label>_<return period>`
    ///
    /// Scenario and return period come from the restored store, so each is
    /// reduced to a single path segment that stays below `package_dir`.
    pub fn export_dir(&self, package_dir: &Path, label: &str) -> PathBuf {
        package_dir
            .join(self.hazard.as_str())
            .join(path_segment(&self.scenario))
            .join(path_segment(&format!("{}_{}", label, self.return_period)))
    }
}

/// Maps a store-supplied name to one directory name
///
/// Separators, drive colons and control characters become `_`; names that
/// are empty or made only of dots become `_` as well.
pub fn path_segment(name: &str) -> String {
    let segment: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if segment.is_empty() || segment.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        segment
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.hazard, self.scenario, self.return_period)
    }
}
