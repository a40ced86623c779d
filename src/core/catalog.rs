//! Loss library catalog
//!
//! Three append-only tables describe what a run produced:
//!
//! - **Event**: one row per hazard in the package
//! - **Analysis**: one row per scenario, referencing its event
//! - **Download**: one row per exported file, referencing its analysis
//!
//! Rows accumulate in memory and are written once by [`CatalogBuilder::finalize`].

use crate::config::CatalogConfig;
use crate::domain::{AnalysisId, Artifact, DownloadId, EventId, Hazard, LossportError, Result};
use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const EVENT_FILE: &str = "Event.csv";
pub const ANALYSIS_FILE: &str = "Analysis.csv";
pub const DOWNLOAD_FILE: &str = "Download.csv";

const EVENT_COLUMNS: [&str; 6] = ["id", "name", "geom", "date", "image", "updated"];

const ANALYSIS_COLUMNS: [&str; 16] = [
    "id",
    "name",
    "hazard",
    "analysisType",
    "date",
    "source",
    "modifiedInventory",
    "geographicCount",
    "geographicUnit",
    "losses",
    "lossesUnit",
    "meta",
    "updated",
    "eventId",
    "location",
    "geom",
];

const DOWNLOAD_COLUMNS: [&str; 10] = [
    "id",
    "category",
    "subcategory",
    "name",
    "icon",
    "link",
    "file",
    "meta",
    "analysisId",
    "dateUpdate",
];

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One Event row
#[derive(Debug, Clone, PartialEq)]
pub struct EventEntry {
    pub id: EventId,
    pub name: String,
    pub hazard: Hazard,
    pub updated: String,
}

impl EventEntry {
    fn record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            String::new(),
            String::new(),
            String::new(),
            self.updated.clone(),
        ]
    }
}

/// One Analysis row
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisEntry {
    pub id: AnalysisId,
    pub name: String,
    pub hazard: Hazard,
    pub event_id: EventId,
    /// Flat metadata, written as a JSON object
    pub meta: BTreeMap<String, String>,
    pub updated: String,
}

impl AnalysisEntry {
    fn record(&self, settings: &CatalogConfig) -> Result<Vec<String>> {
        Ok(vec![
            self.id.to_string(),
            self.name.clone(),
            self.hazard.to_string(),
            settings.analysis_type.clone(),
            String::new(),
            settings.source.clone(),
            settings.modified_inventory.clone(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            serde_json::to_string(&self.meta)?,
            self.updated.clone(),
            self.event_id.to_string(),
            String::new(),
            String::new(),
        ])
    }
}

/// One Download row
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadEntry {
    pub id: DownloadId,
    pub artifact: Artifact,
    pub date_update: String,
}

impl DownloadEntry {
    fn record(&self) -> Vec<String> {
        let a = &self.artifact;
        vec![
            self.id.to_string(),
            a.category.clone(),
            a.subcategory.clone(),
            a.name.clone(),
            a.icon.to_string(),
            String::new(),
            a.file.clone(),
            String::new(),
            a.analysis_id.to_string(),
            self.date_update.clone(),
        ]
    }
}

/// Paths written by [`CatalogBuilder::finalize`]
#[derive(Debug, Clone)]
pub struct CatalogFiles {
    pub events: PathBuf,
    pub analyses: PathBuf,
    pub downloads: PathBuf,
}

/// Accumulates catalog rows for one package
#[derive(Debug)]
pub struct CatalogBuilder {
    /// Event name, the backup image stem (the store name without `bk_`)
    event_name: String,
    settings: CatalogConfig,
    events: Vec<EventEntry>,
    analyses: Vec<AnalysisEntry>,
    downloads: Vec<DownloadEntry>,
}

impl CatalogBuilder {
    pub fn new(event_name: impl Into<String>, settings: CatalogConfig) -> Self {
        Self {
            event_name: event_name.into(),
            settings,
            events: Vec::new(),
            analyses: Vec::new(),
            downloads: Vec::new(),
        }
    }

    pub fn add_event(&mut self, hazard: Hazard) -> EventId {
        let id = EventId::new();
        self.events.push(EventEntry {
            id,
            name: self.event_name.clone(),
            hazard,
            updated: timestamp(),
        });
        id
    }

    pub fn add_analysis(
        &mut self,
        scenario: &str,
        hazard: Hazard,
        event_id: EventId,
        meta: BTreeMap<String, String>,
    ) -> AnalysisId {
        let id = AnalysisId::new();
        self.analyses.push(AnalysisEntry {
            id,
            name: scenario.to_string(),
            hazard,
            event_id,
            meta,
            updated: timestamp(),
        });
        id
    }

    pub fn add_download(&mut self, artifact: Artifact) -> DownloadId {
        let id = DownloadId::new();
        self.downloads.push(DownloadEntry {
            id,
            artifact,
            date_update: timestamp(),
        });
        id
    }

    pub fn events(&self) -> &[EventEntry] {
        &self.events
    }

    pub fn analyses(&self) -> &[AnalysisEntry] {
        &self.analyses
    }

    pub fn downloads(&self) -> &[DownloadEntry] {
        &self.downloads
    }

    /// Checks that every reference points at an existing row
    pub fn verify(&self) -> Result<()> {
        let events: HashSet<EventId> = self.events.iter().map(|e| e.id).collect();
        if let Some(orphan) = self.analyses.iter().find(|a| !events.contains(&a.event_id)) {
            return Err(LossportError::CatalogIntegrity(format!(
                "Analysis {} references unknown event {}",
                orphan.id, orphan.event_id
            )));
        }

        let analyses: HashSet<AnalysisId> = self.analyses.iter().map(|a| a.id).collect();
        if let Some(orphan) = self
            .downloads
            .iter()
            .find(|d| !analyses.contains(&d.artifact.analysis_id))
        {
            return Err(LossportError::CatalogIntegrity(format!(
                "Download {} references unknown analysis {}",
                orphan.id, orphan.artifact.analysis_id
            )));
        }
        Ok(())
    }

    /// Verifies the catalog and writes the three tables into `dir`
    ///
    /// Existing catalog files are replaced.
    pub fn finalize(&self, dir: &Path) -> Result<CatalogFiles> {
        self.verify()?;
        std::fs::create_dir_all(dir)?;

        let files = CatalogFiles {
            events: dir.join(EVENT_FILE),
            analyses: dir.join(ANALYSIS_FILE),
            downloads: dir.join(DOWNLOAD_FILE),
        };

        write_table(
            &files.events,
            &EVENT_COLUMNS,
            self.events.iter().map(|e| Ok(e.record())),
        )?;
        write_table(
            &files.analyses,
            &ANALYSIS_COLUMNS,
            self.analyses.iter().map(|a| a.record(&self.settings)),
        )?;
        write_table(
            &files.downloads,
            &DOWNLOAD_COLUMNS,
            self.downloads.iter().map(|d| Ok(d.record())),
        )?;

        tracing::info!(
            dir = %dir.display(),
            events = self.events.len(),
            analyses = self.analyses.len(),
            downloads = self.downloads.len(),
            "Wrote catalog"
        );
        Ok(files)
    }
}

fn write_table<I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: Iterator<Item = Result<Vec<String>>>,
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row?)?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
