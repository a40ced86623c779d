//! CSV writer: header row, no index column, geometry omitted

use super::{parent_dir, Exporter};
use crate::domain::{OutputFormat, Result, ResultSet};
use std::path::Path;
use tempfile::NamedTempFile;

pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn export(&self, set: &ResultSet, path: &Path) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(parent_dir(path)?)?;
        {
            let mut writer = ::csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(set.table.columns())?;
            for row in set.table.rows() {
                writer.write_record(row.iter().map(|v| v.to_string()))?;
            }
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| e.error)?;

        tracing::debug!(path = %path.display(), rows = set.len(), "Wrote CSV");
        Ok(())
    }
}
