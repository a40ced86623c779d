//! Package region archive reader
//!
//! A package region (`.hpr`) is a zip file whose archive comment carries the
//! producing release and the hazards analyzed:
//!
//! ```text
//! version|productCode|regionName|imageFileName|eqFlag|flFlag|huFlag[|tsFlag]
//! ```
//!
//! Archives written before tsunami support have seven fields.

use crate::domain::{ArchiveMetadata, Hazard, LossportError, ProductVersion, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Index of the first hazard flag in the comment
const FIRST_FLAG: usize = 4;

/// Reads metadata from and unpacks a package region archive
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    path: PathBuf,
}

impl ArchiveReader {
    /// Creates a reader for an existing archive file
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(LossportError::ArchiveFormat(format!(
                "Archive not found: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the archive comment
    pub fn metadata(&self) -> Result<ArchiveMetadata> {
        let archive = self.zip()?;
        let comment = std::str::from_utf8(archive.comment()).map_err(|e| {
            LossportError::ArchiveFormat(format!(
                "Archive comment of {} is not UTF-8: {}",
                self.path.display(),
                e
            ))
        })?;
        decode_comment(comment)
    }

    /// Unpacks every entry under `target_dir`, returning the number of files written
    ///
    /// Entries whose names escape `target_dir` are rejected.
    pub fn extract_to(&self, target_dir: &Path) -> Result<usize> {
        let mut archive = self.zip()?;
        fs::create_dir_all(target_dir)?;

        let mut files = 0;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| {
                LossportError::ArchiveFormat(format!("Failed to read archive entry {i}: {e}"))
            })?;
            let entry_path = match entry.enclosed_name() {
                Some(path) => target_dir.join(path),
                None => {
                    return Err(LossportError::ArchiveFormat(format!(
                        "Archive entry '{}' escapes the working directory",
                        entry.name()
                    )));
                }
            };

            if entry.is_dir() {
                fs::create_dir_all(&entry_path)?;
                continue;
            }

            if let Some(parent) = entry_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&entry_path)?;
            io::copy(&mut entry, &mut outfile)?;
            files += 1;
        }

        tracing::debug!(
            archive = %self.path.display(),
            target = %target_dir.display(),
            files,
            "Archive extracted"
        );
        Ok(files)
    }

    fn zip(&self) -> Result<ZipArchive<fs::File>> {
        let file = fs::File::open(&self.path).map_err(|e| {
            LossportError::ArchiveFormat(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        ZipArchive::new(file).map_err(|e| {
            LossportError::ArchiveFormat(format!(
                "{} is not a zip archive: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Decodes a pipe-delimited archive comment
///
/// # Errors
///
/// Returns [`LossportError::ArchiveFormat`] when the comment has neither 7 nor
/// 8 fields, or a hazard flag is not an integer.
///
/// # Examples
///
/// ```
/// use lossport::adapters::archive::decode_comment;
/// use lossport::domain::Hazard;
///
/// let meta = decode_comment("31ed16|202020|FIMJacksonMO|FIMJacksonMO.bk|0|1|0|0").unwrap();
/// assert_eq!(meta.hazards, vec![Hazard::Flood]);
/// assert_eq!(meta.product_version.label(), "Hazus 4.2.3");
/// ```
pub fn decode_comment(comment: &str) -> Result<ArchiveMetadata> {
    let fields: Vec<&str> = comment.split('|').collect();

    let flag_count = match fields.len() {
        8 => 4,
        7 => 3,
        n => {
            return Err(LossportError::ArchiveFormat(format!(
                "Expected 7 or 8 '|'-separated comment fields, found {n}: '{comment}'"
            )));
        }
    };

    let mut hazards = Vec::new();
    for (offset, hazard) in Hazard::ALL.iter().take(flag_count).enumerate() {
        let raw = fields[FIRST_FLAG + offset].trim();
        let flag: i64 = raw.parse().map_err(|_| {
            LossportError::ArchiveFormat(format!("Hazard flag for {hazard} is not an integer: '{raw}'"))
        })?;
        if flag != 0 {
            hazards.push(*hazard);
        }
    }

    let product_version = ProductVersion::lookup(fields[1]);
    if !product_version.is_known() {
        tracing::warn!(
            code = %product_version.code(),
            "Product code not in release table"
        );
    }

    Ok(ArchiveMetadata {
        format_version: fields[0].trim().to_string(),
        product_version,
        region_name: fields[2].trim().to_string(),
        image_file_name: fields[3].trim().to_string(),
        hazards,
        raw_comment: comment.to_string(),
    })
}
