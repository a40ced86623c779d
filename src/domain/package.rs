//! Package region metadata and paths

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::errors::LossportError;
use super::hazard::{Hazard, ProductVersion};
use super::result::Result;

/// Metadata decoded from the archive comment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveMetadata {
    /// Leading comment field; its meaning is not documented by the producer
    pub format_version: String,
    pub product_version: ProductVersion,
    pub region_name: String,
    pub image_file_name: String,
    /// Hazards present, in flag order
    pub hazards: Vec<Hazard>,
    pub raw_comment: String,
}

impl ArchiveMetadata {
    pub fn has_hazard(&self, hazard: Hazard) -> bool {
        self.hazards.contains(&hazard)
    }
}

/// Filesystem locations derived from the archive path and output root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagePaths {
    pub source: PathBuf,
    pub output_root: PathBuf,
    /// `<output_root>/<archive stem>`
    pub package_dir: PathBuf,
    /// `<output_root>/<archive stem>_temp`
    pub working_dir: PathBuf,
}

impl PackagePaths {
    pub fn new(source: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let output_root = output_root.into();
        let stem = archive_stem(&source)?;

        Ok(Self {
            package_dir: output_root.join(&stem),
            working_dir: output_root.join(format!("{stem}_temp")),
            source,
            output_root,
        })
    }

    /// Archive file name without extension
    pub fn stem(&self) -> String {
        self.package_dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn archive_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            LossportError::Configuration(format!(
                "Archive path has no file name: {}",
                path.display()
            ))
        })
}

/// A restored package region
///
/// Assembled once the backing store is restored and immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub paths: PackagePaths,
    pub metadata: ArchiveMetadata,
    /// Name of the restored database, `bk_<image stem>`
    pub store_name: String,
    /// Stem of the backup image; names the package in the catalog
    pub image_stem: String,
}

impl Package {
    pub fn hazards(&self) -> &[Hazard] {
        &self.metadata.hazards
    }
}
