//! Backing store restoration
//!
//! A package region embeds a SQL Server backup (`.bk`). Restoring it walks a
//! typestate machine so each step can only run once its inputs exist:
//!
//! ```text
//! Unpacked -> Identified -> Connected -> Restored
//! ```
//!
//! Cleanup ([`drop_store`], [`delete_working_dir`]) is best-effort and never
//! fails the run.

use crate::adapters::archive::ArchiveReader;
use crate::adapters::store::{sql, StoreConnector, StoreSession};
use crate::domain::{LossportError, PackagePaths, Result, Table};
use std::path::{Path, PathBuf};

/// Prefix of every restored database name
pub const STORE_PREFIX: &str = "bk_";

/// Archive contents are on disk in the working directory
#[derive(Debug)]
pub struct Unpacked;

/// A backup image has been chosen
#[derive(Debug)]
pub struct Identified {
    image: PathBuf,
    store_name: String,
}

/// A store connection is open
#[derive(Debug)]
pub struct Connected {
    image: PathBuf,
    session: StoreSession,
}

/// The backup has been restored and the session targets it
#[derive(Debug)]
pub struct Restored {
    image: PathBuf,
    session: StoreSession,
}

/// Restores a package region's backing store, one state at a time
#[derive(Debug)]
pub struct BackingStoreRestorer<S> {
    paths: PackagePaths,
    state: S,
}

impl<S> BackingStoreRestorer<S> {
    pub fn paths(&self) -> &PackagePaths {
        &self.paths
    }
}

impl BackingStoreRestorer<Unpacked> {
    /// Extracts the archive into the working directory
    pub fn unpack(paths: PackagePaths, reader: &ArchiveReader) -> Result<Self> {
        let files = reader.extract_to(&paths.working_dir)?;
        tracing::info!(
            archive = %reader.path().display(),
            working_dir = %paths.working_dir.display(),
            files,
            "Unpacked archive"
        );
        Ok(Self::unpacked(paths))
    }

    /// Starts from a working directory that already holds the archive contents
    pub fn unpacked(paths: PackagePaths) -> Self {
        Self {
            paths,
            state: Unpacked,
        }
    }

    /// Finds the backup image in the working directory
    ///
    /// Searches recursively for `*.bk` (any case) and takes the first path in
    /// sorted order.
    pub fn identify(self) -> Result<BackingStoreRestorer<Identified>> {
        let mut images = Vec::new();
        find_images(&self.paths.working_dir, &mut images)?;
        images.sort();

        let image = match images.as_slice() {
            [] => return Err(LossportError::NoBackingImage(self.paths.working_dir.clone())),
            [only] => only.clone(),
            [first, ..] => {
                tracing::warn!(
                    count = images.len(),
                    chosen = %first.display(),
                    "Archive holds several backup images, using the first"
                );
                first.clone()
            }
        };

        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let store_name = format!("{STORE_PREFIX}{stem}");
        tracing::info!(image = %image.display(), store = %store_name, "Identified backup image");

        Ok(BackingStoreRestorer {
            paths: self.paths,
            state: Identified { image, store_name },
        })
    }
}

fn find_images(dir: &Path, images: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            find_images(&path, images)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("bk"))
        {
            images.push(path);
        }
    }
    Ok(())
}

impl BackingStoreRestorer<Identified> {
    pub fn image(&self) -> &Path {
        &self.state.image
    }

    pub fn store_name(&self) -> &str {
        &self.state.store_name
    }

    /// Connects to the first reachable endpoint, trying them in order
    pub async fn connect(
        self,
        connector: &dyn StoreConnector,
        endpoints: &[String],
    ) -> Result<BackingStoreRestorer<Connected>> {
        let mut failures = Vec::new();

        for endpoint in endpoints {
            match connector.connect(endpoint).await {
                Ok(client) => {
                    tracing::info!(endpoint = %endpoint, "Using store endpoint");
                    let Identified { image, store_name } = self.state;
                    return Ok(BackingStoreRestorer {
                        paths: self.paths,
                        state: Connected {
                            image,
                            session: StoreSession::new(client, store_name),
                        },
                    });
                }
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "Store endpoint unavailable");
                    failures.push(format!("{endpoint}: {e}"));
                }
            }
        }

        Err(LossportError::ConnectionUnavailable(if failures.is_empty() {
            "no store endpoints configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}

/// Logical file names read from a backup's file list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalFiles {
    pub data: String,
    pub log: String,
}

impl LogicalFiles {
    /// Picks the data (`D`) and log (`L`) entries from `RESTORE FILELISTONLY`
    pub fn from_file_list(table: &Table) -> Result<Self> {
        let (Some(names), Some(types)) = (
            table.column_values("LogicalName"),
            table.column_values("Type"),
        ) else {
            return Err(LossportError::RestoreFailed(
                "Backup file list lacks LogicalName or Type".to_string(),
            ));
        };

        let find = |kind: &str| {
            names
                .iter()
                .zip(&types)
                .find(|(_, t)| t.to_string().trim().eq_ignore_ascii_case(kind))
                .map(|(n, _)| n.to_string())
                .filter(|n| !n.is_empty())
        };

        match (find("D"), find("L")) {
            (Some(data), Some(log)) => Ok(Self { data, log }),
            (None, _) => Err(LossportError::RestoreFailed(
                "Backup has no data file".to_string(),
            )),
            (_, None) => Err(LossportError::RestoreFailed(
                "Backup has no log file".to_string(),
            )),
        }
    }
}

/// `RESTORE DATABASE` moving data and log files into `dir`
pub fn restore_statement(store_name: &str, image: &Path, files: &LogicalFiles, dir: &Path) -> String {
    let data_path = dir.join(format!("{}.mdf", files.data));
    let log_path = dir.join(format!("{}.ldf", files.log));
    format!(
        "RESTORE DATABASE {} FROM DISK = {} WITH MOVE {} TO {}, MOVE {} TO {}",
        sql::ident(store_name),
        sql::literal(&image.to_string_lossy()),
        sql::literal(&files.data),
        sql::literal(&data_path.to_string_lossy()),
        sql::literal(&files.log),
        sql::literal(&log_path.to_string_lossy()),
    )
}

impl BackingStoreRestorer<Connected> {
    pub fn store_name(&self) -> &str {
        self.state.session.store_name()
    }

    /// Restores the backup into `bk_<image stem>`
    ///
    /// Refuses to touch a database of that name that already exists. Waits
    /// for the server to finish the restore, bounded only by the restore
    /// timeout. A failed restore attempts to drop the partial database it
    /// left.
    pub async fn restore(self) -> Result<BackingStoreRestorer<Restored>> {
        let Connected { image, mut session } = self.state;

        if store_exists(&mut session).await? {
            return Err(LossportError::RestoreFailed(format!(
                "Database {} already exists; drop it or rename the backup image",
                session.store_name()
            )));
        }

        // The server reads and writes these paths itself
        let image_abs = std::path::absolute(&image)?;
        let dir_abs = std::path::absolute(&self.paths.working_dir)?;

        let file_list = session
            .query(&format!(
                "RESTORE FILELISTONLY FROM DISK = {}",
                sql::literal(&image_abs.to_string_lossy())
            ))
            .await
            .map_err(|e| LossportError::RestoreFailed(format!("Reading backup file list: {e}")))?;
        let files = LogicalFiles::from_file_list(&file_list)?;
        tracing::debug!(data = %files.data, log = %files.log, "Backup logical files");

        let statement = restore_statement(session.store_name(), &image_abs, &files, &dir_abs);
        tracing::info!(store = session.store_name(), "Restoring backing store");
        if let Err(e) = session.execute_long_running(&statement).await {
            drop_store(&mut session).await;
            return Err(LossportError::RestoreFailed(e.to_string()));
        }
        tracing::info!(store = session.store_name(), "Backing store restored");

        Ok(BackingStoreRestorer {
            paths: self.paths,
            state: Restored { image, session },
        })
    }
}

impl BackingStoreRestorer<Restored> {
    pub fn image(&self) -> &Path {
        &self.state.image
    }

    pub fn store_name(&self) -> &str {
        self.state.session.store_name()
    }

    /// Ends the typestate, handing back the paths and the store session
    pub fn into_parts(self) -> (PackagePaths, StoreSession) {
        (self.paths, self.state.session)
    }
}

/// Whether a database named like the session's store is already attached
async fn store_exists(session: &mut StoreSession) -> Result<bool> {
    let sql = format!(
        "SELECT DB_ID({}) AS store_id",
        sql::literal(session.store_name())
    );
    let found = session
        .query(&sql)
        .await
        .map_err(|e| LossportError::RestoreFailed(format!("Checking for existing store: {e}")))?;

    Ok(found
        .column_values("store_id")
        .is_some_and(|ids| ids.iter().any(|id| !id.is_null())))
}

/// Drops the restored database, logging any failure
pub async fn drop_store(session: &mut StoreSession) {
    let store = sql::ident(session.store_name());
    let statement = format!(
        "USE [master]; ALTER DATABASE {store} SET SINGLE_USER WITH ROLLBACK IMMEDIATE; DROP DATABASE {store}"
    );
    match session.execute(&statement).await {
        Ok(()) => tracing::info!(store = session.store_name(), "Dropped backing store"),
        Err(e) => tracing::warn!(
            store = session.store_name(),
            error = %e,
            "Failed to drop backing store"
        ),
    }
}

/// Removes the working directory, logging any failure
pub fn delete_working_dir(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_dir_all(path) {
        Ok(()) => tracing::info!(path = %path.display(), "Deleted working directory"),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Failed to delete working directory"
        ),
    }
}
