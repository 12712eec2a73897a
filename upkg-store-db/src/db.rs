// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! One-file-per-package persistence under a database root.
//!
//! Layout: `<root>/<package name>/pkginfo.dat`. Backup and inspection
//! tooling relies on this shape.

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};
use upkg_store_core::{PackageRecord, name};

use crate::codec::{self, CodecError};
use crate::error::{Error, IoContext, Result};
use crate::table::PackageTable;

/// Name of the record file inside each package directory.
pub const RECORD_FILE_NAME: &str = "pkginfo.dat";

/// Outcome of a batch load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

/// Outcome of a batch save.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaveSummary {
    pub saved: usize,
    pub failed: usize,
}

/// Handle on a database root directory.
#[derive(Debug, Clone)]
pub struct PackageDb {
    root: PathBuf,
}

impl PackageDb {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory and its parents if missing.
    pub fn create_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).io_context(|| {
            format!(
                "Failed to create database root {}",
                self.root.display()
            )
        })
    }

    /// Directory holding the record of `name`. The name is not validated.
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn record_path(&self, name: &str) -> PathBuf {
        self.package_dir(name).join(RECORD_FILE_NAME)
    }

    /// Persist `record`, replacing any previous version.
    ///
    /// The new file is fully written and synced before it is renamed over
    /// the old one, so a failure leaves the previous record intact.
    pub fn save(&self, record: &PackageRecord) -> Result<()> {
        record.validate_name()?;
        let name = record.name();

        let bytes = codec::encode_record_to_vec(record).map_err(|source| Error::Encode {
            name: name.to_owned(),
            source,
        })?;

        let dir = self.package_dir(name);
        fs::create_dir_all(&dir)
            .io_context(|| format!("Failed to create package directory {}", dir.display()))?;
        write_atomic(&dir, &self.record_path(name), &bytes)?;

        debug!("Saved package '{name}' ({} bytes)", bytes.len());
        Ok(())
    }

    /// Read the record of `name`. A package without a record file is
    /// `Ok(None)`.
    pub fn load(&self, name: &str) -> Result<Option<PackageRecord>> {
        name::validate(name)?;
        let path = self.record_path(name);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::io(
                    format!("Failed to open {}", path.display()),
                    e,
                ));
            }
        };

        let record = codec::decode_record(&mut BufReader::new(file))
            .map_err(|e| decode_error(&path, e))?;
        if record.name() != name {
            return Err(Error::corrupt(
                &path,
                format!("record belongs to '{}'", record.name()),
            ));
        }
        Ok(Some(record))
    }

    /// Remove the record of `name` and its directory if that is left
    /// empty. Returns whether a record file existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        name::validate(name)?;
        let path = self.record_path(name);

        let existed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(Error::io(
                    format!("Failed to remove {}", path.display()),
                    e,
                ));
            }
        };

        let dir = self.package_dir(name);
        match fs::remove_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!("Keeping package directory {}: {e}", dir.display()),
        }

        if existed {
            debug!("Deleted record of package '{name}'");
        }
        Ok(existed)
    }

    /// Load every persisted package into a new table with the default
    /// sizing policy.
    pub fn load_all(&self) -> Result<PackageTable> {
        let mut table = PackageTable::new()?;
        self.load_into(&mut table)?;
        Ok(table)
    }

    /// Load every persisted package into `table`.
    ///
    /// Packages that fail to load are logged and skipped. Only a root that
    /// exists but can't be listed is an error.
    pub fn load_into(&self, table: &mut PackageTable) -> Result<LoadSummary> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(
                    "Database root {} does not exist, nothing to load",
                    self.root.display()
                );
                return Ok(LoadSummary::default());
            }
            Err(e) => {
                return Err(Error::io(
                    format!("Failed to read database root {}", self.root.display()),
                    e,
                ));
            }
        };

        let mut summary = LoadSummary::default();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read entry of {}: {e}", self.root.display());
                    summary.skipped += 1;
                    continue;
                }
            };
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                warn!("Skipping non UTF-8 directory {}", entry.path().display());
                summary.skipped += 1;
                continue;
            };
            if let Err(e) = name::validate(&name) {
                warn!("Skipping directory {}: {e}", entry.path().display());
                summary.skipped += 1;
                continue;
            }

            match self.load(&name) {
                Ok(Some(record)) => match table.insert(&record) {
                    Ok(_) => summary.loaded += 1,
                    Err(e) => {
                        error!("Failed to add package '{name}' to table: {e}");
                        summary.skipped += 1;
                    }
                },
                Ok(None) => debug!("No record in {}, ignoring", entry.path().display()),
                Err(e) => {
                    error!("Skipping package '{name}': {e}");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            "Loaded {} packages from {} ({} skipped)",
            summary.loaded,
            self.root.display(),
            summary.skipped
        );
        Ok(summary)
    }

    /// Save every record in `table`. Failures are logged and counted.
    pub fn save_all(&self, table: &PackageTable) -> SaveSummary {
        let mut summary = SaveSummary::default();
        for record in table {
            match self.save(record) {
                Ok(()) => summary.saved += 1,
                Err(e) => {
                    warn!("Failed to save package '{}': {e}", record.name());
                    summary.failed += 1;
                }
            }
        }
        info!(
            "Saved {} packages to {} ({} failed)",
            summary.saved,
            self.root.display(),
            summary.failed
        );
        summary
    }
}

/// Check that every installed path of `record` fits on one line.
pub fn ensure_listable(record: &PackageRecord) -> Result<()> {
    match record.file_list.iter().find(|file| file.contains('\n')) {
        Some(file) => Err(Error::UnlistablePath {
            name: record.name().to_owned(),
            path: file.clone(),
        }),
        None => Ok(()),
    }
}

/// Write the file list of `record` to `path`, one path per line.
///
/// An empty list writes nothing. A list with a path that contains a newline
/// is rejected before anything is written.
pub fn export_file_list(record: &PackageRecord, path: &Path) -> Result<()> {
    ensure_listable(record)?;
    if !record.has_files() {
        warn!(
            "Package '{}' has no files, not writing {}",
            record.name(),
            path.display()
        );
        return Ok(());
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .io_context(|| format!("Failed to create directory {}", dir.display()))?;

    let mut contents = String::new();
    for file in &record.file_list {
        contents.push_str(file);
        contents.push('\n');
    }
    write_atomic(dir, path, contents.as_bytes())?;

    debug!(
        "Wrote {} paths of '{}' to {}",
        record.file_count(),
        record.name(),
        path.display()
    );
    Ok(())
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)
        .io_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .io_context(|| format!("Failed to write {}", tmp.path().display()))?;
    tmp.as_file()
        .sync_all()
        .io_context(|| format!("Failed to sync {}", tmp.path().display()))?;
    tmp.persist(path)
        .map_err(|e| Error::io(format!("Failed to persist {}", path.display()), e.error))?;
    Ok(())
}

fn decode_error(path: &Path, err: CodecError) -> Error {
    match err {
        CodecError::Io { context, source } if source.kind() != io::ErrorKind::UnexpectedEof => {
            Error::io(format!("{context} from {}", path.display()), source)
        }
        CodecError::Allocation(source) => {
            Error::allocation(format!("decoding {}", path.display()), source)
        }
        other => Error::corrupt(path, other.to_string()),
    }
}
