// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! A package table backed by a database root.

use std::path::PathBuf;

use tracing::info;
use upkg_store_core::PackageRecord;

use crate::db::{PackageDb, SaveSummary};
use crate::error::Result;
use crate::table::{InsertOutcome, PackageTable, Removal, TableConfig, TableStats};

/// The database of one process: the in-memory table plus the directory it
/// was loaded from and is saved back to.
///
/// Changes made with [`register`](Self::register) and
/// [`unregister`](Self::unregister) hit the disk immediately;
/// [`close`](Self::close) saves everything once more.
#[derive(Debug)]
pub struct PackageDatabase {
    table: PackageTable,
    db: PackageDb,
}

impl PackageDatabase {
    /// Create `root` if needed and load every package in it.
    pub fn open(root: impl Into<PathBuf>, config: TableConfig) -> Result<Self> {
        let db = PackageDb::new(root);
        db.create_root()?;
        let mut table = PackageTable::with_config(config)?;
        let summary = db.load_into(&mut table)?;
        info!(
            "Opened package database {} with {} packages",
            db.root().display(),
            summary.loaded
        );
        Ok(Self { table, db })
    }

    /// Add or replace `record` and write it to disk.
    ///
    /// If the write fails the table keeps the new record; it is written
    /// again by [`close`](Self::close).
    pub fn register(&mut self, record: &PackageRecord) -> Result<InsertOutcome> {
        let outcome = self.table.insert(record)?;
        self.db.save(record)?;
        Ok(outcome)
    }

    /// Delete the record of `name` from disk, then from the table.
    pub fn unregister(&mut self, name: &str) -> Result<Removal> {
        self.db.delete(name)?;
        self.table.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&PackageRecord> {
        self.table.search(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Stored names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.table.names();
        names.sort_unstable();
        names
    }

    pub fn suggestions(&self, prefix: &str) -> Vec<&str> {
        let mut names = self.table.suggestions(prefix);
        names.sort_unstable();
        names
    }

    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }

    pub fn table(&self) -> &PackageTable {
        &self.table
    }

    pub fn db(&self) -> &PackageDb {
        &self.db
    }

    /// Save every record and drop the table.
    pub fn close(self) -> SaveSummary {
        self.db.save_all(&self.table)
    }
}
