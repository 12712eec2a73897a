// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! In-memory package table and on-disk package database.
//!
//! This crate owns every stored [`PackageRecord`]: a chained hash table for
//! lookups, and a directory of binary record files that the table is loaded
//! from and saved back to.
//!
//! **Architecture**: This is the Database Layer. Record types live in
//! `upkg-store-core`; the `upkg` binary drives a [`PackageDatabase`].
//!
//! # Key Features
//!
//! - FNV-1a hashed, prime-sized table that grows and shrinks with its load
//! - Copy-in semantics: the table never borrows caller records
//! - Explicit, versioned binary record format
//! - Atomic record writes (temp file, fsync, rename)
//! - Batch load and save that skip broken packages instead of failing
//!
//! # Example
//!
//! ```ignore
//! use upkg_store_db::{PackageDatabase, TableConfig};
//!
//! let mut db = PackageDatabase::open("/var/lib/upkg/db", TableConfig::default())?;
//! if let Some(record) = db.get("nano") {
//!     println!("{}", upkg_store_core::StatusReport(record));
//! }
//! db.close();
//! ```
//!
//! [`PackageRecord`]: upkg_store_core::PackageRecord

pub mod codec;
mod db;
mod error;
pub mod hash;
mod session;
mod table;

pub use db::{LoadSummary, PackageDb, RECORD_FILE_NAME, SaveSummary, ensure_listable, export_file_list};
pub use error::{AllocContext, Error, IoContext, Result};
pub use session::PackageDatabase;
pub use table::{
    InsertOutcome, Iter, MAX_SUGGESTIONS, PackageTable, Removal, TableConfig, TableStats,
};
