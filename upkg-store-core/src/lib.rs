// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Package record types for the upkg package database.
//!
//! This crate is IO-free: it defines the values the database stores and the
//! invariants they carry, nothing more.
//!
//! **Architecture**: This is the Core Layer. `upkg-store-db` owns the hash
//! table and the on-disk format built on these types.
//!
//! # Key Modules
//!
//! - `name` - package names, the unique key of a record
//! - `text` - length-bounded metadata text
//! - `script` - maintainer script slots
//! - `record` - the package record itself
//! - `status` - human-readable record view

pub mod name;
pub mod record;
pub mod script;
pub mod status;
pub mod text;


pub use name::{InvalidNameError, MAX_NAME_LEN, PackageName};
pub use record::{PackageRecord, system_time_from_unix, system_time_to_unix, unix_time_parts};
pub use script::{Script, ScriptKind};
pub use status::StatusReport;
pub use text::{
    Architecture, BoundedText, Comment, Depends, Description, Homepage, Maintainer, Priority,
    Section, SourceUrl, TextTooLongError, Version,
};
