// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Error types for package database operations.

use std::collections::TryReserveError;
use std::path::PathBuf;

use thiserror::Error;
use upkg_store_core::InvalidNameError;

use crate::codec::CodecError;

/// Result type for package database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during package database operations.
///
/// A missing package is not an error: lookups return `Option` and removal
/// reports [`crate::Removal::NotFound`].
#[derive(Error, Debug)]
pub enum Error {
    /// Record has no usable name
    #[error("Invalid package name: {0}")]
    InvalidName(#[from] InvalidNameError),

    /// Out of memory while copying a record or growing the table
    #[error("Allocation failed while {context}: {source}")]
    Allocation {
        context: String,
        #[source]
        source: TryReserveError,
    },

    /// A persisted record exists but does not parse
    #[error("Corrupt record at '{path}': {reason}")]
    CorruptData { path: PathBuf, reason: String },

    /// A record could not be written in the on-disk format
    #[error("Cannot encode record '{name}': {source}")]
    Encode {
        name: String,
        #[source]
        source: CodecError,
    },

    /// An installed path cannot be written as one line of a file list
    #[error("Package '{name}' has a path containing a newline: {path:?}")]
    UnlistablePath { name: String, path: String },

    /// Filesystem failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn allocation(context: impl Into<String>, source: TryReserveError) -> Self {
        Self::Allocation {
            context: context.into(),
            source,
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }
}

/// Helper trait for adding context to IO errors
pub trait IoContext<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::io(f(), e))
    }
}

/// Helper trait for adding context to allocation failures
pub trait AllocContext<T> {
    fn alloc_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> AllocContext<T> for std::result::Result<T, TryReserveError> {
    fn alloc_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::allocation(f(), e))
    }
}
