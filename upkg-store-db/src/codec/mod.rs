// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Binary encoding of package records.
//!
//! Every field is written explicitly, length-prefixed where variable, so the
//! format does not depend on the in-memory layout of [`PackageRecord`].
//!
//! [`PackageRecord`]: upkg_store_core::PackageRecord

mod record;
pub mod wire;

use std::collections::TryReserveError;

use thiserror::Error;
use upkg_store_core::InvalidNameError;

pub use record::{FORMAT_VERSION, MAGIC, decode_record, encode_record, encode_record_to_vec};

/// Errors raised while encoding or decoding a record.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} is {length} bytes long, at most {max} allowed")]
    TooLong {
        what: &'static str,
        length: u64,
        max: u64,
    },

    #[error("{what} is not valid UTF-8")]
    InvalidUtf8 {
        what: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("invalid presence tag {0}")]
    BadTag(u64),

    #[error("not a package record (bad magic)")]
    BadMagic,

    #[error("unsupported record format version {0}")]
    UnsupportedVersion(u64),

    #[error("install time {secs}s + {nanos}ns is out of range")]
    InvalidTime { secs: i64, nanos: u64 },

    #[error("trailing data after record")]
    TrailingData,

    #[error("invalid package name: {0}")]
    InvalidName(#[from] InvalidNameError),

    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}

impl CodecError {
    /// True when the input ended before the record did.
    pub fn is_truncated(&self) -> bool {
        matches!(self, CodecError::Io { source, .. } if source.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
