// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Test utilities for upkg.
//!
//! This crate provides proptest strategies and macros for testing upkg crates.

use std::path::{Path, PathBuf};

use proptest::prelude::*;
use tempfile::TempDir;

/// A wrapper around TempDir that provides a canonicalized path.
/// This resolves symlinks like /var -> /private/var on macOS, so paths
/// reported back by the database compare equal to the ones handed in.
pub struct CanonicalTempDir {
    _inner: TempDir,
    path: PathBuf,
}

impl CanonicalTempDir {
    /// Create a new temporary directory with a canonicalized path.
    pub fn new() -> std::io::Result<Self> {
        let inner = TempDir::new()?;
        let path = inner.path().canonicalize()?;
        Ok(Self {
            _inner: inner,
            path,
        })
    }

    /// Get the canonicalized path to the temporary directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of `relative` inside the directory.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }
}

pub fn arb_filename() -> impl Strategy<Value = String> {
    "[a-zA-Z 0-9._+=-]+".prop_filter("Not cur and parent dir", |s| s != "." && s != "..")
}

prop_compose! {
    /// Relative, `/`-separated path of one to four components.
    pub fn arb_relative_path()(parts in proptest::collection::vec(arb_filename(), 1..5)) -> String {
        parts.join("/")
    }
}

prop_compose! {
    /// Arbitrary bytes, biased towards short buffers and including empty ones.
    pub fn arb_byte_string()(data in proptest::collection::vec(any::<u8>(), 0..512)) -> Vec<u8> {
        data
    }
}

#[macro_export]
macro_rules! pretty_prop_assert_eq {
    ($left:expr , $right:expr,) => ({
        $crate::pretty_prop_assert_eq!($left, $right)
    });
    ($left:expr , $right:expr) => ({
        match (&($left), &($right)) {
            (left_val, right_val) => {
                ::proptest::prop_assert!(*left_val == *right_val,
                    "assertion failed: `(left == right)`\
                          \n\
                          \n{}\
                          \n",
                          $crate::__private::Comparison::new(left_val, right_val))
            }
        }
    });
    ($left:expr , $right:expr, $($arg:tt)*) => ({
        match (&($left), &($right)) {
            (left_val, right_val) => {
                ::proptest::prop_assert!(*left_val == *right_val,
                    "assertion failed: `(left == right)`: {}\
                          \n\
                          \n{}\
                          \n",
                           format_args!($($arg)*),
                           $crate::__private::Comparison::new(left_val, right_val))
            }
        }
    });
}

#[doc(hidden)]
pub mod __private {
    pub use pretty_assertions::Comparison;
}
