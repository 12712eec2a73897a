// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Length-bounded metadata text.
//!
//! Control-file fields are free text but the database keeps them bounded so a
//! single runaway field can't bloat every record. The bound is part of the
//! type: a `BoundedText<31>` can only be built through a constructor that
//! checks it.

use std::collections::TryReserveError;
use std::fmt;
use std::ops::Deref;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("text is {length} bytes long, at most {max} are allowed")]
pub struct TextTooLongError {
    pub length: usize,
    pub max: usize,
}

/// UTF-8 text of at most `MAX` bytes. Empty text is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundedText<const MAX: usize>(String);

impl<const MAX: usize> BoundedText<MAX> {
    pub const MAX_LEN: usize = MAX;

    pub fn new(text: impl Into<String>) -> Result<Self, TextTooLongError> {
        let text = text.into();
        if text.len() > MAX {
            return Err(TextTooLongError {
                length: text.len(),
                max: MAX,
            });
        }
        Ok(Self(text))
    }

    /// Cut `text` down to the longest prefix that fits, never splitting a
    /// character.
    pub fn truncated(text: &str) -> Self {
        if text.len() <= MAX {
            return Self(text.to_owned());
        }
        let mut end = MAX;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        Self(text[..end].to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub(crate) fn try_clone(&self) -> Result<Self, TryReserveError> {
        try_clone_string(&self.0).map(Self)
    }
}

pub(crate) fn try_clone_string(s: &str) -> Result<String, TryReserveError> {
    let mut copy = String::new();
    copy.try_reserve_exact(s.len())?;
    copy.push_str(s);
    Ok(copy)
}

impl<const MAX: usize> Deref for BoundedText<MAX> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const MAX: usize> AsRef<str> for BoundedText<MAX> {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<const MAX: usize> fmt::Display for BoundedText<MAX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const MAX: usize> TryFrom<&str> for BoundedText<MAX> {
    type Error = TextTooLongError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const MAX: usize> TryFrom<String> for BoundedText<MAX> {
    type Error = TextTooLongError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const MAX: usize> PartialEq<str> for BoundedText<MAX> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl<const MAX: usize> PartialEq<&str> for BoundedText<MAX> {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

pub type Version = BoundedText<31>;
pub type Architecture = BoundedText<15>;
pub type Maintainer = BoundedText<63>;
pub type Homepage = BoundedText<127>;
pub type SourceUrl = BoundedText<127>;
pub type Section = BoundedText<31>;
pub type Priority = BoundedText<15>;
pub type Depends = BoundedText<255>;
pub type Comment = BoundedText<255>;
pub type Description = BoundedText<1023>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_over_long() {
        let err = Architecture::new("x".repeat(16)).unwrap_err();
        assert_eq!(err, TextTooLongError { length: 16, max: 15 });
        assert!(Architecture::new("x".repeat(15)).is_ok());
    }

    #[test]
    fn test_empty_is_valid() {
        let empty = Version::new("").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_truncated_respects_char_boundaries() {
        // 'é' is two bytes; 15 bytes of input would split the last one.
        let input = "aaaaaaaaaaaaaaé";
        assert_eq!(input.len(), 16);
        let cut = Architecture::truncated(input);
        assert_eq!(cut.as_str(), "aaaaaaaaaaaaaa");

        let fits = Architecture::truncated("amd64");
        assert_eq!(fits, "amd64");
    }

    #[test]
    fn test_try_clone_does_not_share_buffer() {
        let original = Description::new("a description").unwrap();
        let copy = original.try_clone().unwrap();
        assert_eq!(original, copy);
        assert_ne!(original.as_ptr(), copy.as_ptr());
    }
}
