// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Package names.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use thiserror::Error;

/// Longest accepted package name in bytes.
pub const MAX_NAME_LEN: usize = 63;

/// Reasons a string is not a valid package name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    #[error("package name is empty")]
    Empty,
    #[error("package name is {length} bytes long, at most {max} are allowed", max = MAX_NAME_LEN)]
    TooLong { length: usize },
    #[error("package name '{name}' contains the forbidden character {ch:?}")]
    ForbiddenChar { name: String, ch: char },
    #[error("package name '{0}' is reserved")]
    Reserved(String),
}

/// Unique key of a package record.
///
/// The name doubles as a directory name below the database root, so it can
/// never be empty, contain a path separator or NUL, or be `.`/`..`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageName(String);

impl PackageName {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        validate(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Check `name` without allocating.
pub fn validate(name: &str) -> Result<(), InvalidNameError> {
    if name.is_empty() {
        return Err(InvalidNameError::Empty);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(InvalidNameError::TooLong { length: name.len() });
    }
    if name == "." || name == ".." {
        return Err(InvalidNameError::Reserved(name.to_owned()));
    }
    if let Some(ch) = name.chars().find(|c| matches!(c, '/' | '\0')) {
        return Err(InvalidNameError::ForbiddenChar {
            name: name.to_owned(),
            ch,
        });
    }
    Ok(())
}

impl Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PackageName {
    type Err = InvalidNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PackageName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::simple("bash")]
    #[case::dashes("util-linux")]
    #[case::plus("libstdc++6")]
    #[case::dots("python3.12")]
    #[case::max_len(&"a".repeat(MAX_NAME_LEN))]
    fn test_valid_names(#[case] name: &str) {
        let parsed: PackageName = name.parse().unwrap();
        assert_eq!(parsed.as_str(), name);
        assert_eq!(parsed.to_string(), name);
    }

    #[rstest]
    #[case::empty("", InvalidNameError::Empty)]
    #[case::too_long(&"a".repeat(MAX_NAME_LEN + 1), InvalidNameError::TooLong { length: MAX_NAME_LEN + 1 })]
    #[case::dot(".", InvalidNameError::Reserved(".".into()))]
    #[case::dot_dot("..", InvalidNameError::Reserved("..".into()))]
    #[case::slash("../etc", InvalidNameError::ForbiddenChar { name: "../etc".into(), ch: '/' })]
    #[case::nul("ba\0sh", InvalidNameError::ForbiddenChar { name: "ba\0sh".into(), ch: '\0' })]
    fn test_invalid_names(#[case] name: &str, #[case] expected: InvalidNameError) {
        assert_eq!(PackageName::new(name), Err(expected));
    }
}
