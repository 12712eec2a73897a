// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Maintainer scripts carried by a package.

use std::collections::TryReserveError;
use std::fmt;
use std::ops::Deref;

use derive_more::Display;

/// The five script slots of a record, in their persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum ScriptKind {
    #[display("preinst")]
    PreInst,
    #[display("postinst")]
    PostInst,
    #[display("prerm")]
    PreRm,
    #[display("postrm")]
    PostRm,
    #[display("buildscript")]
    BuildScript,
}

impl ScriptKind {
    pub const COUNT: usize = 5;

    pub const ALL: [ScriptKind; Self::COUNT] = [
        ScriptKind::PreInst,
        ScriptKind::PostInst,
        ScriptKind::PreRm,
        ScriptKind::PostRm,
        ScriptKind::BuildScript,
    ];

    /// Slot position in a record and on disk.
    pub const fn index(self) -> usize {
        match self {
            ScriptKind::PreInst => 0,
            ScriptKind::PostInst => 1,
            ScriptKind::PreRm => 2,
            ScriptKind::PostRm => 3,
            ScriptKind::BuildScript => 4,
        }
    }

    /// File name of the script inside a control archive.
    pub const fn file_name(self) -> &'static str {
        match self {
            ScriptKind::PreInst => "preinst",
            ScriptKind::PostInst => "postinst",
            ScriptKind::PreRm => "prerm",
            ScriptKind::PostRm => "postrm",
            ScriptKind::BuildScript => "buildscript",
        }
    }
}

/// An owned, non-empty script body.
///
/// The content is opaque bytes; nothing here assumes UTF-8 or a terminator.
/// There is no empty `Script`: a zero-length body is the same thing as no
/// script at all, both in memory and on disk.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    /// Returns `None` for an empty body.
    pub fn new(body: impl Into<Vec<u8>>) -> Option<Self> {
        let body = body.into();
        if body.is_empty() {
            None
        } else {
            Some(Self(body))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Best-effort shebang interpreter, e.g. `/bin/sh` for `#!/bin/sh -e`.
    pub fn interpreter(&self) -> Option<&str> {
        let rest = self.0.strip_prefix(b"#!")?;
        let line = rest.split(|b| *b == b'\n').next()?;
        let line = std::str::from_utf8(line).ok()?;
        line.split_whitespace().next()
    }

    pub(crate) fn try_clone(&self) -> Result<Self, TryReserveError> {
        let mut copy = Vec::new();
        copy.try_reserve_exact(self.0.len())?;
        copy.extend_from_slice(&self.0);
        Ok(Self(copy))
    }
}

impl Deref for Script {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script")
            .field("len", &self.0.len())
            .field("interpreter", &self.interpreter())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_empty_body_is_no_script() {
        assert!(Script::new(Vec::new()).is_none());
        assert!(Script::new(&b""[..]).is_none());
    }

    #[test]
    fn test_keeps_embedded_nul() {
        let script = Script::new(&b"echo\0one"[..]).unwrap();
        assert_eq!(script.len(), 8);
        assert_eq!(script.as_bytes(), b"echo\0one");
    }

    #[rstest]
    #[case::sh("#!/bin/sh -e\nexit 0\n", Some("/bin/sh"))]
    #[case::env("#!/usr/bin/env bash\n", Some("/usr/bin/env"))]
    #[case::no_newline("#!/bin/busybox", Some("/bin/busybox"))]
    #[case::plain("echo1", None)]
    #[case::blank_shebang("#!\n", None)]
    fn test_interpreter(#[case] body: &str, #[case] expected: Option<&str>) {
        let script = Script::new(body.as_bytes()).unwrap();
        assert_eq!(script.interpreter(), expected);
    }

    #[test]
    fn test_kind_order_matches_index() {
        for (i, kind) in ScriptKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(kind.to_string(), kind.file_name());
        }
    }
}
