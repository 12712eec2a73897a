// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! The package record: everything the database knows about one package.

use std::collections::TryReserveError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::name::{self, InvalidNameError, PackageName};
use crate::script::{Script, ScriptKind};
use crate::text::{
    Architecture, BoundedText, Comment, Depends, Description, Homepage, Maintainer, Priority,
    Section, SourceUrl, Version, try_clone_string,
};

/// Metadata and owned payload of an installed package.
///
/// Every buffer in a record is owned by it alone. Copies made with
/// [`Clone`] or [`PackageRecord::try_clone`] never share storage with the
/// original.
///
/// Metadata fields distinguish a field missing from the control file
/// (`None`) from one that is present with an empty value (`Some("")`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    name: String,
    pub version: Option<Version>,
    pub architecture: Option<Architecture>,
    pub maintainer: Option<Maintainer>,
    pub homepage: Option<Homepage>,
    pub source: Option<SourceUrl>,
    pub section: Option<Section>,
    pub priority: Option<Priority>,
    pub depends: Option<Depends>,
    pub comment: Option<Comment>,
    pub description: Option<Description>,
    scripts: [Option<Script>; ScriptKind::COUNT],
    /// Installed paths, relative to the install root, in extraction order.
    pub file_list: Vec<String>,
    pub installed: bool,
    pub install_time: SystemTime,
}

impl Default for PackageRecord {
    /// A record with no name and no data. It is rejected by the table and
    /// the database until it gets a name.
    fn default() -> Self {
        Self {
            name: String::new(),
            version: None,
            architecture: None,
            maintainer: None,
            homepage: None,
            source: None,
            section: None,
            priority: None,
            depends: None,
            comment: None,
            description: None,
            scripts: Default::default(),
            file_list: Vec::new(),
            installed: false,
            install_time: UNIX_EPOCH,
        }
    }
}

impl PackageRecord {
    pub fn new(name: PackageName) -> Self {
        Self {
            name: name.into_string(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check that the record carries a usable key.
    pub fn validate_name(&self) -> Result<(), InvalidNameError> {
        name::validate(&self.name)
    }

    pub fn script(&self, kind: ScriptKind) -> Option<&Script> {
        self.scripts[kind.index()].as_ref()
    }

    /// Store `body` in the `kind` slot. An empty body clears the slot.
    pub fn set_script(&mut self, kind: ScriptKind, body: impl Into<Vec<u8>>) {
        self.scripts[kind.index()] = Script::new(body);
    }

    pub fn take_script(&mut self, kind: ScriptKind) -> Option<Script> {
        self.scripts[kind.index()].take()
    }

    /// Present scripts in slot order.
    pub fn scripts(&self) -> impl Iterator<Item = (ScriptKind, &Script)> {
        ScriptKind::ALL
            .into_iter()
            .filter_map(|kind| self.script(kind).map(|s| (kind, s)))
    }

    pub fn file_count(&self) -> usize {
        self.file_list.len()
    }

    pub fn has_files(&self) -> bool {
        !self.file_list.is_empty()
    }

    pub fn mark_installed(&mut self, when: SystemTime) {
        self.installed = true;
        self.install_time = when;
    }

    /// Release every owned buffer and reset to [`Default`].
    ///
    /// Calling this again on a cleared record is a no-op.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Deep copy that reports allocation failure instead of aborting.
    ///
    /// Nothing is shared with `self`. On failure every buffer copied so far is
    /// dropped before returning.
    pub fn try_clone(&self) -> Result<Self, TryReserveError> {
        let mut scripts: [Option<Script>; ScriptKind::COUNT] = Default::default();
        for (slot, source) in scripts.iter_mut().zip(&self.scripts) {
            *slot = source.as_ref().map(Script::try_clone).transpose()?;
        }

        let mut file_list = Vec::new();
        file_list.try_reserve_exact(self.file_list.len())?;
        for path in &self.file_list {
            file_list.push(try_clone_string(path)?);
        }

        Ok(Self {
            name: try_clone_string(&self.name)?,
            version: try_clone_text(&self.version)?,
            architecture: try_clone_text(&self.architecture)?,
            maintainer: try_clone_text(&self.maintainer)?,
            homepage: try_clone_text(&self.homepage)?,
            source: try_clone_text(&self.source)?,
            section: try_clone_text(&self.section)?,
            priority: try_clone_text(&self.priority)?,
            depends: try_clone_text(&self.depends)?,
            comment: try_clone_text(&self.comment)?,
            description: try_clone_text(&self.description)?,
            scripts,
            file_list,
            installed: self.installed,
            install_time: self.install_time,
        })
    }
}

fn try_clone_text<const MAX: usize>(
    field: &Option<BoundedText<MAX>>,
) -> Result<Option<BoundedText<MAX>>, TryReserveError> {
    field.as_ref().map(BoundedText::try_clone).transpose()
}

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Build a [`SystemTime`] from seconds since the Unix epoch and the
/// nanoseconds past that second.
///
/// Returns `None` when `nanos` is a second or more, or when the time cannot
/// be represented on this platform.
pub fn system_time_from_unix(secs: i64, nanos: u32) -> Option<SystemTime> {
    if nanos >= NANOS_PER_SEC {
        return None;
    }
    let whole = Duration::from_secs(secs.unsigned_abs());
    let base = if secs >= 0 {
        UNIX_EPOCH.checked_add(whole)
    } else {
        UNIX_EPOCH.checked_sub(whole)
    }?;
    base.checked_add(Duration::from_nanos(nanos.into()))
}

/// Split `time` into whole seconds since the Unix epoch, rounded toward
/// negative infinity, and the nanoseconds past that second.
///
/// Times beyond the `i64` range of seconds saturate.
pub fn unix_time_parts(time: SystemTime) -> (i64, u32) {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => match i64::try_from(after.as_secs()) {
            Ok(secs) => (secs, after.subsec_nanos()),
            Err(_) => (i64::MAX, NANOS_PER_SEC - 1),
        },
        Err(e) => {
            let before = e.duration();
            let (secs, nanos) = match before.subsec_nanos() {
                0 => (i128::from(before.as_secs()), 0),
                n => (i128::from(before.as_secs()) + 1, NANOS_PER_SEC - n),
            };
            match i64::try_from(-secs) {
                Ok(secs) => (secs, nanos),
                Err(_) => (i64::MIN, 0),
            }
        }
    }
}

/// Whole seconds since the Unix epoch, rounded toward negative infinity.
pub fn system_time_to_unix(time: SystemTime) -> i64 {
    unix_time_parts(time).0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn sample() -> PackageRecord {
        let mut record = PackageRecord::new("nano".parse().unwrap());
        record.version = Some(Version::new("7.2-1").unwrap());
        record.architecture = Some(Architecture::new("amd64").unwrap());
        record.comment = Some(Comment::new("").unwrap());
        record.set_script(ScriptKind::PostInst, &b"echo1"[..]);
        record.file_list = vec!["usr/bin/nano".into(), "usr/share/doc/nano/copyright".into()];
        record.mark_installed(system_time_from_unix(1_700_000_000, 0).unwrap());
        record
    }

    #[test]
    fn test_default_is_nameless() {
        let record = PackageRecord::default();
        assert_eq!(record.name(), "");
        assert!(record.validate_name().is_err());
        assert_eq!(record.scripts().count(), 0);
        assert!(!record.has_files());
    }

    #[test]
    fn test_set_script_empty_clears_slot() {
        let mut record = sample();
        assert!(record.script(ScriptKind::PostInst).is_some());
        record.set_script(ScriptKind::PostInst, Vec::new());
        assert!(record.script(ScriptKind::PostInst).is_none());
    }

    #[test]
    fn test_try_clone_is_deep() {
        let original = sample();
        let copy = original.try_clone().unwrap();
        assert_eq!(copy, original);

        let a = original.script(ScriptKind::PostInst).unwrap();
        let b = copy.script(ScriptKind::PostInst).unwrap();
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_ne!(original.file_list[0].as_ptr(), copy.file_list[0].as_ptr());
        assert_ne!(original.file_list.as_ptr(), copy.file_list.as_ptr());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut record = sample();
        record.clear();
        assert_eq!(record, PackageRecord::default());
        record.clear();
        assert_eq!(record, PackageRecord::default());
    }

    #[test]
    fn test_scripts_iterate_in_slot_order() {
        let mut record = sample();
        record.set_script(ScriptKind::BuildScript, &b"make"[..]);
        record.set_script(ScriptKind::PreInst, &b"true"[..]);
        let kinds: Vec<_> = record.scripts().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![ScriptKind::PreInst, ScriptKind::PostInst, ScriptKind::BuildScript]
        );
    }

    #[rstest]
    #[case::epoch(0, 0)]
    #[case::whole_second(1_700_000_000, 0)]
    #[case::sub_second(1_700_000_000, 123_456_789)]
    #[case::before_epoch(-86_400, 0)]
    #[case::sub_second_before_epoch(-2, 500_000_000)]
    #[case::last_nanosecond(-1, 999_999_999)]
    fn test_unix_time_parts_roundtrip(#[case] secs: i64, #[case] nanos: u32) {
        let time = system_time_from_unix(secs, nanos).unwrap();
        assert_eq!(unix_time_parts(time), (secs, nanos));
        assert_eq!(system_time_to_unix(time), secs);
    }

    #[test]
    fn test_system_time_from_unix_rejects_bad_nanos() {
        assert_eq!(system_time_from_unix(0, NANOS_PER_SEC), None);
    }

    #[test]
    fn test_extreme_times_do_not_overflow() {
        for secs in [i64::MIN, i64::MAX] {
            if let Some(time) = system_time_from_unix(secs, 0) {
                assert_eq!(unix_time_parts(time), (secs, 0));
            }
        }
        let before = UNIX_EPOCH.checked_sub(Duration::new(u64::MAX, 5));
        if let Some(time) = before {
            assert_eq!(unix_time_parts(time), (i64::MIN, 0));
        }
    }
}
