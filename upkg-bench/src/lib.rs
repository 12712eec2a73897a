// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Fixtures for the upkg benchmarks.

use std::time::{Duration, UNIX_EPOCH};

use upkg_store_core::{
    Architecture, Description, PackageName, PackageRecord, ScriptKind, Version,
};

/// A record shaped like a typical distribution package: a few metadata
/// fields, two scripts and `files` installed paths.
pub fn sample_record(index: usize, files: usize) -> PackageRecord {
    let name = PackageName::new(format!("package-{index}")).unwrap_or_else(|e| {
        panic!("fixture name for index {index} is invalid: {e}");
    });
    let mut record = PackageRecord::new(name);
    record.version = Version::new(format!("1.{index}-1")).ok();
    record.architecture = Architecture::new("amd64").ok();
    record.description = Some(Description::truncated(
        "Benchmark fixture package with a moderately long description line",
    ));
    record.set_script(ScriptKind::PostInst, &b"#!/bin/sh\nldconfig\n"[..]);
    record.set_script(ScriptKind::PreRm, &b"#!/bin/sh\nexit 0\n"[..]);
    record.file_list = (0..files)
        .map(|i| format!("usr/share/package-{index}/file-{i}"))
        .collect();
    record.mark_installed(UNIX_EPOCH + Duration::from_secs(1_700_000_000));
    record
}

/// `count` records with distinct names.
pub fn sample_records(count: usize, files: usize) -> Vec<PackageRecord> {
    (0..count).map(|i| sample_record(i, files)).collect()
}
