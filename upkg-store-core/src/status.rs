// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Human-readable status view of a record.

use std::fmt;

use crate::record::{PackageRecord, system_time_to_unix};
use crate::script::ScriptKind;

/// `Display` adapter printing the non-empty fields of a record, one
/// `Key: value` line each, in control-file order.
pub struct StatusReport<'a>(pub &'a PackageRecord);

impl fmt::Display for StatusReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        writeln!(f, "Package: {}", record.name())?;

        let fields: [(&str, Option<&str>); 10] = [
            ("Version", record.version.as_deref()),
            ("Architecture", record.architecture.as_deref()),
            ("Maintainer", record.maintainer.as_deref()),
            ("Homepage", record.homepage.as_deref()),
            ("Source", record.source.as_deref()),
            ("Section", record.section.as_deref()),
            ("Priority", record.priority.as_deref()),
            ("Depends", record.depends.as_deref()),
            ("Comment", record.comment.as_deref()),
            ("Description", record.description.as_deref()),
        ];
        for (key, value) in fields {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                writeln!(f, "{key}: {value}")?;
            }
        }

        let state = if record.installed {
            "installed"
        } else {
            "not installed"
        };
        writeln!(f, "Status: {state}")?;
        if record.installed {
            writeln!(
                f,
                "Installed-Date: {}",
                system_time_to_unix(record.install_time)
            )?;
        }

        for kind in ScriptKind::ALL {
            if let Some(script) = record.script(kind) {
                writeln!(f, "Script {kind}: {} bytes", script.len())?;
            }
        }
        if record.has_files() {
            writeln!(f, "Contains {} files.", record.file_count())?;
        }
        Ok(())
    }
}
