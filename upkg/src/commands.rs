// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Subcommand implementations.
//!
//! Output goes to the writer handed in, so the commands can be driven
//! against an in-memory buffer.

use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use upkg_store_core::{BoundedText, PackageName, PackageRecord, ScriptKind, StatusReport};
use tracing::error;
use upkg_store_db::{InsertOutcome, PackageDatabase, Removal, ensure_listable, export_file_list};

use crate::cli::{Command, RegisterArgs};
use crate::error::{CliError, IoContext, Result};

/// Run `command` and end the session.
///
/// Commands that change the database save every record on the way out, also
/// when the command itself failed. Read-only commands leave the files alone.
pub fn run(mut db: PackageDatabase, command: &Command, out: &mut dyn Write) -> Result<()> {
    let result = execute(&mut db, command, out);
    if command.is_mutating() {
        let summary = db.close();
        if summary.failed > 0 {
            error!("{} packages could not be saved", summary.failed);
        }
    }
    result
}

pub fn execute(db: &mut PackageDatabase, command: &Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::List => list(db, out),
        Command::Status { name } => status(db, name, out),
        Command::Search { prefix } => search(db, prefix, out),
        Command::Files { name, output } => files(db, name, output.as_deref(), out),
        Command::Register(args) => register(db, args, out),
        Command::Forget { name } => forget(db, name, out),
        Command::Stats => stats(db, out),
    }
}

fn list(db: &PackageDatabase, out: &mut dyn Write) -> Result<()> {
    for name in db.names() {
        writeln!(out, "{name}").map_err(output_error)?;
    }
    Ok(())
}

fn status(db: &PackageDatabase, name: &str, out: &mut dyn Write) -> Result<()> {
    match db.get(name) {
        Some(record) => write!(out, "{}", StatusReport(record)).map_err(output_error),
        None => not_installed(db, name, out),
    }
}

fn search(db: &PackageDatabase, prefix: &str, out: &mut dyn Write) -> Result<()> {
    let found = db.suggestions(prefix);
    if found.is_empty() {
        writeln!(out, "No installed package starts with '{prefix}'.").map_err(output_error)?;
    }
    for name in found {
        writeln!(out, "{name}").map_err(output_error)?;
    }
    Ok(())
}

fn files(
    db: &PackageDatabase,
    name: &str,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<()> {
    let Some(record) = db.get(name) else {
        return not_installed(db, name, out);
    };
    match output {
        Some(path) => {
            export_file_list(record, path)?;
            if record.has_files() {
                writeln!(
                    out,
                    "Wrote {} paths to {}",
                    record.file_count(),
                    path.display()
                )
                .map_err(output_error)?;
            }
        }
        None => {
            ensure_listable(record)?;
            for file in &record.file_list {
                writeln!(out, "{file}").map_err(output_error)?;
            }
        }
    }
    Ok(())
}

fn register(db: &mut PackageDatabase, args: &RegisterArgs, out: &mut dyn Write) -> Result<()> {
    let record = build_record(args)?;
    let verb = match db.register(&record)? {
        InsertOutcome::Inserted => "Registered",
        InsertOutcome::Updated => "Updated",
    };
    writeln!(out, "{verb} package '{}'.", record.name()).map_err(output_error)
}

fn forget(db: &mut PackageDatabase, name: &str, out: &mut dyn Write) -> Result<()> {
    match db.unregister(name)? {
        Removal::Removed(record) => writeln!(out, "Removed package '{}'.", record.name()),
        Removal::NotFound => writeln!(out, "Package '{name}' is not installed."),
    }
    .map_err(output_error)
}

fn stats(db: &PackageDatabase, out: &mut dyn Write) -> Result<()> {
    let stats = db.stats();
    write!(
        out,
        "Buckets: {}\nPackages: {}\nLoad factor: {:.2}\nLongest chain: {}\nEmpty buckets: {}\n",
        stats.size, stats.count, stats.load_factor, stats.longest_chain, stats.empty_buckets
    )
    .map_err(output_error)
}

fn not_installed(db: &PackageDatabase, name: &str, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Package '{name}' is not installed.").map_err(output_error)?;
    let suggestions = db.suggestions(name);
    if !suggestions.is_empty() {
        writeln!(out, "Did you mean:").map_err(output_error)?;
        for suggestion in suggestions {
            writeln!(out, "  {suggestion}").map_err(output_error)?;
        }
    }
    Ok(())
}

fn output_error(source: std::io::Error) -> CliError {
    CliError::io("Failed to write output", source)
}

/// Build an installed record from command-line inputs.
pub fn build_record(args: &RegisterArgs) -> Result<PackageRecord> {
    let mut record = PackageRecord::new(PackageName::new(args.name.as_str())?);
    record.version = text_field("version", args.version.as_deref())?;
    record.architecture = text_field("architecture", args.architecture.as_deref())?;
    record.maintainer = text_field("maintainer", args.maintainer.as_deref())?;
    record.description = text_field("description", args.description.as_deref())?;

    if let Some(list) = &args.files {
        let contents = std::fs::read_to_string(list)
            .io_context(|| format!("Failed to read file list {}", list.display()))?;
        record.file_list = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
    }

    let scripts = [
        (ScriptKind::PreInst, &args.preinst),
        (ScriptKind::PostInst, &args.postinst),
        (ScriptKind::PreRm, &args.prerm),
        (ScriptKind::PostRm, &args.postrm),
        (ScriptKind::BuildScript, &args.buildscript),
    ];
    for (kind, path) in scripts {
        if let Some(path) = path {
            let body = std::fs::read(path)
                .io_context(|| format!("Failed to read {kind} script {}", path.display()))?;
            record.set_script(kind, body);
        }
    }

    record.mark_installed(SystemTime::now());
    Ok(record)
}

fn text_field<const MAX: usize>(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<BoundedText<MAX>>> {
    value
        .map(|v| BoundedText::new(v).map_err(|source| CliError::Field { field, source }))
        .transpose()
}
