// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "upkg", version, about = "Query and maintain the upkg package database")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database root, overriding the configuration
    #[arg(long, global = true, value_name = "PATH")]
    pub db_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List installed packages
    List,
    /// Show everything recorded about a package
    Status { name: String },
    /// List installed packages whose name starts with a prefix
    Search { prefix: String },
    /// Print the files installed by a package
    Files {
        name: String,
        /// Write the list to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Record a package as installed
    Register(RegisterArgs),
    /// Drop a package from the database
    Forget { name: String },
    /// Show hash table statistics
    Stats,
}

impl Command {
    /// Whether the command changes the database.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Command::Register(_) | Command::Forget { .. })
    }
}

#[derive(Args, Debug, Default)]
pub struct RegisterArgs {
    pub name: String,

    #[arg(long)]
    pub version: Option<String>,

    #[arg(long)]
    pub architecture: Option<String>,

    #[arg(long)]
    pub maintainer: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// File listing the installed paths, one per line
    #[arg(long, value_name = "LIST")]
    pub files: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub preinst: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub postinst: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub prerm: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub postrm: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub buildscript: Option<PathBuf>,
}
