// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

//! The `upkg` command: a front end to the installed-package database.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
