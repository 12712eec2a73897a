// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

use thiserror::Error;
use upkg_store_core::{InvalidNameError, TextTooLongError};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Package database error: {0}")]
    Db(#[from] upkg_store_db::Error),

    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid package name: {0}")]
    InvalidName(#[from] InvalidNameError),

    #[error("Invalid {field}: {source}")]
    Field {
        field: &'static str,
        #[source]
        source: TextTooLongError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CliError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

/// Helper trait for adding context to IO errors
pub trait IoContext<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| CliError::io(f(), e))
    }
}
