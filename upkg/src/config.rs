// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use upkg_store_db::TableConfig;

use crate::error::{CliError, IoContext, Result};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "UPKG_CONFIG_PATH";
/// Environment variable overriding `db_dir`.
pub const DB_DIR_ENV: &str = "UPKG_DB_DIR";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/upkg/upkg.toml";
/// Per-user configuration file, relative to `$HOME`.
pub const USER_CONFIG_NAME: &str = ".upkg.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the package database
    pub db_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Requested bucket count of a freshly opened table
    pub initial_table_size: usize,

    /// Lower bound for the bucket count
    pub min_table_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_dir: PathBuf::from("/var/lib/upkg/db"),
            log_level: "info".to_string(),
            initial_table_size: 16,
            min_table_size: 8,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .io_context(|| format!("Failed to read config file at {}", path.display()))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the first configuration file found, then apply `UPKG_DB_DIR`.
    ///
    /// An explicitly named file, by flag or by `UPKG_CONFIG_PATH`, must
    /// exist. The system and user files are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let home = std::env::var_os("HOME").map(PathBuf::from);

        let mut config = match find_config(explicit, env_path, home.as_deref()) {
            Some(path) => {
                debug!("Using configuration {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        if let Some(dir) = std::env::var_os(DB_DIR_ENV) {
            config.db_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn table_config(&self) -> TableConfig {
        TableConfig {
            initial_size: self.initial_table_size,
            min_size: self.min_table_size,
            ..TableConfig::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.min_table_size == 0 {
            return Err(CliError::config("min_table_size must be at least 1"));
        }
        if self.db_dir.as_os_str().is_empty() {
            return Err(CliError::config("db_dir must not be empty"));
        }
        Ok(())
    }
}

/// Configuration file to read, in lookup order: explicit path,
/// `UPKG_CONFIG_PATH`, the system file, the user file.
pub fn find_config(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    home: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    let system = PathBuf::from(SYSTEM_CONFIG_PATH);
    if system.is_file() {
        return Some(system);
    }
    home.map(|home| home.join(USER_CONFIG_NAME))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use upkg_utils_test::CanonicalTempDir;

    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = CanonicalTempDir::new().unwrap();
        let path = tmp.join("upkg.toml");
        std::fs::write(&path, "db_dir = \"/srv/upkg\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.db_dir, PathBuf::from("/srv/upkg"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.table_config(), TableConfig::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let tmp = CanonicalTempDir::new().unwrap();
        let path = tmp.join("upkg.toml");
        std::fs::write(&path, "dbdir = \"/srv/upkg\"\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(CliError::Toml(_))
        ));
    }

    #[test]
    fn test_zero_min_size_is_rejected() {
        let tmp = CanonicalTempDir::new().unwrap();
        let path = tmp.join("upkg.toml");
        std::fs::write(&path, "min_table_size = 0\n").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let tmp = CanonicalTempDir::new().unwrap();
        assert!(Config::from_file(&tmp.join("absent.toml")).is_err());
    }

    #[test]
    fn test_lookup_order() {
        let tmp = CanonicalTempDir::new().unwrap();
        let flag = tmp.join("flag.toml");
        let env = tmp.join("env.toml");

        assert_eq!(
            find_config(Some(&flag), Some(env.clone()), Some(tmp.path())),
            Some(flag)
        );
        assert_eq!(
            find_config(None, Some(env.clone()), Some(tmp.path())),
            Some(env)
        );

        if !Path::new(SYSTEM_CONFIG_PATH).exists() {
            assert_eq!(find_config(None, None, Some(tmp.path())), None);
            let user = tmp.join(USER_CONFIG_NAME);
            std::fs::write(&user, "").unwrap();
            assert_eq!(find_config(None, None, Some(tmp.path())), Some(user));
        }
    }
}
