//! Runtime configuration.
//!
//! Values come from the environment (after an optional `.env` file has been
//! loaded by the binary) and can be overridden by command-line flags.

use std::path::PathBuf;

use tracing::warn;

use crate::store::DEFAULT_DATA_DIR;

pub const DEFAULT_PORT: u16 = 3000;
pub const PORT_VAR: &str = "UMUD_PORT";
pub const DATA_DIR_VAR: &str = "UMUD_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP port of `umud serve`
    pub port: u16,
    /// Directory of the JSON document store
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl Config {
    /// Read `UMUD_PORT` and `UMUD_DATA_DIR`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(PORT_VAR) {
            match raw.trim().parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(value = %raw, "ignoring invalid {}", PORT_VAR),
            }
        }
        if let Some(dir) = lookup(DATA_DIR_VAR).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        config
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, port: Option<u16>, data_dir: Option<PathBuf>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }
}
