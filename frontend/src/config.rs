//! Settings file support.
//!
//! `tstate run` reads `--config <path>` if given, otherwise
//! `<config dir>/tstate/config.toml` when it exists. Every key is optional;
//! command-line flags override whatever the file says.

use std::fmt;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::Deserialize;
use tstate_core::cpu::z80::Quirks;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Board name from the machine registry.
    pub machine: String,
    pub load_address: u16,
    /// Full clock cycles to run before giving up on a HALT.
    pub max_cycles: u64,
    /// Clock cycles RESET is held at power-on.
    pub reset_cycles: u32,
    /// off, error, warn, info, debug or trace.
    pub log_level: LevelFilter,
    pub quirks: QuirksConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuirksConfig {
    pub simplified_half_carry: bool,
    pub shared_sign_condition: bool,
}

impl From<QuirksConfig> for Quirks {
    fn from(q: QuirksConfig) -> Self {
        Quirks {
            simplified_half_carry: q.simplified_half_carry,
            shared_sign_condition: q.shared_sign_condition,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            machine: "flat".to_string(),
            load_address: 0,
            max_cycles: 10_000_000,
            reset_cycles: 3,
            log_level: LevelFilter::Warn,
            quirks: QuirksConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Parse { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Default settings file location, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tstate").join("config.toml"))
}

impl Config {
    /// Load `explicit`, or the default file if present, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
