//! gatepass configuration.
//!
//! Loaded from `~/.gatepass/config.toml`. Every key is optional; a missing
//! file means all defaults.

use std::fs;
use std::path::{Path, PathBuf};

use jiff::tz::TimeZone;
use serde::Deserialize;

use crate::policy::DEFAULT_MAX_TRIPS_PER_DAY;

/// gatepass configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Trips each vessel may take per operating day.
    pub max_trips_per_day: u32,

    /// IANA zone of the facility, e.g. `Asia/Kolkata`.
    /// Operating days roll over at local midnight in this zone.
    /// The system zone is used when unset.
    pub timezone: Option<String>,

    /// Where the trip ledger lives. Defaults to `~/.gatepass/trips.sqlite`.
    pub ledger_path: Option<PathBuf>,

    /// Fleet directory file. Defaults to `~/.gatepass/fleet.toml`;
    /// the demo fleet is used when that file does not exist.
    pub fleet_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_trips_per_day: DEFAULT_MAX_TRIPS_PER_DAY,
            timezone: None,
            ledger_path: None,
            fleet_path: None,
        }
    }
}

impl Config {
    /// Load config from `~/.gatepass/config.toml`, or defaults if it is absent.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };
        Self::parse(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        config.timezone()?;
        Ok(config)
    }

    /// The facility time zone.
    pub fn timezone(&self) -> Result<TimeZone, String> {
        match &self.timezone {
            Some(name) => {
                TimeZone::get(name).map_err(|e| format!("unknown timezone '{name}': {e}"))
            }
            None => Ok(TimeZone::system()),
        }
    }

    pub fn ledger_path(&self) -> Option<PathBuf> {
        self.ledger_path
            .clone()
            .or_else(|| Self::dir().map(|d| d.join("trips.sqlite")))
    }

    pub fn fleet_path(&self) -> Option<PathBuf> {
        self.fleet_path
            .clone()
            .or_else(|| Self::dir().map(|d| d.join("fleet.toml")))
    }

    /// The config file path: `~/.gatepass/config.toml`.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    fn dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".gatepass"))
    }
}
