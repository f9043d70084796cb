//! JSON configuration file of the `phantom-ammo` binary.
//!
//! ```json
//! {
//!     "LOG_DATE_FMT": "%H:%M:%S",
//!     "LOG_LVL": "DEBUG",
//!     "AMMO_FILE": "ammo",
//!     "REQUESTS": [
//!         {"host": "127.0.0.1", "port": 80, "url": "AUTH", "method": "POST", "body": {"username": "tank_user_0"}}
//!     ]
//! }
//! ```
//!
//! `REQUESTS` is kept raw and validated by [`parse_request_list`] so errors
//! point at the offending entry.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::Level;

use crate::ammo_writer::check_writable;
use crate::errors::{AmmoError, ConfigError, DestinationError};
use crate::request_record::RequestRecord;
use crate::request_record_list::parse_request_list;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct AmmoConfig {
    #[serde(default = "default_log_date_fmt")]
    pub log_date_fmt: String,
    #[serde(default = "default_log_lvl")]
    pub log_lvl: String,
    #[serde(default = "default_ammo_file")]
    pub ammo_file: PathBuf,
    pub requests: Value,
}

fn default_log_date_fmt() -> String {
    "%H:%M:%S".to_string()
}

fn default_log_lvl() -> String {
    "DEBUG".to_string()
}

fn default_ammo_file() -> PathBuf {
    PathBuf::from("ammo")
}

impl Default for AmmoConfig {
    fn default() -> Self {
        AmmoConfig {
            log_date_fmt: default_log_date_fmt(),
            log_lvl: default_log_lvl(),
            ammo_file: default_ammo_file(),
            requests: Value::Array(Vec::new()),
        }
    }
}

impl AmmoConfig {
    pub fn from_file(path: &Path) -> Result<AmmoConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Blueprint written by `phantom-ammo template`.
    pub fn template() -> AmmoConfig {
        AmmoConfig {
            requests: json!([{
                "host": "127.0.0.1",
                "port": 80,
                "url": "AUTH",
                "method": "POST",
                "body": {"username": "tank_user_0", "password": "tank_user_0"}
            }]),
            ..AmmoConfig::default()
        }
    }

    pub fn write_template(path: &Path) -> Result<(), DestinationError> {
        check_writable(path)?;
        let mut content = serde_json::to_string_pretty(&AmmoConfig::template())
            .map_err(|err| DestinationError::io(path, err.into()))?;
        content.push('\n');
        fs::write(path, content).map_err(|err| DestinationError::io(path, err))
    }

    pub fn request_records(&self) -> Result<Vec<RequestRecord>, AmmoError> {
        Ok(parse_request_list(&self.requests)?)
    }

    /// Accepts both tracing names and the `WARNING`/`CRITICAL` spelling.
    pub fn log_level(&self) -> Result<Level, ConfigError> {
        match self.log_lvl.to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Level::TRACE),
            "DEBUG" => Ok(Level::DEBUG),
            "INFO" => Ok(Level::INFO),
            "WARN" | "WARNING" => Ok(Level::WARN),
            "ERROR" | "CRITICAL" => Ok(Level::ERROR),
            _ => Err(ConfigError::LogLevel(self.log_lvl.clone())),
        }
    }
}
