use std::time::Duration;

use crate::model::{Room, Slot};
use crate::store::DEFAULT_ENDPOINT;

/// Where reservations live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Sheets {
        spreadsheet_id: String,
        token: String,
        endpoint: String,
    },
}

/// Deployment settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub secret: String,
    pub store: StoreKind,
    pub store_timeout: Duration,
    /// Static catalog. When set it replaces the `Rooms` sheet.
    pub rooms: Option<Vec<Room>>,
    /// Static catalog. When set it replaces the `Slots` sheet.
    pub slots: Option<Vec<Slot>>,
    pub metrics_port: Option<u16>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{var} must be set"),
            ConfigError::Invalid { var, value } => write!(f, "{var} has invalid value {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; `from_env` passes the process
    /// environment. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let secret = get("ROOMBOOK_SECRET").ok_or(ConfigError::Missing("ROOMBOOK_SECRET"))?;
        let store = match get("ROOMBOOK_STORE").as_deref().map(str::trim) {
            None | Some("memory") => StoreKind::Memory,
            Some("sheets") => StoreKind::Sheets {
                spreadsheet_id: get("ROOMBOOK_SHEET_ID")
                    .ok_or(ConfigError::Missing("ROOMBOOK_SHEET_ID"))?,
                token: get("ROOMBOOK_SHEETS_TOKEN")
                    .ok_or(ConfigError::Missing("ROOMBOOK_SHEETS_TOKEN"))?,
                endpoint: get("ROOMBOOK_SHEETS_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.into()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "ROOMBOOK_STORE",
                    value: other.into(),
                });
            }
        };

        Ok(Self {
            bind: get("ROOMBOOK_BIND").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(get("ROOMBOOK_PORT"), "ROOMBOOK_PORT", 8080)?,
            secret,
            store,
            store_timeout: Duration::from_secs(parse_or(
                get("ROOMBOOK_STORE_TIMEOUT_SECS"),
                "ROOMBOOK_STORE_TIMEOUT_SECS",
                30,
            )?),
            rooms: get("ROOMBOOK_ROOMS").map(|v| parse_rooms(&v)),
            slots: get("ROOMBOOK_SLOTS")
                .map(|v| parse_slots(&v))
                .transpose()?,
            metrics_port: get("ROOMBOOK_METRICS_PORT")
                .map(|v| parse_var(&v, "ROOMBOOK_METRICS_PORT"))
                .transpose()?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(value: &str, var: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.into(),
    })
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    value.map_or(Ok(default), |v| parse_var(&v, var))
}

/// `"Board room, Lab"`: each entry is both id and name.
fn parse_rooms(value: &str) -> Vec<Room> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Room::named)
        .collect()
}

/// `"09:00-10:00,10:00-11:00"`.
fn parse_slots(value: &str) -> Result<Vec<Slot>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            entry
                .split_once('-')
                .and_then(|(start, end)| Slot::parse(start.trim(), end.trim()))
                .ok_or_else(|| ConfigError::Invalid {
                    var: "ROOMBOOK_SLOTS",
                    value: entry.into(),
                })
        })
        .collect()
}
