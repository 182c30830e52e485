//! Log entry kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a captured log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogType {
    #[serde(rename = "log")]
    Log,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "group")]
    Group,
    #[serde(rename = "groupEnd")]
    GroupEnd,
}

impl LogType {
    /// All kinds, in display order.
    pub const ALL: [LogType; 7] = [
        LogType::Log,
        LogType::Warn,
        LogType::Error,
        LogType::Info,
        LogType::Debug,
        LogType::Group,
        LogType::GroupEnd,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Log => "log",
            LogType::Warn => "warn",
            LogType::Error => "error",
            LogType::Info => "info",
            LogType::Debug => "debug",
            LogType::Group => "group",
            LogType::GroupEnd => "groupEnd",
        }
    }

    /// Whether this kind belongs to group bookkeeping.
    pub fn is_group_kind(&self) -> bool {
        matches!(self, LogType::Group | LogType::GroupEnd)
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a type name is not one of the known kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownLogType(pub String);

impl fmt::Display for UnknownLogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log type: {}", self.0)
    }
}

impl std::error::Error for UnknownLogType {}

impl FromStr for LogType {
    type Err = UnknownLogType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownLogType(s.to_string()))
    }
}
