//! Stored log entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use bridge::{LogEvent, LogMessage};
use common::LogType;

/// Buffer-assigned entry id. Monotonic per buffer, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts `"12"` as well as numerically equal forms such as `"12.0"`.
impl FromStr for EntryId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u64>() {
            return Ok(EntryId(id));
        }
        match s.parse::<f64>() {
            Ok(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 => {
                Ok(EntryId(n as u64))
            }
            _ => Err(format!("invalid entry id: {}", s)),
        }
    }
}

/// A log entry as stored by the display context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub message: LogMessage,
    pub timestamp: f64,
    pub group_depth: u32,
    pub in_group: bool,
    pub is_group_start: bool,
    pub collapsed: bool,
    pub pinned: bool,
}

impl LogEntry {
    pub fn from_event(id: EntryId, event: LogEvent) -> Self {
        Self {
            id,
            log_type: event.log_type,
            message: event.message,
            timestamp: event.timestamp,
            group_depth: event.group_depth,
            in_group: event.in_group,
            is_group_start: event.is_group_start,
            collapsed: event.collapsed,
            pinned: false,
        }
    }

    pub fn plain_text(&self) -> String {
        self.message.plain_text()
    }

    /// Any part of a group: start, end or a nested member.
    pub fn is_group_related(&self) -> bool {
        self.log_type.is_group_kind() || self.is_group_start || self.group_depth > 0
    }
}
