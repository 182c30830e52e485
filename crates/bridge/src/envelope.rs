//! Log event envelope.
//!
//! Wire form on the page channel:
//!
//! ```json
//! {"type": "FC_CONSOLE_LOG", "data": {"type": "log", "message": ..., "timestamp": 1700000000000,
//!   "groupDepth": 0, "inGroup": false, "isGroupStart": false, "collapsed": false}}
//! ```
//!
//! The page channel is shared with the page's own traffic, so anything
//! without the discriminator is ignored, and anything malformed is dropped
//! without disturbing the receiver.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::sync::atomic::{AtomicU64, Ordering};

use common::limits::CLOCK_SKEW_TOLERANCE_MS;
use common::LogType;
use console_format::StyledMessage;

/// Discriminator for log events.
pub const CONSOLE_LOG: &str = "FC_CONSOLE_LOG";

/// Discriminator asking the display side to tear down.
pub const CONSOLE_CLEANUP: &str = "FC_CONSOLE_CLEANUP";

/// Message payload of a log event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogMessage {
    Text(String),
    Styled(StyledMessage),
}

impl LogMessage {
    /// Flattened text.
    pub fn plain_text(&self) -> String {
        match self {
            LogMessage::Text(text) => text.clone(),
            LogMessage::Styled(message) => message.plain_text(),
        }
    }
}

impl Default for LogMessage {
    fn default() -> Self {
        LogMessage::Text(String::new())
    }
}

/// A captured console event as it travels to the display context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    #[serde(rename = "type")]
    pub log_type: LogType,
    #[serde(default)]
    pub message: LogMessage,
    /// Epoch milliseconds at capture time.
    pub timestamp: f64,
    #[serde(default)]
    pub group_depth: u32,
    #[serde(default)]
    pub in_group: bool,
    #[serde(default)]
    pub is_group_start: bool,
    #[serde(default)]
    pub collapsed: bool,
}

impl LogEvent {
    /// Plain event at `group_depth`.
    pub fn new(log_type: LogType, message: LogMessage, timestamp: f64, group_depth: u32) -> Self {
        Self {
            log_type,
            message,
            timestamp,
            group_depth,
            in_group: group_depth > 0,
            is_group_start: false,
            collapsed: false,
        }
    }

    /// Wrap in the tagged envelope.
    pub fn to_envelope(&self) -> serde_json::Result<Json> {
        Ok(serde_json::json!({
            "type": CONSOLE_LOG,
            "data": serde_json::to_value(self)?,
        }))
    }
}

/// Cleanup request envelope.
pub fn cleanup_envelope() -> Json {
    serde_json::json!({ "type": CONSOLE_CLEANUP })
}

/// A message accepted from the page channel.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Log(LogEvent),
    Cleanup,
}

/// Why an inbound payload was not accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Not ours; not counted.
    Unrelated,
    UnknownType(String),
    Malformed(String),
    FutureTimestamp,
}

/// Decode and validate a payload from the page channel.
pub fn decode(payload: &Json, now_millis: f64) -> Result<Inbound, Rejection> {
    match payload.get("type").and_then(Json::as_str) {
        Some(CONSOLE_LOG) => {}
        Some(CONSOLE_CLEANUP) => return Ok(Inbound::Cleanup),
        _ => return Err(Rejection::Unrelated),
    }

    let data = payload
        .get("data")
        .ok_or_else(|| Rejection::Malformed("missing data".to_string()))?;

    match data.get("type").and_then(Json::as_str) {
        Some(name) if name.parse::<LogType>().is_ok() => {}
        Some(name) => return Err(Rejection::UnknownType(name.to_string())),
        None => return Err(Rejection::Malformed("missing type".to_string())),
    }

    let event: LogEvent =
        serde_json::from_value(data.clone()).map_err(|e| Rejection::Malformed(e.to_string()))?;

    if !event.timestamp.is_finite() {
        return Err(Rejection::Malformed("non-finite timestamp".to_string()));
    }
    if event.timestamp > now_millis + CLOCK_SKEW_TOLERANCE_MS {
        return Err(Rejection::FutureTimestamp);
    }

    Ok(Inbound::Log(event))
}

/// Receiver-side data-quality counters.
#[derive(Debug, Default)]
pub struct ReceiverStats {
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl ReceiverStats {
    pub fn record(&self, result: &Result<Inbound, Rejection>) {
        match result {
            Ok(_) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
            }
            Err(Rejection::Unrelated) => {}
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
