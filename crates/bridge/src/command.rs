//! Control commands and acknowledgments.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;
use std::str::FromStr;

use common::LogType;

/// Corner the overlay docks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DockPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl DockPosition {
    pub const ALL: [DockPosition; 4] = [
        DockPosition::TopLeft,
        DockPosition::TopRight,
        DockPosition::BottomLeft,
        DockPosition::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DockPosition::TopLeft => "top-left",
            DockPosition::TopRight => "top-right",
            DockPosition::BottomLeft => "bottom-left",
            DockPosition::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for DockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DockPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DockPosition::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown dock position: {}", s))
    }
}

/// A command sent to the overlay in a tab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ControlCommand {
    #[serde(rename = "toggleDock")]
    ToggleDock,
    #[serde(rename = "changePosition")]
    ChangePosition { position: DockPosition },
    #[serde(rename = "setDarkMode")]
    SetDarkMode {
        #[serde(rename = "darkMode")]
        dark_mode: bool,
    },
    #[serde(rename = "setHoverToShow")]
    SetHoverToShow {
        #[serde(rename = "hoverToShow")]
        hover_to_show: bool,
    },
    #[serde(rename = "setLogFont")]
    SetLogFont {
        #[serde(rename = "fontFamily", default, skip_serializing_if = "Option::is_none")]
        font_family: Option<String>,
        #[serde(rename = "fontSize", default, skip_serializing_if = "Option::is_none")]
        font_size: Option<u32>,
    },
    #[serde(rename = "setLogTypes")]
    SetLogTypes { types: Vec<LogType> },
    #[serde(rename = "clearLogs")]
    ClearLogs,
}

/// Every action name the overlay answers to.
pub const ACTIONS: [&str; 7] = [
    "toggleDock",
    "changePosition",
    "setDarkMode",
    "setHoverToShow",
    "setLogFont",
    "setLogTypes",
    "clearLogs",
];

/// Result of reading a request payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandParse {
    Command(ControlCommand),
    /// Known action with bad fields; answered with an error.
    Invalid(String),
    /// Not a command for us; left unanswered.
    Unrecognized,
}

impl CommandParse {
    pub fn from_json(payload: &Json) -> Self {
        let action = match payload.get("action").and_then(Json::as_str) {
            Some(action) if ACTIONS.contains(&action) => action,
            _ => return CommandParse::Unrecognized,
        };
        match serde_json::from_value::<ControlCommand>(payload.clone()) {
            Ok(command) => CommandParse::Command(command),
            Err(e) => CommandParse::Invalid(format!("invalid {} command: {}", action, e)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Ok,
    Error,
}

/// Acknowledgment for a command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAck {
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CommandAck {
    pub fn ok() -> Self {
        Self {
            status: AckStatus::Ok,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == AckStatus::Ok
    }
}
