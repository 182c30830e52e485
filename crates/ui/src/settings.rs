//! User settings.
//!
//! Stored as a flat key/value map in an external store. Missing or
//! malformed values fall back to their defaults key by key.

use serde_json::{json, Map, Value as Json};

use bridge::DockPosition;
use common::limits::{DEFAULT_FONT_SIZE, MAX_FONT_SIZE, MIN_FONT_SIZE};
use common::LogType;

use crate::filter::LogTypeSet;

pub const DOCK_VISIBLE: &str = "dockVisible";
pub const DOCK_POSITION: &str = "dockPosition";
pub const HOVER_TO_SHOW: &str = "hoverToShow";
pub const DARK_MODE: &str = "darkMode";
pub const LOG_FONT_FAMILY: &str = "logFontFamily";
pub const LOG_FONT_SIZE: &str = "logFontSize";
pub const ENABLED_LOG_TYPES: &str = "enabledLogTypes";

/// Every settings key.
pub const KEYS: [&str; 7] = [
    DOCK_VISIBLE,
    DOCK_POSITION,
    HOVER_TO_SHOW,
    DARK_MODE,
    LOG_FONT_FAMILY,
    LOG_FONT_SIZE,
    ENABLED_LOG_TYPES,
];

pub const DEFAULT_FONT_FAMILY: &str = "Consolas, 'Monaco', 'Courier New', monospace";

/// Clamp a font size into the supported range.
pub fn clamp_font_size(size: u32) -> u32 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub dock_visible: bool,
    pub dock_position: DockPosition,
    pub hover_to_show: bool,
    pub dark_mode: bool,
    pub log_font_family: String,
    pub log_font_size: u32,
    pub enabled_log_types: LogTypeSet,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dock_visible: false,
            dock_position: DockPosition::BottomRight,
            hover_to_show: false,
            dark_mode: false,
            log_font_family: DEFAULT_FONT_FAMILY.to_string(),
            log_font_size: DEFAULT_FONT_SIZE,
            enabled_log_types: LogTypeSet::all(),
        }
    }
}

impl Settings {
    /// Read settings from a (possibly partial) store map.
    pub fn from_map(map: &Map<String, Json>) -> Self {
        let mut settings = Self::default();
        settings.merge(map);
        settings
    }

    /// Overlay the valid values in `map`, keeping the rest.
    pub fn merge(&mut self, map: &Map<String, Json>) {
        let settings = self;
        if let Some(v) = map.get(DOCK_VISIBLE).and_then(Json::as_bool) {
            settings.dock_visible = v;
        }
        if let Some(v) = map
            .get(DOCK_POSITION)
            .and_then(Json::as_str)
            .and_then(|s| s.parse().ok())
        {
            settings.dock_position = v;
        }
        if let Some(v) = map.get(HOVER_TO_SHOW).and_then(Json::as_bool) {
            settings.hover_to_show = v;
        }
        if let Some(v) = map.get(DARK_MODE).and_then(Json::as_bool) {
            settings.dark_mode = v;
        }
        if let Some(v) = map.get(LOG_FONT_FAMILY).and_then(Json::as_str) {
            if !v.trim().is_empty() {
                settings.log_font_family = v.to_string();
            }
        }
        if let Some(v) = map.get(LOG_FONT_SIZE).and_then(Json::as_u64) {
            settings.log_font_size = clamp_font_size(v.min(u32::MAX as u64) as u32);
        }
        if let Some(types) = map.get(ENABLED_LOG_TYPES).and_then(Json::as_array) {
            settings.enabled_log_types = types
                .iter()
                .filter_map(Json::as_str)
                .filter_map(|s| s.parse::<LogType>().ok())
                .collect();
        }
    }

    /// The store values for `keys` only.
    pub fn pick(&self, keys: &[&str]) -> Map<String, Json> {
        let mut all = self.to_map();
        keys.iter()
            .filter_map(|key| all.remove(*key).map(|value| (key.to_string(), value)))
            .collect()
    }

    /// Full store map.
    pub fn to_map(&self) -> Map<String, Json> {
        let types: Vec<&str> = self
            .enabled_log_types
            .types()
            .iter()
            .map(LogType::as_str)
            .collect();
        let mut map = Map::new();
        map.insert(DOCK_VISIBLE.into(), json!(self.dock_visible));
        map.insert(DOCK_POSITION.into(), json!(self.dock_position.as_str()));
        map.insert(HOVER_TO_SHOW.into(), json!(self.hover_to_show));
        map.insert(DARK_MODE.into(), json!(self.dark_mode));
        map.insert(LOG_FONT_FAMILY.into(), json!(self.log_font_family));
        map.insert(LOG_FONT_SIZE.into(), json!(self.log_font_size));
        map.insert(ENABLED_LOG_TYPES.into(), json!(types));
        map
    }
}

/// Single-key update map.
pub fn entry(key: &str, value: Json) -> Map<String, Json> {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_map() {
        assert_eq!(Settings::from_map(&Map::new()), Settings::default());
    }

    #[test]
    fn test_partial_and_malformed_values() {
        let map = json!({
            "dockVisible": true,
            "dockPosition": "middle",
            "logFontSize": 99,
            "enabledLogTypes": ["error", "bogus", "group"],
            "darkMode": "yes",
        });
        let settings = Settings::from_map(map.as_object().unwrap());
        assert!(settings.dock_visible);
        assert_eq!(settings.dock_position, DockPosition::BottomRight);
        assert_eq!(settings.log_font_size, 24);
        assert_eq!(settings.enabled_log_types, LogTypeSet::ERROR | LogTypeSet::GROUP);
        assert!(!settings.dark_mode);
    }

    #[test]
    fn test_map_round_trip() {
        let settings = Settings {
            dock_position: DockPosition::TopLeft,
            log_font_size: 8,
            enabled_log_types: LogTypeSet::WARN,
            ..Settings::default()
        };
        assert_eq!(Settings::from_map(&settings.to_map()), settings);
        assert_eq!(settings.to_map().len(), KEYS.len());
    }

    #[test]
    fn test_font_clamp() {
        assert_eq!(clamp_font_size(2), 8);
        assert_eq!(clamp_font_size(12), 12);
    }

    #[test]
    fn test_merge_keeps_unlisted_values() {
        let mut settings = Settings {
            dark_mode: true,
            log_font_size: 20,
            ..Settings::default()
        };
        settings.merge(&entry(LOG_FONT_SIZE, json!(14)));
        assert_eq!(settings.log_font_size, 14);
        assert!(settings.dark_mode);
    }

    #[test]
    fn test_pick_selects_keys() {
        let picked = Settings::default().pick(&[DOCK_VISIBLE, DOCK_POSITION]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.get(DOCK_POSITION), Some(&json!("bottom-right")));
        assert!(Settings::default().pick(&[]).is_empty());
    }
}
