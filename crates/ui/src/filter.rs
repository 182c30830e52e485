//! Type and text filters.

use bitflags::bitflags;

use common::time::display_time;
use common::LogType;

use crate::grouping::DisplayEntry;

/// Longest filter text kept from user input.
const MAX_FILTER_LEN: usize = 1000;

bitflags! {
    /// Enabled log types.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LogTypeSet: u8 {
        const LOG = 1 << 0;
        const WARN = 1 << 1;
        const ERROR = 1 << 2;
        const INFO = 1 << 3;
        const DEBUG = 1 << 4;
        const GROUP = 1 << 5;
        const GROUP_END = 1 << 6;
    }
}

impl LogTypeSet {
    pub fn flag(log_type: LogType) -> Self {
        match log_type {
            LogType::Log => Self::LOG,
            LogType::Warn => Self::WARN,
            LogType::Error => Self::ERROR,
            LogType::Info => Self::INFO,
            LogType::Debug => Self::DEBUG,
            LogType::Group => Self::GROUP,
            LogType::GroupEnd => Self::GROUP_END,
        }
    }

    pub fn enables(&self, log_type: LogType) -> bool {
        self.contains(Self::flag(log_type))
    }

    /// Enabled types in declaration order.
    pub fn types(&self) -> Vec<LogType> {
        LogType::ALL
            .iter()
            .copied()
            .filter(|t| self.enables(*t))
            .collect()
    }
}

impl Default for LogTypeSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<LogType> for LogTypeSet {
    fn from_iter<I: IntoIterator<Item = LogType>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |set, t| set | Self::flag(t))
    }
}

/// Strip control characters, trim, and cap the length of filter input.
pub fn sanitize_filter_input(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| !c.is_control()).collect();
    cleaned.trim().chars().take(MAX_FILTER_LEN).collect()
}

/// Type set plus case-insensitive text needle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub types: LogTypeSet,
    needle: String,
}

impl LogFilter {
    pub fn new(types: LogTypeSet, text: &str) -> Self {
        let mut filter = Self {
            types,
            needle: String::new(),
        };
        filter.set_text(text);
        filter
    }

    pub fn set_text(&mut self, text: &str) {
        self.needle = sanitize_filter_input(text).to_lowercase();
    }

    pub fn text(&self) -> &str {
        &self.needle
    }

    /// Type rule: anything group-related follows the `group` switch, other
    /// entries follow their own type.
    pub fn type_matches(&self, entry: &DisplayEntry) -> bool {
        if entry.is_group_related() {
            self.types.contains(LogTypeSet::GROUP)
        } else {
            self.types.enables(entry.log_type())
        }
    }

    /// Text rule: message text (recursively through groups), type name or
    /// display time contains the needle.
    pub fn text_matches(&self, entry: &DisplayEntry) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        entry.search_text().to_lowercase().contains(&self.needle)
            || entry.log_type().as_str().to_lowercase().contains(&self.needle)
            || display_time(entry.timestamp()).contains(&self.needle)
    }

    pub fn matches(&self, entry: &DisplayEntry) -> bool {
        self.type_matches(entry) && self.text_matches(entry)
    }
}
