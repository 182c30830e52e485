//! The visible log list.
//!
//! Each render folds the buffer into groups, filters, and sorts pinned rows
//! first. Nothing is patched incrementally: any arrival, pin or filter change
//! produces a fresh [`ViewFrame`].

use std::collections::HashSet;

use common::time::display_time;
use log_buffer::{EntryId, LogEntry};

use crate::filter::{LogFilter, LogTypeSet};
use crate::grouping::{build_display, DisplayEntry};

/// Messages longer than this many lines start clamped.
pub const CLAMP_MAX_LINES: usize = 8;
/// Messages longer than this many characters start clamped.
pub const CLAMP_MAX_CHARS: usize = 1000;

/// One render of the list.
#[derive(Clone, Debug, Default)]
pub struct ViewFrame {
    pub rows: Vec<DisplayEntry>,
    /// Scroll to the newest row.
    pub auto_scroll: bool,
    /// Rows hidden by the filters.
    pub hidden: usize,
}

/// Filter, sort and per-row display state.
#[derive(Debug, Default)]
pub struct LogView {
    filter: LogFilter,
    expanded: HashSet<EntryId>,
    last_tail: Option<EntryId>,
}

impl LogView {
    pub fn new(types: LogTypeSet) -> Self {
        Self {
            filter: LogFilter::new(types, ""),
            ..Self::default()
        }
    }

    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    pub fn set_types(&mut self, types: LogTypeSet) {
        if self.filter.types != types {
            self.filter.types = types;
            self.expanded.clear();
        }
    }

    pub fn set_text(&mut self, text: &str) {
        let before = self.filter.text().to_string();
        self.filter.set_text(text);
        if self.filter.text() != before {
            self.expanded.clear();
        }
    }

    /// Whether a row's message starts clamped.
    pub fn overflows(entry: &DisplayEntry) -> bool {
        let text = match entry {
            DisplayEntry::Single(e) => e.plain_text(),
            DisplayEntry::Group(g) => g.label().plain_text(),
        };
        text.lines().count() > CLAMP_MAX_LINES || text.chars().count() > CLAMP_MAX_CHARS
    }

    pub fn is_clamped(&self, entry: &DisplayEntry) -> bool {
        Self::overflows(entry) && !self.expanded.contains(&entry.id())
    }

    /// Flip the expanded state of a clamped row.
    pub fn toggle_expanded(&mut self, id: EntryId) -> bool {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
            return true;
        }
        false
    }

    /// Produce the list for `entries` (arrival order). `arrival` says the
    /// render was triggered by a new entry.
    pub fn render(&mut self, entries: &[LogEntry], arrival: bool) -> ViewFrame {
        let display = build_display(entries);
        let total = display.len();

        let mut rows: Vec<DisplayEntry> = display
            .into_iter()
            .filter(|row| self.filter.matches(row))
            .collect();
        sort_rows(&mut rows);

        let tail = rows.last().map(DisplayEntry::id);
        let auto_scroll = arrival && tail.is_some() && tail != self.last_tail;
        self.last_tail = tail;

        ViewFrame {
            hidden: total - rows.len(),
            rows,
            auto_scroll,
        }
    }
}

/// Pinned rows first in their current order, then the rest by timestamp.
pub fn sort_rows(rows: &mut [DisplayEntry]) {
    rows.sort_by(|a, b| {
        b.pinned()
            .cmp(&a.pinned())
            .then_with(|| match (a.pinned(), b.pinned()) {
                (false, false) => a.timestamp().total_cmp(&b.timestamp()),
                _ => std::cmp::Ordering::Equal,
            })
    });
}

/// Clipboard text for a row: `[time] TYPE: text`.
pub fn copy_text(entry: &DisplayEntry) -> String {
    format!(
        "[{}] {}: {}",
        display_time(entry.timestamp()),
        entry.log_type().as_str().to_uppercase(),
        entry.search_text()
    )
}
