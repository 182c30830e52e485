//! Group reconstruction.
//!
//! The buffer is flat: a group is a start entry, the entries nested deeper
//! than it, and a closing `groupEnd` at its depth. For display the flat run
//! is folded back into a tree. A group whose end never arrived keeps every
//! deeper entry up to the end of the buffer.
//!
//! Folding stops at [`MAX_DISPLAY_DEPTH`] levels: group starts deeper than
//! that are shown as plain rows inside the deepest folded group, so a page
//! that opens groups in a loop cannot build an unbounded tree.

use bridge::LogMessage;
use common::LogType;
use log_buffer::{EntryId, LogEntry};

/// Deepest folded group level. Deeper entries are listed flat.
pub const MAX_DISPLAY_DEPTH: usize = 32;

/// A top-level display row: a single entry or a folded group.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayEntry {
    Single(LogEntry),
    Group(GroupNode),
}

/// A folded group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupNode {
    /// The entry that opened the group; its message is the label.
    pub start: LogEntry,
    pub children: Vec<DisplayEntry>,
    /// A matching `groupEnd` was seen.
    pub terminated: bool,
}

impl GroupNode {
    pub fn label(&self) -> &LogMessage {
        &self.start.message
    }

    pub fn collapsed(&self) -> bool {
        self.start.collapsed
    }
}

impl DisplayEntry {
    /// The entry this row is keyed on.
    pub fn head(&self) -> &LogEntry {
        match self {
            DisplayEntry::Single(entry) => entry,
            DisplayEntry::Group(group) => &group.start,
        }
    }

    pub fn id(&self) -> EntryId {
        self.head().id
    }

    pub fn log_type(&self) -> LogType {
        self.head().log_type
    }

    pub fn timestamp(&self) -> f64 {
        self.head().timestamp
    }

    pub fn pinned(&self) -> bool {
        self.head().pinned
    }

    pub fn is_group_related(&self) -> bool {
        match self {
            DisplayEntry::Single(entry) => entry.is_group_related(),
            DisplayEntry::Group(_) => true,
        }
    }

    /// Flattened text, through nested groups.
    pub fn search_text(&self) -> String {
        let mut parts = Vec::new();
        let mut stack = vec![self];
        while let Some(entry) = stack.pop() {
            match entry {
                DisplayEntry::Single(entry) => parts.push(entry.plain_text()),
                DisplayEntry::Group(group) => {
                    parts.push(group.label().plain_text());
                    stack.extend(group.children.iter().rev());
                }
            }
        }
        parts.join(" ")
    }

    /// Number of entries represented, the group start included.
    pub fn entry_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(entry) = stack.pop() {
            count += 1;
            if let DisplayEntry::Group(group) = entry {
                stack.extend(group.children.iter());
            }
        }
        count
    }
}

/// Fold a flat, arrival-ordered entry list into display rows.
pub fn build_display(entries: &[LogEntry]) -> Vec<DisplayEntry> {
    let mut index = 0;
    let mut out = Vec::new();
    while index < entries.len() {
        let entry = &entries[index];
        if entry.log_type == LogType::GroupEnd {
            // Its group was evicted or deleted.
            index += 1;
            continue;
        }
        out.push(fold_entry(entries, &mut index, 0));
    }
    out
}

/// Fold the entry at `index`, advancing past everything it consumed.
/// `level` is the number of folded groups around it.
fn fold_entry(entries: &[LogEntry], index: &mut usize, level: usize) -> DisplayEntry {
    let start = &entries[*index];
    *index += 1;
    if !start.is_group_start || level >= MAX_DISPLAY_DEPTH {
        return DisplayEntry::Single(start.clone());
    }

    let depth = start.group_depth;
    let mut children = Vec::new();
    let mut terminated = false;

    while let Some(next) = entries.get(*index) {
        if next.log_type == LogType::GroupEnd && next.group_depth <= depth {
            *index += 1;
            terminated = true;
            break;
        }
        if next.group_depth <= depth {
            break;
        }
        if next.log_type == LogType::GroupEnd {
            // Stray end deeper than this group, or closing a flattened one.
            *index += 1;
            continue;
        }
        children.push(fold_entry(entries, index, level + 1));
    }

    DisplayEntry::Group(GroupNode {
        start: start.clone(),
        children,
        terminated,
    })
}
