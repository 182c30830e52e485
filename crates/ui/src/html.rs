//! HTML rendering of the log list.
//!
//! All page-derived text is escaped here and nowhere else. Inline styles from
//! `%c` spans are only emitted when they look like CSS declarations.

use bridge::LogMessage;
use common::time::display_time;
use console_format::{looks_like_css, StyledMessage};

use crate::grouping::{DisplayEntry, GroupNode};
use crate::theme::UiTheme;
use crate::view::{LogView, ViewFrame};

pub const CONSOLE_CLASS: &str = "fc-console";
pub const LOG_CLASS: &str = "fc-log";
pub const LOG_PINNED_CLASS: &str = "fc-log-pinned";
pub const LOG_MESSAGE_CLASS: &str = "fc-log-message";
pub const LOG_CLAMPED_CLASS: &str = "fc-log-clamped";

/// Escape text for element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Message body markup.
pub fn render_message(message: &LogMessage) -> String {
    match message {
        LogMessage::Text(text) => escape_html(text),
        LogMessage::Styled(styled) => render_spans(styled),
    }
}

fn render_spans(message: &StyledMessage) -> String {
    let mut out = String::new();
    for (index, span) in message.parts.iter().enumerate() {
        if span.spaced && index > 0 {
            out.push(' ');
        }
        match span.style.as_deref().filter(|s| looks_like_css(s)) {
            Some(style) => {
                out.push_str(&format!(
                    "<span style=\"{}\">{}</span>",
                    escape_html(style),
                    escape_html(&span.text)
                ));
            }
            None => out.push_str(&format!("<span>{}</span>", escape_html(&span.text))),
        }
    }
    out
}

fn row_classes(view: &LogView, row: &DisplayEntry) -> String {
    let mut classes = vec![
        LOG_CLASS.to_string(),
        format!("{}-{}", LOG_CLASS, row.log_type().as_str().to_lowercase()),
    ];
    if row.pinned() {
        classes.push(LOG_PINNED_CLASS.to_string());
    }
    if view.is_clamped(row) {
        classes.push(LOG_CLAMPED_CLASS.to_string());
    }
    classes.join(" ")
}

/// One row, recursing into groups.
pub fn render_row(view: &LogView, row: &DisplayEntry) -> String {
    let head = row.head();
    let time = format!(
        "<span class=\"fc-log-time\">{}</span>",
        escape_html(&display_time(head.timestamp))
    );
    match row {
        DisplayEntry::Single(entry) => format!(
            "<div class=\"{}\" data-id=\"{}\">{}<span class=\"{}\">{}</span></div>",
            row_classes(view, row),
            entry.id,
            time,
            LOG_MESSAGE_CLASS,
            render_message(&entry.message)
        ),
        DisplayEntry::Group(group) => render_group(view, row, group, &time),
    }
}

fn render_group(view: &LogView, row: &DisplayEntry, group: &GroupNode, time: &str) -> String {
    let open = if group.collapsed() { "" } else { " open" };
    let children: String = group
        .children
        .iter()
        .map(|child| render_row(view, child))
        .collect();
    format!(
        "<details class=\"{} fc-log-group-block\" data-id=\"{}\"{}><summary>{}<span class=\"{}\">{}</span></summary><div class=\"fc-log-group-children\">{}</div></details>",
        row_classes(view, row),
        group.start.id,
        open,
        time,
        LOG_MESSAGE_CLASS,
        render_message(group.label()),
        children
    )
}

/// The whole panel body.
pub fn render_frame(
    view: &LogView,
    frame: &ViewFrame,
    theme: &UiTheme,
    font_family: &str,
    font_size: u32,
) -> String {
    let rows: String = frame.rows.iter().map(|row| render_row(view, row)).collect();
    let mode = if theme.is_dark { " fc-dark" } else { "" };
    format!(
        "<div class=\"{}{}\" style=\"{}\">{}</div>",
        CONSOLE_CLASS,
        mode,
        escape_html(&theme.css_variables(font_family, font_size)),
        rows
    )
}
