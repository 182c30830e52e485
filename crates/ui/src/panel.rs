//! The docked console panel.
//!
//! A panel is built asynchronously: settings are fetched from the store
//! before the first render. Every continuation after an await checks the
//! liveness flag, so a panel torn down mid-flight never applies late results.

use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bridge::{CommandAck, CommandInbox, ControlCommand};
use common::{ConsoleError, ConsoleResult};
use log_buffer::{BufferWriter, EntryId, SharedBuffer};

use crate::debounce::Debouncer;
use crate::filter::LogTypeSet;
use crate::grouping::{build_display, DisplayEntry};
use crate::html::{escape_html, render_frame};
use crate::notice::{NoticeKind, Notices};
use crate::settings::{self, clamp_font_size, Settings};
use crate::storage::{load_settings, SettingsStore};
use crate::theme::UiTheme;
use crate::view::{copy_text, LogView};

/// One rendered panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelFrame {
    pub html: String,
    pub auto_scroll: bool,
    pub visible_rows: usize,
    pub hidden_rows: usize,
}

/// Per-row buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowAction {
    Delete,
    TogglePin,
    ToggleExpanded,
}

struct PanelState {
    opened: bool,
    hovering: bool,
    settings: Settings,
    theme: UiTheme,
    view: LogView,
    filter_input: Debouncer<String>,
    notices: Notices,
}

struct PanelInner {
    store: Arc<dyn SettingsStore>,
    buffer: SharedBuffer,
    writer: BufferWriter,
    state: Mutex<PanelState>,
    alive: AtomicBool,
}

/// Cloneable handle to the panel in one page.
#[derive(Clone)]
pub struct ConsolePanel {
    inner: Arc<PanelInner>,
}

impl ConsolePanel {
    pub fn new(store: Arc<dyn SettingsStore>, buffer: SharedBuffer, writer: BufferWriter) -> Self {
        let settings = Settings::default();
        Self {
            inner: Arc::new(PanelInner {
                store,
                buffer,
                writer,
                state: Mutex::new(PanelState {
                    opened: false,
                    hovering: false,
                    theme: UiTheme::for_mode(settings.dark_mode),
                    view: LogView::new(settings.enabled_log_types),
                    settings,
                    filter_input: Debouncer::default(),
                    notices: Notices::default(),
                }),
                alive: AtomicBool::new(true),
            }),
        }
    }

    /// Load settings and become ready to render. Returns false if the panel
    /// was torn down while settings were loading.
    pub async fn open(&self) -> bool {
        let loaded = load_settings(self.inner.store.as_ref()).await;
        if !self.is_alive() {
            tracing::debug!("panel torn down before settings arrived");
            return false;
        }
        let mut state = self.inner.state.lock();
        state.theme = UiTheme::for_mode(loaded.dark_mode);
        state.view.set_types(loaded.enabled_log_types);
        state.settings = loaded;
        state.opened = true;
        tracing::debug!(visible = state.settings.dock_visible, "console panel opened");
        true
    }

    /// Stop applying results and rendering.
    pub fn teardown(&self) {
        if self.inner.alive.swap(false, Ordering::SeqCst) {
            tracing::debug!("console panel torn down");
        }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.inner.state.lock().opened
    }

    pub fn settings(&self) -> Settings {
        self.inner.state.lock().settings.clone()
    }

    /// Shown when docked, and when hover-to-show is on only while hovered.
    pub fn is_visible(&self) -> bool {
        let state = self.inner.state.lock();
        state.opened
            && state.settings.dock_visible
            && (!state.settings.hover_to_show || state.hovering)
    }

    pub fn set_hovering(&self, hovering: bool) {
        self.inner.state.lock().hovering = hovering;
    }

    /// Apply a control command.
    pub async fn handle_command(&self, command: ControlCommand) -> CommandAck {
        if !self.is_alive() {
            return CommandAck::error("Console panel was torn down");
        }
        if !self.is_open() {
            return CommandAck::error("Console panel is not ready");
        }
        tracing::debug!(?command, "applying control command");

        let mut state = self.inner.state.lock();
        match command {
            ControlCommand::ToggleDock => {
                state.settings.dock_visible = !state.settings.dock_visible;
            }
            ControlCommand::ChangePosition { position } => {
                state.settings.dock_position = position;
            }
            ControlCommand::SetDarkMode { dark_mode } => {
                state.settings.dark_mode = dark_mode;
                state.theme = UiTheme::for_mode(dark_mode);
            }
            ControlCommand::SetHoverToShow { hover_to_show } => {
                state.settings.hover_to_show = hover_to_show;
            }
            ControlCommand::SetLogFont {
                font_family,
                font_size,
            } => {
                if let Some(family) = font_family.filter(|f| !f.trim().is_empty()) {
                    state.settings.log_font_family = family;
                }
                if let Some(size) = font_size {
                    state.settings.log_font_size = clamp_font_size(size);
                }
            }
            ControlCommand::SetLogTypes { types } => {
                let types: LogTypeSet = types.into_iter().collect();
                state.settings.enabled_log_types = types;
                state.view.set_types(types);
            }
            ControlCommand::ClearLogs => {
                drop(state);
                return match self.inner.writer.clear() {
                    Ok(()) => CommandAck::ok(),
                    Err(e) => CommandAck::error(e.to_string()),
                };
            }
        }
        CommandAck::ok()
    }

    /// Answer commands from `inbox` until it closes or the panel is torn down.
    pub async fn run_commands(&self, mut inbox: CommandInbox) {
        while let Some(incoming) = inbox.recv().await {
            if !self.is_alive() {
                break;
            }
            let ack = self.handle_command(incoming.command.clone()).await;
            incoming.respond(ack);
        }
    }

    /// Hide from the panel's own close button and remember it.
    pub async fn close(&self) -> ConsoleResult<()> {
        let previous = {
            let mut state = self.inner.state.lock();
            std::mem::replace(&mut state.settings.dock_visible, false)
        };
        let result = self
            .inner
            .store
            .set(settings::entry(settings::DOCK_VISIBLE, json!(false)))
            .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist dock visibility");
            if self.is_alive() {
                let mut state = self.inner.state.lock();
                state.settings.dock_visible = previous;
                state.notices.error("Failed to save settings", Instant::now());
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Record a keystroke in the filter box; applied after the debounce.
    pub fn input_filter_text(&self, text: &str, now: Instant) {
        self.inner
            .state
            .lock()
            .filter_input
            .push(text.to_string(), now);
    }

    /// Advance timers. Returns whether the text filter changed.
    pub fn tick(&self, now: Instant) -> bool {
        let mut state = self.inner.state.lock();
        state.notices.tick(now);
        match state.filter_input.poll(now) {
            Some(text) => {
                let before = state.view.filter().text().to_string();
                state.view.set_text(&text);
                state.view.filter().text() != before
            }
            None => false,
        }
    }

    pub fn filter_text(&self) -> String {
        self.inner.state.lock().view.filter().text().to_string()
    }

    pub fn toggle_expanded(&self, id: EntryId) -> bool {
        self.inner.state.lock().view.toggle_expanded(id)
    }

    pub fn delete_entry(&self, id: EntryId) -> ConsoleResult<()> {
        self.inner.writer.delete(id)
    }

    pub fn toggle_pin(&self, id: EntryId) -> ConsoleResult<()> {
        self.inner.writer.toggle_pin(id)
    }

    pub fn clear(&self) -> ConsoleResult<()> {
        self.inner.writer.clear()
    }

    /// Apply a row action addressed by its rendered `data-id`.
    pub fn row_action(&self, action: RowAction, data_id: &str) -> ConsoleResult<()> {
        let id: EntryId = data_id.parse().map_err(ConsoleError::invalid)?;
        match action {
            RowAction::Delete => self.delete_entry(id),
            RowAction::TogglePin => self.toggle_pin(id),
            RowAction::ToggleExpanded => {
                self.toggle_expanded(id);
                Ok(())
            }
        }
    }

    /// Clipboard text for a row, searching inside groups.
    pub fn copy_entry(&self, id: EntryId) -> ConsoleResult<String> {
        let entries = self.inner.buffer.read().snapshot();
        let rows = build_display(&entries);
        find_row(&rows, id)
            .map(copy_text)
            .ok_or_else(|| ConsoleError::invalid(format!("no log entry with id {}", id)))
    }

    pub fn show_notice(&self, kind: NoticeKind, text: &str, now: Instant) -> u64 {
        self.inner.state.lock().notices.show(kind, text, now)
    }

    pub fn dismiss_notice(&self, id: u64) -> bool {
        self.inner.state.lock().notices.dismiss(id)
    }

    /// Render the panel. `None` while hidden, unopened or torn down.
    pub fn render(&self, arrival: bool) -> Option<PanelFrame> {
        if !self.is_alive() || !self.is_visible() {
            return None;
        }
        let entries = self.inner.buffer.read().snapshot();
        let mut state = self.inner.state.lock();
        let frame = state.view.render(&entries, arrival);
        let body = render_frame(
            &state.view,
            &frame,
            &state.theme,
            &state.settings.log_font_family,
            state.settings.log_font_size,
        );
        let notices: String = state
            .notices
            .active(Instant::now())
            .map(|n| {
                let kind = match n.kind {
                    NoticeKind::Info => "info",
                    NoticeKind::Error => "error",
                };
                format!(
                    "<div class=\"fc-notice fc-notice-{}\" data-id=\"{}\">{}</div>",
                    kind,
                    n.id,
                    escape_html(&n.text)
                )
            })
            .collect();
        Some(PanelFrame {
            html: format!(
                "<div class=\"fc-dock fc-dock-{}\">{}{}</div>",
                state.settings.dock_position.as_str(),
                body,
                notices
            ),
            auto_scroll: frame.auto_scroll,
            visible_rows: frame.rows.len(),
            hidden_rows: frame.hidden,
        })
    }
}

fn find_row(rows: &[DisplayEntry], id: EntryId) -> Option<&DisplayEntry> {
    rows.iter().find_map(|row| {
        if row.id() == id {
            return Some(row);
        }
        match row {
            DisplayEntry::Group(group) => find_row(&group.children, id),
            DisplayEntry::Single(_) => None,
        }
    })
}
