//! Toolbar popup controller.
//!
//! The popup edits settings for the active tab. Changes are applied to the
//! popup's own state first, persisted, then sent to the tab. If any step
//! fails the change is rolled back and a notice is shown.

use parking_lot::Mutex;
use serde_json::{Map, Value as Json};
use std::sync::Arc;
use std::time::Instant;

use bridge::{CommandBus, ControlCommand, DockPosition, TabId};
use common::LogType;
use ui::notice::Notice;
use ui::settings::{self, clamp_font_size, Settings};
use ui::{load_settings, LogTypeSet, Notices, SettingsStore};

pub const TOGGLE_FAILED: &str = "Failed to toggle console";
pub const POSITION_FAILED: &str = "Failed to change position";
pub const SETTINGS_FAILED: &str = "Failed to update settings";

struct PopupState {
    settings: Settings,
    notices: Notices,
}

pub struct PopupController {
    bus: CommandBus,
    store: Arc<dyn SettingsStore>,
    tab: TabId,
    state: Mutex<PopupState>,
}

impl PopupController {
    pub fn new(bus: CommandBus, store: Arc<dyn SettingsStore>, tab: TabId) -> Self {
        Self {
            bus,
            store,
            tab,
            state: Mutex::new(PopupState {
                settings: Settings::default(),
                notices: Notices::default(),
            }),
        }
    }

    /// Refresh from the store.
    pub async fn load(&self) {
        let settings = load_settings(self.store.as_ref()).await;
        self.state.lock().settings = settings;
    }

    pub fn settings(&self) -> Settings {
        self.state.lock().settings.clone()
    }

    pub fn notices(&self, now: Instant) -> Vec<Notice> {
        self.state.lock().notices.active(now).cloned().collect()
    }

    pub fn dismiss_notice(&self, id: u64) -> bool {
        self.state.lock().notices.dismiss(id)
    }

    /// Show or hide the console in the active tab.
    pub async fn toggle_dock(&self) -> bool {
        self.update(
            |settings| settings.dock_visible = !settings.dock_visible,
            &[settings::DOCK_VISIBLE],
            ControlCommand::ToggleDock,
            TOGGLE_FAILED,
        )
        .await
    }

    /// Move the console to another corner.
    pub async fn change_position(&self, position: DockPosition) -> bool {
        if self.state.lock().settings.dock_position == position {
            return true;
        }
        self.update(
            |settings| settings.dock_position = position,
            &[settings::DOCK_POSITION],
            ControlCommand::ChangePosition { position },
            POSITION_FAILED,
        )
        .await
    }

    pub async fn set_dark_mode(&self, dark_mode: bool) -> bool {
        self.update(
            |settings| settings.dark_mode = dark_mode,
            &[settings::DARK_MODE],
            ControlCommand::SetDarkMode { dark_mode },
            SETTINGS_FAILED,
        )
        .await
    }

    pub async fn set_hover_to_show(&self, hover_to_show: bool) -> bool {
        self.update(
            |settings| settings.hover_to_show = hover_to_show,
            &[settings::HOVER_TO_SHOW],
            ControlCommand::SetHoverToShow { hover_to_show },
            SETTINGS_FAILED,
        )
        .await
    }

    pub async fn set_log_font(&self, font_family: Option<String>, font_size: Option<u32>) -> bool {
        let font_family = font_family.filter(|f| !f.trim().is_empty());
        let font_size = font_size.map(clamp_font_size);
        let mut keys = Vec::new();
        if font_family.is_some() {
            keys.push(settings::LOG_FONT_FAMILY);
        }
        if font_size.is_some() {
            keys.push(settings::LOG_FONT_SIZE);
        }

        let family = font_family.clone();
        self.update(
            move |settings| {
                if let Some(family) = family {
                    settings.log_font_family = family;
                }
                if let Some(size) = font_size {
                    settings.log_font_size = size;
                }
            },
            &keys,
            ControlCommand::SetLogFont {
                font_family,
                font_size,
            },
            SETTINGS_FAILED,
        )
        .await
    }

    pub async fn set_log_types(&self, types: &[LogType]) -> bool {
        let set: LogTypeSet = types.iter().copied().collect();
        self.update(
            |settings| settings.enabled_log_types = set,
            &[settings::ENABLED_LOG_TYPES],
            ControlCommand::SetLogTypes { types: set.types() },
            SETTINGS_FAILED,
        )
        .await
    }

    /// Empty the console in the active tab.
    pub async fn clear_logs(&self) -> bool {
        self.update(|_| {}, &[], ControlCommand::ClearLogs, SETTINGS_FAILED)
            .await
    }

    /// Apply `change` locally, persist `keys`, then send `command`. On any
    /// failure the previous values of `keys` are put back, locally and in
    /// the store, and `failure` is shown.
    async fn update(
        &self,
        change: impl FnOnce(&mut Settings),
        keys: &[&str],
        command: ControlCommand,
        failure: &str,
    ) -> bool {
        let (previous, next) = {
            let mut state = self.state.lock();
            let previous = state.settings.pick(keys);
            change(&mut state.settings);
            (previous, state.settings.pick(keys))
        };

        if self.commit(next, &command).await {
            return true;
        }
        self.state.lock().settings.merge(&previous);
        if !previous.is_empty() {
            self.restore(previous).await;
        }
        self.fail(failure);
        false
    }

    /// Persist `values`, then deliver `command` with retry.
    async fn commit(&self, values: Map<String, Json>, command: &ControlCommand) -> bool {
        if !values.is_empty() {
            if let Err(e) = self.store.set(values).await {
                tracing::warn!(error = %e, "failed to persist popup setting");
                return false;
            }
        }
        match self.bus.deliver(self.tab, command).await {
            Some(ack) if ack.is_ok() => true,
            Some(ack) => {
                tracing::warn!(message = ?ack.message, "tab rejected command");
                false
            }
            None => false,
        }
    }

    async fn restore(&self, values: Map<String, Json>) {
        if let Err(e) = self.store.set(values).await {
            tracing::warn!(error = %e, "failed to restore popup setting");
        }
    }

    fn fail(&self, text: &str) {
        self.state.lock().notices.error(text, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge::{CommandAck, RetryPolicy};
    use serde_json::json;
    use std::time::Duration;
    use ui::MemorySettingsStore;

    fn bus() -> CommandBus {
        CommandBus::new(RetryPolicy::new(
            2,
            Duration::from_millis(5),
            Duration::from_millis(50),
        ))
    }

    /// Answer every command on `tab` with `ack`.
    fn answer(bus: &CommandBus, tab: TabId, ack: CommandAck) {
        let mut inbox = bus.register(tab);
        tokio::spawn(async move {
            while let Some(incoming) = inbox.recv().await {
                incoming.respond(ack.clone());
            }
        });
    }

    #[tokio::test]
    async fn test_toggle_persists_and_sends() {
        let bus = bus();
        answer(&bus, TabId(1), CommandAck::ok());
        let store = Arc::new(MemorySettingsStore::new());
        let popup = PopupController::new(bus, store.clone(), TabId(1));
        popup.load().await;

        assert!(popup.toggle_dock().await);
        assert!(popup.settings().dock_visible);
        assert_eq!(store.value(settings::DOCK_VISIBLE), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_toggle_rolls_back_without_receiver() {
        let store = Arc::new(MemorySettingsStore::new());
        let popup = PopupController::new(bus(), store.clone(), TabId(9));

        assert!(!popup.toggle_dock().await);
        assert!(!popup.settings().dock_visible);
        assert_eq!(store.value(settings::DOCK_VISIBLE), Some(json!(false)));
        let notices = popup.notices(Instant::now());
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].text, TOGGLE_FAILED);
    }

    #[tokio::test]
    async fn test_position_rolls_back_on_error_ack() {
        let bus = bus();
        answer(&bus, TabId(1), CommandAck::error("nope"));
        let popup = PopupController::new(bus, Arc::new(MemorySettingsStore::new()), TabId(1));

        assert!(!popup.change_position(DockPosition::TopLeft).await);
        assert_eq!(popup.settings().dock_position, DockPosition::BottomRight);
        assert_eq!(popup.notices(Instant::now())[0].text, POSITION_FAILED);
    }

    #[tokio::test]
    async fn test_store_failure_skips_send() {
        let bus = bus();
        answer(&bus, TabId(1), CommandAck::ok());
        let store = Arc::new(MemorySettingsStore::new());
        store.set_failing(true);
        let popup = PopupController::new(bus, store, TabId(1));
        assert!(!popup.set_dark_mode(true).await);
        assert!(!popup.settings().dark_mode);
        assert_eq!(popup.notices(Instant::now())[0].text, SETTINGS_FAILED);
    }

    #[tokio::test]
    async fn test_settings_roll_back_when_tab_rejects() {
        let bus = bus();
        answer(&bus, TabId(1), CommandAck::error("nope"));
        let store = Arc::new(MemorySettingsStore::new());
        let popup = PopupController::new(bus, store.clone(), TabId(1));
        let before = popup.settings();

        assert!(!popup.set_dark_mode(true).await);
        assert!(!popup.set_hover_to_show(true).await);
        assert!(!popup.set_log_types(&[LogType::Error]).await);
        assert!(!popup.set_log_font(Some("Fira Code".into()), Some(20)).await);

        assert_eq!(popup.settings(), before);
        assert_eq!(store.value(settings::DARK_MODE), Some(json!(false)));
        assert_eq!(store.value(settings::HOVER_TO_SHOW), Some(json!(false)));
        assert_eq!(store.value(settings::LOG_FONT_SIZE), Some(json!(12)));
        assert_eq!(
            store.value(settings::LOG_FONT_FAMILY),
            Some(json!(settings::DEFAULT_FONT_FAMILY))
        );
        let stored_types = store.value(settings::ENABLED_LOG_TYPES).unwrap();
        assert_eq!(stored_types.as_array().map(Vec::len), Some(7));
        assert_eq!(popup.notices(Instant::now()).len(), 4);
    }

    #[tokio::test]
    async fn test_font_rollback_touches_only_sent_keys() {
        let bus = bus();
        let store = Arc::new(MemorySettingsStore::new());
        store
            .set(settings::entry(settings::LOG_FONT_FAMILY, json!("Menlo")))
            .await
            .unwrap();
        let popup = PopupController::new(bus.clone(), store.clone(), TabId(1));
        popup.load().await;

        answer(&bus, TabId(1), CommandAck::error("nope"));
        assert!(!popup.set_log_font(None, Some(16)).await);
        assert_eq!(popup.settings().log_font_size, 12);
        assert_eq!(popup.settings().log_font_family, "Menlo");
        assert_eq!(store.value(settings::LOG_FONT_FAMILY), Some(json!("Menlo")));
    }

    #[tokio::test]
    async fn test_font_is_clamped_before_persisting() {
        let bus = bus();
        answer(&bus, TabId(1), CommandAck::ok());
        let store = Arc::new(MemorySettingsStore::new());
        let popup = PopupController::new(bus, store.clone(), TabId(1));
        assert!(popup.set_log_font(None, Some(3)).await);
        assert_eq!(store.value(settings::LOG_FONT_SIZE), Some(json!(8)));
        assert!(store.value(settings::LOG_FONT_FAMILY).is_none());
    }
}
