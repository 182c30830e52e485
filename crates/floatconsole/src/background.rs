//! Extension background handlers: keyboard shortcuts and first install.

use std::sync::Arc;

use bridge::{CommandBus, ControlCommand, TabId};
use common::ConsoleResult;
use ui::settings::{self, Settings};
use ui::SettingsStore;

/// Shortcut name bound to showing or hiding the dock.
pub const TOGGLE_DOCK_SHORTCUT: &str = "toggle_dock";

/// Why the install hook ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallReason {
    Install,
    Update,
}

pub struct Background {
    bus: CommandBus,
    store: Arc<dyn SettingsStore>,
    tab: TabId,
}

impl Background {
    pub fn new(bus: CommandBus, store: Arc<dyn SettingsStore>, tab: TabId) -> Self {
        Self { bus, store, tab }
    }

    /// Run a keyboard shortcut against the active tab. The toggle goes
    /// straight to the tab; stored settings are left alone.
    pub async fn on_shortcut(&self, name: &str) -> bool {
        if name != TOGGLE_DOCK_SHORTCUT {
            tracing::debug!(name, "unbound shortcut");
            return false;
        }
        match self.bus.deliver(self.tab, &ControlCommand::ToggleDock).await {
            Some(ack) if ack.is_ok() => true,
            Some(ack) => {
                tracing::warn!(message = ?ack.message, "tab rejected shortcut");
                false
            }
            None => false,
        }
    }

    /// Seed dock visibility and position on first install. Updates keep
    /// whatever the user chose.
    pub async fn on_installed(&self, reason: InstallReason) -> ConsoleResult<()> {
        if reason != InstallReason::Install {
            return Ok(());
        }
        tracing::info!("Float Console installed");
        let keys = [settings::DOCK_VISIBLE, settings::DOCK_POSITION];
        let defaults = Settings::default().pick(&keys);
        self.store.set(defaults).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge::{CommandAck, RetryPolicy};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use ui::MemorySettingsStore;

    fn bus() -> CommandBus {
        CommandBus::new(RetryPolicy::new(
            2,
            Duration::from_millis(5),
            Duration::from_millis(50),
        ))
    }

    /// Acknowledge every command on `tab` and report it.
    fn record(bus: &CommandBus, tab: TabId) -> mpsc::UnboundedReceiver<ControlCommand> {
        let mut inbox = bus.register(tab);
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(incoming) = inbox.recv().await {
                let _ = sender.send(incoming.command.clone());
                incoming.respond(CommandAck::ok());
            }
        });
        receiver
    }

    #[tokio::test]
    async fn test_toggle_shortcut_reaches_tab() {
        let bus = bus();
        let mut seen = record(&bus, TabId(3));
        let store = Arc::new(MemorySettingsStore::new());
        let background = Background::new(bus, store.clone(), TabId(3));

        assert!(background.on_shortcut(TOGGLE_DOCK_SHORTCUT).await);
        assert_eq!(seen.recv().await, Some(ControlCommand::ToggleDock));
        assert!(store.value(settings::DOCK_VISIBLE).is_none());
    }

    #[tokio::test]
    async fn test_unknown_shortcut_sends_nothing() {
        let bus = bus();
        let mut seen = record(&bus, TabId(3));
        let background = Background::new(bus, Arc::new(MemorySettingsStore::new()), TabId(3));

        assert!(!background.on_shortcut("open_devtools").await);
        assert!(seen.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_toggle_shortcut_without_tab_fails() {
        let background = Background::new(bus(), Arc::new(MemorySettingsStore::new()), TabId(8));
        assert!(!background.on_shortcut(TOGGLE_DOCK_SHORTCUT).await);
    }

    #[tokio::test]
    async fn test_install_seeds_dock_defaults() {
        let store = Arc::new(MemorySettingsStore::new());
        let background = Background::new(bus(), store.clone(), TabId(1));

        background.on_installed(InstallReason::Update).await.unwrap();
        assert!(store.value(settings::DOCK_VISIBLE).is_none());

        background.on_installed(InstallReason::Install).await.unwrap();
        assert_eq!(store.value(settings::DOCK_VISIBLE), Some(json!(false)));
        assert_eq!(store.value(settings::DOCK_POSITION), Some(json!("bottom-right")));
        assert!(store.value(settings::DARK_MODE).is_none());
    }

    #[tokio::test]
    async fn test_install_reports_store_failure() {
        let store = Arc::new(MemorySettingsStore::new());
        store.set_failing(true);
        let background = Background::new(bus(), store, TabId(1));
        assert!(background.on_installed(InstallReason::Install).await.is_err());
    }
}
