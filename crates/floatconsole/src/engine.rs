//! Console engine - wires capture, transport, buffer and panel for one page.

use parking_lot::{Mutex, RwLock};
use serde_json::Value as Json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use bridge::envelope::cleanup_envelope;
use bridge::{
    BridgeResult, CommandBus, Inbound, MessagePort, PageChannel, PageListener, ReceiverStats,
};
use capture::{CaptureHandle, CaptureSession, PageContext};
use common::{ConsoleError, ConsoleResult};
use log_buffer::{BufferChange, BufferWriter, LogBuffer, LogEntry, SharedBuffer};
use ui::{ConsolePanel, PanelFrame, SettingsStore};

use crate::config::FloatConsoleConfig;

/// Page channel port that counts what the capture side posted.
struct CountingPort {
    channel: PageChannel,
    posted: AtomicU64,
}

impl MessagePort for CountingPort {
    fn post_message(&self, message: Json) -> BridgeResult<()> {
        self.posted.fetch_add(1, Ordering::SeqCst);
        self.channel.post_message(message)
    }
}

/// The console overlay attached to one page.
pub struct ConsoleEngine {
    config: FloatConsoleConfig,
    page: PageContext,
    channel: PageChannel,
    port: Arc<CountingPort>,
    buffer: SharedBuffer,
    writer: BufferWriter,
    panel: ConsolePanel,
    bus: CommandBus,
    stats: Arc<ReceiverStats>,
    handled: Arc<AtomicU64>,
    capture: Mutex<Option<CaptureHandle>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ConsoleEngine {
    /// Install capture into `page`, start the buffer pipeline, register for
    /// commands, and open the panel once settings are loaded.
    pub async fn start(
        config: FloatConsoleConfig,
        page: PageContext,
        store: Arc<dyn SettingsStore>,
        bus: CommandBus,
    ) -> ConsoleResult<Self> {
        let channel = PageChannel::new();
        let listener = channel.listen();
        let stats = listener.stats();
        let port = Arc::new(CountingPort {
            channel: channel.clone(),
            posted: AtomicU64::new(0),
        });
        let capture = CaptureSession::install(&page, port.clone())?;

        let buffer: SharedBuffer = Arc::new(RwLock::new(LogBuffer::with_limits(
            config.buffer_capacity,
            config.eviction_batch,
        )));
        let (writer, writer_task) = BufferWriter::spawn(buffer.clone());
        let panel = ConsolePanel::new(store, buffer.clone(), writer.clone());

        let handled = Arc::new(AtomicU64::new(0));
        let pump_task = tokio::spawn(pump(
            listener,
            writer.clone(),
            panel.clone(),
            handled.clone(),
        ));

        let inbox = bus.register(config.tab);
        let runner = panel.clone();
        let command_task = tokio::spawn(async move { runner.run_commands(inbox).await });

        panel.open().await;
        tracing::info!(tab = %config.tab, "Float console started");

        Ok(Self {
            config,
            page,
            channel,
            port,
            buffer,
            writer,
            panel,
            bus,
            stats,
            handled,
            capture: Mutex::new(Some(capture)),
            tasks: Mutex::new(vec![writer_task, pump_task, command_task]),
        })
    }

    pub fn config(&self) -> &FloatConsoleConfig {
        &self.config
    }

    /// The monitored page.
    pub fn page(&self) -> &PageContext {
        &self.page
    }

    /// The shared page channel, for traffic that does not come from capture.
    pub fn channel(&self) -> &PageChannel {
        &self.channel
    }

    pub fn panel(&self) -> &ConsolePanel {
        &self.panel
    }

    pub fn bus(&self) -> &CommandBus {
        &self.bus
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.lock().is_some()
    }

    /// Messages posted by capture so far.
    pub fn posted(&self) -> u64 {
        self.port.posted.load(Ordering::SeqCst)
    }

    /// Inbound events accepted and dropped by validation.
    pub fn stats(&self) -> (u64, u64) {
        (self.stats.accepted(), self.stats.dropped())
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.read().len()
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.buffer.read().snapshot()
    }

    pub fn changes(&self) -> watch::Receiver<BufferChange> {
        self.writer.subscribe()
    }

    /// Wait until everything capture posted has reached the buffer.
    pub async fn settle(&self) -> ConsoleResult<()> {
        let posted = self.posted();
        let drained = async {
            while self.panel.is_alive() && self.handled.load(Ordering::SeqCst) < posted {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        };
        tokio::time::timeout(self.config.settle_timeout, drained)
            .await
            .map_err(|_| ConsoleError::timeout("log pipeline did not settle"))?;
        self.writer.flush().await
    }

    /// Render the panel now.
    pub fn render(&self, arrival: bool) -> Option<PanelFrame> {
        self.panel.render(arrival)
    }

    /// Re-render after every buffer change.
    pub fn spawn_renderer(&self) -> mpsc::UnboundedReceiver<PanelFrame> {
        let (frames, receiver) = mpsc::unbounded_channel();
        let mut changes = self.writer.subscribe();
        let panel = self.panel.clone();
        let task = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let change = *changes.borrow_and_update();
                if !panel.is_alive() {
                    break;
                }
                if let Some(frame) = panel.render(change.arrival) {
                    if frames.send(frame).is_err() {
                        break;
                    }
                }
            }
        });
        self.tasks.lock().push(task);
        receiver
    }

    /// Restore the page, tear the panel down and stop every task.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.capture.lock().take() {
            handle.uninstall();
        }
        if let Err(e) = self.port.post_message(cleanup_envelope()) {
            tracing::warn!(error = %e, "failed to post cleanup");
        }
        self.panel.teardown();
        self.bus.unregister(self.config.tab);

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in &tasks {
            task.abort();
        }
        futures::future::join_all(tasks).await;
        tracing::info!("Float console stopped");
    }
}

/// Move accepted page messages into the buffer.
async fn pump(
    mut listener: PageListener,
    writer: BufferWriter,
    panel: ConsolePanel,
    handled: Arc<AtomicU64>,
) {
    while let Some(inbound) = listener.recv().await {
        match inbound {
            Inbound::Log(event) => {
                if let Err(e) = writer.append(event) {
                    tracing::warn!(error = %e, "log event dropped");
                    break;
                }
            }
            Inbound::Cleanup => {
                tracing::debug!("cleanup received");
                panel.teardown();
                handled.fetch_add(1, Ordering::SeqCst);
                break;
            }
        }
        handled.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge::{ControlCommand, RetryPolicy, TabId};
    use capture::{ErrorEvent, MemoryConsole};
    use common::{LogType, Value};
    use serde_json::json;
    use ui::settings::{entry, DOCK_VISIBLE};
    use ui::MemorySettingsStore;

    async fn engine() -> (ConsoleEngine, Arc<MemoryConsole>) {
        engine_with(FloatConsoleConfig::headless()).await
    }

    async fn engine_with(config: FloatConsoleConfig) -> (ConsoleEngine, Arc<MemoryConsole>) {
        let native = Arc::new(MemoryConsole::new());
        let page = PageContext::new(native.clone());
        let store = Arc::new(MemorySettingsStore::new());
        store.set(entry(DOCK_VISIBLE, json!(true))).await.unwrap();
        let bus = CommandBus::new(RetryPolicy::new(
            2,
            Duration::from_millis(5),
            Duration::from_millis(200),
        ));
        let engine = ConsoleEngine::start(config, page, store, bus)
            .await
            .unwrap();
        (engine, native)
    }

    #[tokio::test]
    async fn test_console_calls_reach_the_buffer() {
        let (engine, native) = engine().await;
        let console = engine.page().console();
        console.log(&[Value::from("hello"), Value::from(42)]);
        console.warn(&[Value::from("careful")]);
        engine.settle().await.unwrap();

        let entries = engine.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].plain_text(), "hello 42");
        assert_eq!(entries[1].log_type, LogType::Warn);
        // The page's own console still ran.
        assert_eq!(native.calls().len(), 2);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_burst_of_logs_is_not_lost() {
        let config = FloatConsoleConfig {
            settle_timeout: Duration::from_secs(30),
            ..FloatConsoleConfig::headless()
        };
        let (engine, _native) = engine_with(config).await;
        let console = engine.page().console();
        for n in 0..5_000 {
            console.log(&[Value::from(format!("line {}", n))]);
        }
        engine.settle().await.unwrap();

        assert_eq!(engine.posted(), 5_000);
        let entries = engine.snapshot();
        assert_eq!(entries.len(), 5_000);
        assert_eq!(entries[0].plain_text(), "line 0");
        assert_eq!(entries[4_999].plain_text(), "line 4999");
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_groups_render_nested() {
        let (engine, _native) = engine().await;
        let console = engine.page().console();
        console.group(&[Value::from("outer")]);
        console.log(&[Value::from("inside")]);
        console.group_end();
        console.log(&[Value::from("after")]);
        engine.settle().await.unwrap();

        let frame = engine.render(true).unwrap();
        assert_eq!(frame.visible_rows, 2);
        assert!(frame.html.contains("<details"));
        assert!(frame.html.contains("inside"));
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_uncaught_error_is_captured() {
        let (engine, _native) = engine().await;
        engine.page().report_error(
            &ErrorEvent::script("Uncaught ReferenceError: x is not defined", None)
                .with_location("app.js", 3, 7),
        );
        engine.settle().await.unwrap();
        let entries = engine.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].log_type, LogType::Error);
        assert!(entries[0].plain_text().ends_with("at app.js:3:7"));
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_foreign_traffic_is_ignored() {
        let (engine, _native) = engine().await;
        engine
            .channel()
            .post_message(json!({ "type": "SOMETHING_ELSE", "data": 1 }))
            .unwrap();
        engine
            .channel()
            .post_message(json!({
                "type": "FC_CONSOLE_LOG",
                "data": { "type": "bogus", "timestamp": 0 }
            }))
            .unwrap();
        engine.page().console().info(&[Value::from("ok")]);
        engine.settle().await.unwrap();

        assert_eq!(engine.buffer_len(), 1);
        assert_eq!(engine.stats(), (1, 1));
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_second_install_is_rejected() {
        let (engine, _native) = engine().await;
        let result = ConsoleEngine::start(
            FloatConsoleConfig::headless().with_tab(TabId(2)),
            engine.page().clone(),
            Arc::new(MemorySettingsStore::new()),
            CommandBus::default(),
        )
        .await;
        assert!(result.is_err());
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_clear_command_over_bus() {
        let (engine, _native) = engine().await;
        engine.page().console().log(&[Value::from("x")]);
        engine.settle().await.unwrap();
        assert_eq!(engine.buffer_len(), 1);

        let ack = engine
            .bus()
            .deliver(TabId(1), &ControlCommand::ClearLogs)
            .await
            .unwrap();
        assert!(ack.is_ok());
        engine.settle().await.unwrap();
        assert_eq!(engine.buffer_len(), 0);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_renderer_follows_arrivals() {
        let (engine, _native) = engine().await;
        let mut frames = engine.spawn_renderer();
        engine.page().console().error(&[Value::from("boom")]);
        let frame = frames.recv().await.unwrap();
        assert!(frame.auto_scroll);
        assert!(frame.html.contains("fc-log-error"));
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_restores_page() {
        let (engine, native) = engine().await;
        engine.shutdown().await;
        assert!(!engine.is_capturing());
        assert!(!CaptureSession::is_installed(engine.page()));
        assert!(!engine.panel().is_alive());

        engine.page().console().log(&[Value::from("after")]);
        assert_eq!(native.calls().len(), 1);
        // Only the cleanup message was posted.
        assert_eq!(engine.posted(), 1);
    }
}
