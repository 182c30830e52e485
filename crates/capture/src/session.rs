//! Capture session lifecycle.
//!
//! Installing a session wraps every console method and global error hook of
//! a [`PageContext`]. Each wrapper calls what it replaced first, then formats
//! the call and posts a [`LogEvent`]. The replaced implementations live in
//! the [`CaptureHandle`], which puts them back on uninstall or drop.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use bridge::{BridgeError, LogEvent, LogMessage, MessagePort};
use common::time::now_millis;
use common::{LogType, Value, PRODUCT_NAME};
use console_format::{format_args, render_table, serialize, FormatError};

use crate::console::ConsoleMethod;
use crate::error::CaptureError;
use crate::page::{
    ErrorEvent, ErrorHandler, EventTarget, ListenerId, MethodFn, PageContext, RejectionHandler,
};

/// Marker set on a context while a session is installed.
pub const INSTALL_MARKER: &str = "__FC_LOGGER_INJECTED";

const DEFAULT_GROUP_LABEL: &str = "Group";
const REJECTION_PREFIX: &str = "Unhandled Promise Rejection: ";

/// An open group.
#[derive(Clone, Debug)]
struct GroupFrame {
    label: LogMessage,
    collapsed: bool,
}

#[derive(Default)]
struct GroupState {
    depth: u32,
    stack: Vec<GroupFrame>,
}

/// State shared by every wrapper of one session.
struct Emitter {
    port: Arc<dyn MessagePort>,
    /// The page's `console.error` from before install, for our own failures.
    native_error: MethodFn,
    groups: Mutex<GroupState>,
}

impl Emitter {
    fn depth(&self) -> u32 {
        self.groups.lock().depth
    }

    fn post(&self, event: LogEvent) {
        if let Err(err) = self.try_post(&event) {
            tracing::warn!(error = %err, "failed to post log message");
            (self.native_error)(&[
                Value::from(format!("{}: Failed to post log message", PRODUCT_NAME)),
                Value::from(err.to_string()),
            ]);
        }
    }

    fn try_post(&self, event: &LogEvent) -> Result<(), CaptureError> {
        let payload = event.to_envelope().map_err(BridgeError::from)?;
        self.port.post_message(payload)?;
        Ok(())
    }

    fn log(&self, log_type: LogType, message: LogMessage) {
        let event = LogEvent::new(log_type, message, now_millis(), self.depth());
        self.post(event);
    }

    fn on_console(&self, log_type: LogType, args: &[Value]) {
        self.log(log_type, LogMessage::Styled(format_args(args)));
    }

    fn on_group(&self, args: &[Value], collapsed: bool) {
        let label = if args.is_empty() {
            LogMessage::Text(DEFAULT_GROUP_LABEL.to_string())
        } else {
            LogMessage::Styled(format_args(args))
        };

        let depth = {
            let mut groups = self.groups.lock();
            let depth = groups.depth;
            groups.depth += 1;
            groups.stack.push(GroupFrame {
                label: label.clone(),
                collapsed,
            });
            depth
        };

        let mut event = LogEvent::new(LogType::Group, label, now_millis(), depth);
        event.is_group_start = true;
        event.collapsed = collapsed;
        self.post(event);
    }

    fn on_group_end(&self) {
        let depth = {
            let mut groups = self.groups.lock();
            if groups.depth == 0 {
                return;
            }
            groups.depth -= 1;
            groups.stack.pop();
            groups.depth
        };
        self.post(LogEvent::new(
            LogType::GroupEnd,
            LogMessage::default(),
            now_millis(),
            depth,
        ));
    }

    fn on_table(&self, args: &[Value]) {
        let Some(data) = args.first() else {
            return;
        };

        let text = match render_table(data) {
            Ok(table) => table.to_message(),
            Err(FormatError::UnsupportedTableShape(shape)) => {
                tracing::trace!(shape, "table data is not tabular");
                format!(
                    "{}\n\nOriginal object:\n{}",
                    format_args(args).plain_text(),
                    serialize(data)
                )
            }
            Err(err) => {
                tracing::debug!(error = %err, "table rendering failed");
                format!("Table: {}", format_args(args).plain_text())
            }
        };
        self.log(LogType::Log, LogMessage::Text(text));
    }

    fn on_uncaught(&self, event: &ErrorEvent) {
        let text = match &event.error {
            Some(Value::Error {
                name,
                message,
                stack: Some(stack),
            }) => format!("{}: {}\n{}", name, message, stack),
            _ if event.message.is_empty() => return,
            _ => match &event.filename {
                Some(source) => format!(
                    "{} at {}:{}:{}",
                    event.message,
                    source,
                    position(event.lineno),
                    position(event.colno)
                ),
                None => event.message.clone(),
            },
        };
        self.log(LogType::Error, LogMessage::Text(text));
    }

    fn on_rejection(&self, reason: &Value) {
        let mut text = String::from(REJECTION_PREFIX);
        match reason {
            Value::Error {
                name,
                message,
                stack,
            } => {
                text.push_str(&format!("{}: {}", name, message));
                if let Some(stack) = stack {
                    text.push('\n');
                    text.push_str(stack);
                }
            }
            other => text.push_str(&other.to_js_string()),
        }
        self.log(LogType::Error, LogMessage::Text(text));
    }

    fn on_resource_error(&self, event: &ErrorEvent) {
        // Script errors carry the thrown value and go through `onerror`.
        if event.error.is_some() {
            return;
        }

        let text = match &event.target {
            EventTarget::Element { tag_name, src, href } => {
                let Some(source) = src.as_ref().or(href.as_ref()) else {
                    return;
                };
                if tag_name.is_empty() {
                    return;
                }
                format!("Resource Error: {} failed to load\nSource: {}", tag_name, source)
            }
            // Script errors with a message are reported by `onerror`.
            _ if !event.message.is_empty() => return,
            EventTarget::Window | EventTarget::Document => match &event.filename {
                Some(file) => format!(
                    "Resource Error: Failed to load resource\nSource: {}:{}:{}",
                    file,
                    position(event.lineno),
                    position(event.colno)
                ),
                None => return,
            },
        };
        self.log(LogType::Error, LogMessage::Text(text));
    }
}

fn position(n: Option<u32>) -> String {
    match n {
        Some(n) if n > 0 => n.to_string(),
        _ => "?".to_string(),
    }
}

/// Installs console capture into a page context.
pub struct CaptureSession;

impl CaptureSession {
    /// Wrap the console and error hooks of `page`, posting events to `port`.
    ///
    /// Fails with [`CaptureError::AlreadyInstalled`] if a session is live in
    /// this context.
    pub fn install(
        page: &PageContext,
        port: Arc<dyn MessagePort>,
    ) -> Result<CaptureHandle, CaptureError> {
        if !page.set_marker(INSTALL_MARKER) {
            return Err(CaptureError::AlreadyInstalled);
        }

        let emitter = Arc::new(Emitter {
            port,
            native_error: page.method(ConsoleMethod::Error),
            groups: Mutex::new(GroupState::default()),
        });

        let mut originals = HashMap::new();
        for method in ConsoleMethod::ALL {
            let original = page.method(method);
            let wrapper = wrap_method(method, original.clone(), emitter.clone());
            page.set_method(method, wrapper);
            originals.insert(method, original);
        }

        let previous_onerror = page.onerror();
        let chained = previous_onerror.clone();
        let hook = emitter.clone();
        page.set_onerror(Some(Arc::new(move |event: &ErrorEvent| {
            // Suppression is the page handler's decision alone.
            let suppressed = chained.as_ref().map(|h| h(event)).unwrap_or(false);
            hook.on_uncaught(event);
            suppressed
        })));

        let previous_rejection = page.onunhandledrejection();
        let chained = previous_rejection.clone();
        let hook = emitter.clone();
        page.set_onunhandledrejection(Some(Arc::new(move |reason: &Value| {
            if let Some(handler) = &chained {
                handler(reason);
            }
            hook.on_rejection(reason);
        })));

        let hook = emitter.clone();
        let listener = page.add_error_listener(
            Arc::new(move |event: &ErrorEvent| hook.on_resource_error(event)),
            true,
        );

        tracing::debug!("console capture installed");

        Ok(CaptureHandle {
            page: page.clone(),
            emitter,
            originals,
            previous_onerror,
            previous_rejection,
            listener,
            installed: true,
        })
    }

    /// Whether a session is live in `page`.
    pub fn is_installed(page: &PageContext) -> bool {
        page.has_marker(INSTALL_MARKER)
    }
}

fn wrap_method(method: ConsoleMethod, original: MethodFn, emitter: Arc<Emitter>) -> MethodFn {
    match method {
        ConsoleMethod::Table => Arc::new(move |args: &[Value]| {
            original(args);
            emitter.on_table(args);
        }),
        ConsoleMethod::Group | ConsoleMethod::GroupCollapsed => {
            let collapsed = method == ConsoleMethod::GroupCollapsed;
            Arc::new(move |args: &[Value]| {
                original(args);
                emitter.on_group(args, collapsed);
            })
        }
        ConsoleMethod::GroupEnd => Arc::new(move |args: &[Value]| {
            original(args);
            emitter.on_group_end();
        }),
        ConsoleMethod::Log
        | ConsoleMethod::Info
        | ConsoleMethod::Warn
        | ConsoleMethod::Error
        | ConsoleMethod::Debug => {
            let log_type = method.log_type().unwrap_or(LogType::Log);
            Arc::new(move |args: &[Value]| {
                original(args);
                emitter.on_console(log_type, args);
            })
        }
    }
}

/// A live capture session. Dropping it uninstalls.
pub struct CaptureHandle {
    page: PageContext,
    emitter: Arc<Emitter>,
    originals: HashMap<ConsoleMethod, MethodFn>,
    previous_onerror: Option<ErrorHandler>,
    previous_rejection: Option<RejectionHandler>,
    listener: ListenerId,
    installed: bool,
}

impl CaptureHandle {
    /// Current group nesting depth.
    pub fn group_depth(&self) -> u32 {
        self.emitter.depth()
    }

    /// Labels and collapse flags of the open groups, outermost first.
    pub fn open_groups(&self) -> Vec<(String, bool)> {
        self.emitter
            .groups
            .lock()
            .stack
            .iter()
            .map(|frame| (frame.label.plain_text(), frame.collapsed))
            .collect()
    }

    /// Restore everything the session replaced.
    pub fn uninstall(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if !self.installed {
            return;
        }
        self.installed = false;

        for (method, original) in self.originals.drain() {
            self.page.set_method(method, original);
        }
        self.page.set_onerror(self.previous_onerror.take());
        self.page.set_onunhandledrejection(self.previous_rejection.take());
        self.page.remove_error_listener(self.listener);
        self.page.clear_marker(INSTALL_MARKER);

        tracing::debug!("console capture uninstalled");
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryConsole;
    use bridge::{Inbound, PageChannel};
    use serde_json::Value as Json;

    /// Port that keeps every posted payload.
    #[derive(Default)]
    struct RecordingPort {
        posted: Mutex<Vec<Json>>,
    }

    impl RecordingPort {
        fn events(&self) -> Vec<LogEvent> {
            self.posted
                .lock()
                .iter()
                .map(|p| serde_json::from_value(p["data"].clone()).unwrap())
                .collect()
        }
    }

    impl MessagePort for RecordingPort {
        fn post_message(&self, message: Json) -> bridge::BridgeResult<()> {
            self.posted.lock().push(message);
            Ok(())
        }
    }

    struct BrokenPort;

    impl MessagePort for BrokenPort {
        fn post_message(&self, _: Json) -> bridge::BridgeResult<()> {
            Err(BridgeError::NoAcknowledgment)
        }
    }

    fn setup() -> (PageContext, Arc<MemoryConsole>, Arc<RecordingPort>, CaptureHandle) {
        let native = Arc::new(MemoryConsole::new());
        let page = PageContext::new(native.clone());
        let port = Arc::new(RecordingPort::default());
        let handle = CaptureSession::install(&page, port.clone()).unwrap();
        (page, native, port, handle)
    }

    #[test]
    fn test_log_reaches_native_and_port() {
        let (page, native, port, _handle) = setup();
        page.console().log(&["%cHello".into(), "color: red".into()]);

        assert_eq!(native.calls_to(ConsoleMethod::Log).len(), 1);
        let events = port.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].log_type, LogType::Log);
        match &events[0].message {
            LogMessage::Styled(message) => {
                assert!(message.has_styles);
                assert_eq!(message.parts[0].text, "Hello");
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_group_depths() {
        let (page, _, port, handle) = setup();
        let console = page.console();
        console.group(&["X".into()]);
        console.log(&["a".into()]);
        console.group_collapsed(&[]);
        assert_eq!(
            handle.open_groups(),
            vec![("X".to_string(), false), ("Group".to_string(), true)]
        );
        console.log(&["b".into()]);
        console.group_end();
        console.group_end();
        console.group_end();
        assert_eq!(handle.group_depth(), 0);

        let events = port.events();
        let shape: Vec<(LogType, u32, bool)> = events
            .iter()
            .map(|e| (e.log_type, e.group_depth, e.is_group_start))
            .collect();
        assert_eq!(
            shape,
            vec![
                (LogType::Group, 0, true),
                (LogType::Log, 1, false),
                (LogType::Group, 1, true),
                (LogType::Log, 2, false),
                (LogType::GroupEnd, 1, false),
                (LogType::GroupEnd, 0, false),
            ]
        );
        assert!(events[2].collapsed);
        assert_eq!(events[2].message, LogMessage::Text("Group".into()));
        assert!(events[1].in_group);
    }

    #[test]
    fn test_table_variants() {
        let (page, native, port, _handle) = setup();
        let console = page.console();

        console.table(&[]);
        assert_eq!(native.calls_to(ConsoleMethod::Table).len(), 1);
        assert!(port.events().is_empty());

        console.table(&[Value::array([1, 2])]);
        console.table(&[Value::from(5)]);

        let events = port.events();
        assert_eq!(events.len(), 2);
        let grid = events[0].message.plain_text();
        assert!(grid.starts_with("Table:\n┌"));
        assert!(grid.ends_with("Original object:\n(2) [1, 2]"));
        assert_eq!(events[1].message.plain_text(), "5\n\nOriginal object:\n5");
    }

    #[test]
    fn test_table_with_throwing_cell() {
        let (page, _, port, _handle) = setup();
        let row = common::JsObject::new();
        row.define_getter("a", || Err(common::Thrown::new("nope")));
        page.console().table(&[Value::array([Value::Object(row)])]);
        assert!(port.events()[0].message.plain_text().starts_with("Table: "));
    }

    #[test]
    fn test_uncaught_error_chains_previous_handler() {
        let native = Arc::new(MemoryConsole::new());
        let page = PageContext::new(native.clone());
        let seen = Arc::new(Mutex::new(0));
        let counter = seen.clone();
        page.set_onerror(Some(Arc::new(move |_: &ErrorEvent| {
            *counter.lock() += 1;
            true
        })));

        let port = Arc::new(RecordingPort::default());
        let _handle = CaptureSession::install(&page, port.clone()).unwrap();

        let error = Value::error("TypeError", "x is undefined", Some("at f (app.js:1:1)"));
        let suppressed = page.report_error(&ErrorEvent::script("x is undefined", Some(error)));

        assert!(suppressed);
        assert_eq!(*seen.lock(), 1);
        assert_eq!(
            port.events()[0].message.plain_text(),
            "TypeError: x is undefined\nat f (app.js:1:1)"
        );
    }

    #[test]
    fn test_uncaught_error_without_stack() {
        let (page, native, port, _handle) = setup();
        let event = ErrorEvent::script("boom", None).with_location("app.js", 3, 7);
        assert!(!page.report_error(&event));
        assert_eq!(port.events()[0].message.plain_text(), "boom at app.js:3:7");
        // The page still reports its own uncaught error.
        assert_eq!(native.calls_to(ConsoleMethod::Error)[0].text, "Uncaught boom");
    }

    #[test]
    fn test_unhandled_rejection() {
        let (page, _, port, _handle) = setup();
        page.report_unhandled_rejection(&Value::error("Error", "late", None));
        page.report_unhandled_rejection(&Value::from("plain"));

        let events = port.events();
        assert_eq!(
            events[0].message.plain_text(),
            "Unhandled Promise Rejection: Error: late"
        );
        assert_eq!(
            events[1].message.plain_text(),
            "Unhandled Promise Rejection: plain"
        );
        assert!(events.iter().all(|e| e.log_type == LogType::Error));
    }

    #[test]
    fn test_resource_errors() {
        let (page, _, port, _handle) = setup();
        page.report_error(&ErrorEvent::resource("IMG", "https://cdn.test/a.png"));
        page.report_error(
            &ErrorEvent::script("", None)
                .with_target(EventTarget::Document)
                .with_location("https://cdn.test/app.js", 0, 0),
        );

        let texts: Vec<String> = port.events().iter().map(|e| e.message.plain_text()).collect();
        assert_eq!(
            texts,
            vec![
                "Resource Error: IMG failed to load\nSource: https://cdn.test/a.png".to_string(),
                "Resource Error: Failed to load resource\nSource: https://cdn.test/app.js:?:?"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_script_error_is_not_reported_as_resource_error() {
        let (page, _, port, _handle) = setup();
        let error = Value::error("Error", "bad", Some("stack"));
        page.report_error(&ErrorEvent::script("bad", Some(error)).with_location("a.js", 1, 1));
        // Only the onerror path reports it.
        assert_eq!(port.events().len(), 1);
    }

    #[test]
    fn test_double_install_is_rejected() {
        let (page, _, _, _handle) = setup();
        let again = CaptureSession::install(&page, Arc::new(RecordingPort::default()));
        assert!(matches!(again, Err(CaptureError::AlreadyInstalled)));
    }

    #[test]
    fn test_uninstall_restores_everything() {
        let (page, native, port, handle) = setup();
        handle.uninstall();

        assert!(!CaptureSession::is_installed(&page));
        assert!(page.onerror().is_none());
        assert!(page.onunhandledrejection().is_none());
        assert_eq!(page.error_listener_count(), 0);

        page.console().log(&["after".into()]);
        page.console().group(&["g".into()]);
        assert!(port.events().is_empty());
        assert_eq!(native.calls().len(), 2);

        // A fresh session can be installed after teardown.
        let _again = CaptureSession::install(&page, port.clone()).unwrap();
    }

    #[test]
    fn test_drop_uninstalls() {
        let native = Arc::new(MemoryConsole::new());
        let page = PageContext::new(native);
        {
            let _handle =
                CaptureSession::install(&page, Arc::new(RecordingPort::default())).unwrap();
            assert!(CaptureSession::is_installed(&page));
        }
        assert!(!CaptureSession::is_installed(&page));
    }

    #[test]
    fn test_post_failure_goes_to_native_error() {
        let native = Arc::new(MemoryConsole::new());
        let page = PageContext::new(native.clone());
        let _handle = CaptureSession::install(&page, Arc::new(BrokenPort)).unwrap();

        page.console().info(&["hello".into()]);

        let errors = native.calls_to(ConsoleMethod::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].text.starts_with("Float Console: Failed to post log message"));
    }

    #[test]
    fn test_events_cross_page_channel() {
        let native = Arc::new(MemoryConsole::new());
        let page = PageContext::new(native);
        let channel = PageChannel::new();
        let mut listener = channel.listen();
        let _handle = CaptureSession::install(&page, Arc::new(channel.clone())).unwrap();

        page.console().warn(&["careful".into()]);

        let received = listener.drain();
        assert_eq!(received.len(), 1);
        assert!(matches!(
            &received[0],
            Inbound::Log(event) if event.log_type == LogType::Warn
                && event.message.plain_text() == "careful"
        ));
    }
}
