//! The monitored page context.
//!
//! Holds the mutable globals console capture has to patch: the console
//! method table, `onerror`, `onunhandledrejection`, capturing `error`
//! listeners and context-wide markers. Page code runs against it through
//! [`PageContext::console`] and the `report_*` dispatch methods.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use common::Value;

use crate::console::{ConsoleMethod, NativeConsole, StdConsole};

/// A console method implementation.
pub type MethodFn = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// `onerror`: returns `true` to suppress the default report.
pub type ErrorHandler = Arc<dyn Fn(&ErrorEvent) -> bool + Send + Sync>;

/// `onunhandledrejection`.
pub type RejectionHandler = Arc<dyn Fn(&Value) + Send + Sync>;

/// An `error` event listener.
pub type ErrorListener = Arc<dyn Fn(&ErrorEvent) + Send + Sync>;

/// Where an `error` event was dispatched.
#[derive(Clone, Debug, PartialEq)]
pub enum EventTarget {
    Window,
    Document,
    Element {
        tag_name: String,
        src: Option<String>,
        href: Option<String>,
    },
}

/// An `error` event.
#[derive(Clone, Debug)]
pub struct ErrorEvent {
    pub message: String,
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    pub colno: Option<u32>,
    /// The thrown value, for script errors.
    pub error: Option<Value>,
    pub target: EventTarget,
}

impl ErrorEvent {
    /// An uncaught script error.
    pub fn script(message: impl Into<String>, error: Option<Value>) -> Self {
        Self {
            message: message.into(),
            filename: None,
            lineno: None,
            colno: None,
            error,
            target: EventTarget::Window,
        }
    }

    /// A failed element load (`<img>`, `<script>`, `<link>`...).
    pub fn resource(tag_name: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            message: String::new(),
            filename: None,
            lineno: None,
            colno: None,
            error: None,
            target: EventTarget::Element {
                tag_name: tag_name.into(),
                src: Some(src.into()),
                href: None,
            },
        }
    }

    pub fn with_location(mut self, filename: impl Into<String>, lineno: u32, colno: u32) -> Self {
        self.filename = Some(filename.into());
        self.lineno = Some(lineno);
        self.colno = Some(colno);
        self
    }

    pub fn with_target(mut self, target: EventTarget) -> Self {
        self.target = target;
        self
    }
}

/// Handle returned by [`PageContext::add_error_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    capture: bool,
    callback: ErrorListener,
}

struct PageInner {
    native: Arc<dyn NativeConsole>,
    methods: RwLock<HashMap<ConsoleMethod, MethodFn>>,
    onerror: RwLock<Option<ErrorHandler>>,
    onunhandledrejection: RwLock<Option<RejectionHandler>>,
    listeners: RwLock<Vec<Listener>>,
    markers: RwLock<HashSet<String>>,
    next_listener: AtomicU64,
}

/// Shared handle to one page context.
#[derive(Clone)]
pub struct PageContext {
    inner: Arc<PageInner>,
}

impl PageContext {
    /// A context whose console methods forward to `native`.
    pub fn new(native: Arc<dyn NativeConsole>) -> Self {
        let methods = ConsoleMethod::ALL
            .iter()
            .map(|&method| {
                let native = native.clone();
                let f: MethodFn = Arc::new(move |args: &[Value]| native.call(method, args));
                (method, f)
            })
            .collect();

        Self {
            inner: Arc::new(PageInner {
                native,
                methods: RwLock::new(methods),
                onerror: RwLock::new(None),
                onunhandledrejection: RwLock::new(None),
                listeners: RwLock::new(Vec::new()),
                markers: RwLock::new(HashSet::new()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    /// A context printing to the process's stdout/stderr.
    pub fn with_std_console() -> Self {
        Self::new(Arc::new(StdConsole::new()))
    }

    /// The page's `console` object.
    pub fn console(&self) -> PageConsole<'_> {
        PageConsole { page: self }
    }

    /// Call a console method as page code would.
    pub fn call(&self, method: ConsoleMethod, args: &[Value]) {
        // Clone out so the method can reenter the table.
        let f = self.method(method);
        f(args);
    }

    pub fn method(&self, method: ConsoleMethod) -> MethodFn {
        match self.inner.methods.read().get(&method) {
            Some(f) => f.clone(),
            None => {
                let native = self.inner.native.clone();
                Arc::new(move |args: &[Value]| native.call(method, args))
            }
        }
    }

    /// Replace a console method, returning the previous one.
    pub fn set_method(&self, method: ConsoleMethod, f: MethodFn) -> Option<MethodFn> {
        self.inner.methods.write().insert(method, f)
    }

    pub fn onerror(&self) -> Option<ErrorHandler> {
        self.inner.onerror.read().clone()
    }

    /// Assign `onerror`, returning the previous handler.
    pub fn set_onerror(&self, handler: Option<ErrorHandler>) -> Option<ErrorHandler> {
        std::mem::replace(&mut *self.inner.onerror.write(), handler)
    }

    pub fn onunhandledrejection(&self) -> Option<RejectionHandler> {
        self.inner.onunhandledrejection.read().clone()
    }

    pub fn set_onunhandledrejection(
        &self,
        handler: Option<RejectionHandler>,
    ) -> Option<RejectionHandler> {
        std::mem::replace(&mut *self.inner.onunhandledrejection.write(), handler)
    }

    pub fn add_error_listener(&self, callback: ErrorListener, capture: bool) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.write().push(Listener {
            id,
            capture,
            callback,
        });
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn remove_error_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    pub fn error_listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Set a marker. Returns `false` if it was already set.
    pub fn set_marker(&self, name: &str) -> bool {
        self.inner.markers.write().insert(name.to_string())
    }

    pub fn has_marker(&self, name: &str) -> bool {
        self.inner.markers.read().contains(name)
    }

    pub fn clear_marker(&self, name: &str) -> bool {
        self.inner.markers.write().remove(name)
    }

    /// Dispatch an `error` event.
    ///
    /// Capturing listeners run first, then bubbling ones. Script errors
    /// (window target) then reach `onerror`, and unless it returns `true`
    /// the native console reports them as uncaught. Returns whether the
    /// default report was suppressed.
    pub fn report_error(&self, event: &ErrorEvent) -> bool {
        let listeners: Vec<(bool, ErrorListener)> = self
            .inner
            .listeners
            .read()
            .iter()
            .map(|l| (l.capture, l.callback.clone()))
            .collect();
        for phase in [true, false] {
            for (capture, callback) in &listeners {
                if *capture == phase {
                    callback(event);
                }
            }
        }

        if event.target != EventTarget::Window {
            return false;
        }

        let suppressed = self.onerror().map(|h| h(event)).unwrap_or(false);
        if !suppressed {
            let detail = match &event.error {
                Some(error) => error.to_js_string(),
                None => event.message.clone(),
            };
            self.inner
                .native
                .call(ConsoleMethod::Error, &[Value::from(format!("Uncaught {}", detail))]);
        }
        suppressed
    }

    /// Report a promise rejection nobody handled.
    pub fn report_unhandled_rejection(&self, reason: &Value) {
        match self.onunhandledrejection() {
            Some(handler) => handler(reason),
            None => self.inner.native.call(
                ConsoleMethod::Error,
                &[Value::from(format!(
                    "Uncaught (in promise) {}",
                    reason.to_js_string()
                ))],
            ),
        }
    }
}

impl Default for PageContext {
    fn default() -> Self {
        Self::with_std_console()
    }
}

/// The page's `console` object.
pub struct PageConsole<'a> {
    page: &'a PageContext,
}

impl PageConsole<'_> {
    pub fn log(&self, args: &[Value]) {
        self.page.call(ConsoleMethod::Log, args);
    }

    pub fn info(&self, args: &[Value]) {
        self.page.call(ConsoleMethod::Info, args);
    }

    pub fn warn(&self, args: &[Value]) {
        self.page.call(ConsoleMethod::Warn, args);
    }

    pub fn error(&self, args: &[Value]) {
        self.page.call(ConsoleMethod::Error, args);
    }

    pub fn debug(&self, args: &[Value]) {
        self.page.call(ConsoleMethod::Debug, args);
    }

    pub fn table(&self, args: &[Value]) {
        self.page.call(ConsoleMethod::Table, args);
    }

    pub fn group(&self, args: &[Value]) {
        self.page.call(ConsoleMethod::Group, args);
    }

    pub fn group_collapsed(&self, args: &[Value]) {
        self.page.call(ConsoleMethod::GroupCollapsed, args);
    }

    pub fn group_end(&self) {
        self.page.call(ConsoleMethod::GroupEnd, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryConsole;
    use parking_lot::Mutex;

    fn page() -> (PageContext, Arc<MemoryConsole>) {
        let native = Arc::new(MemoryConsole::new());
        (PageContext::new(native.clone()), native)
    }

    #[test]
    fn test_console_forwards_to_native() {
        let (page, native) = page();
        page.console().warn(&["careful".into()]);
        assert_eq!(native.calls_to(ConsoleMethod::Warn)[0].text, "careful");
    }

    #[test]
    fn test_set_method_returns_previous() {
        let (page, native) = page();
        let seen = Arc::new(Mutex::new(0));
        let counter = seen.clone();
        let previous = page.set_method(
            ConsoleMethod::Log,
            Arc::new(move |_: &[Value]| *counter.lock() += 1),
        );
        assert!(previous.is_some());

        page.console().log(&["x".into()]);
        assert_eq!(*seen.lock(), 1);
        assert!(native.calls().is_empty());
    }

    #[test]
    fn test_uncaught_error_reaches_native_unless_suppressed() {
        let (page, native) = page();
        assert!(!page.report_error(&ErrorEvent::script("boom", None)));
        assert_eq!(native.calls_to(ConsoleMethod::Error)[0].text, "Uncaught boom");

        native.clear();
        page.set_onerror(Some(Arc::new(|_: &ErrorEvent| true)));
        assert!(page.report_error(&ErrorEvent::script("boom", None)));
        assert!(native.calls().is_empty());
    }

    #[test]
    fn test_listener_phases_and_removal() {
        let (page, _) = page();
        let order = Arc::new(Mutex::new(Vec::new()));

        let bubble = order.clone();
        page.add_error_listener(Arc::new(move |_: &ErrorEvent| bubble.lock().push("bubble")), false);
        let capture = order.clone();
        let id = page.add_error_listener(
            Arc::new(move |_: &ErrorEvent| capture.lock().push("capture")),
            true,
        );

        page.report_error(&ErrorEvent::resource("IMG", "/a.png"));
        assert_eq!(*order.lock(), vec!["capture", "bubble"]);

        assert!(page.remove_error_listener(id));
        assert!(!page.remove_error_listener(id));
        assert_eq!(page.error_listener_count(), 1);
    }

    #[test]
    fn test_markers() {
        let (page, _) = page();
        assert!(page.set_marker("m"));
        assert!(!page.set_marker("m"));
        assert!(page.has_marker("m"));
        assert!(page.clear_marker("m"));
        assert!(!page.has_marker("m"));
    }

    #[test]
    fn test_unhandled_rejection_default_report() {
        let (page, native) = page();
        page.report_unhandled_rejection(&Value::from("nope"));
        assert_eq!(
            native.calls_to(ConsoleMethod::Error)[0].text,
            "Uncaught (in promise) nope"
        );
    }
}
