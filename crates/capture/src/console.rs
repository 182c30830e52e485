//! Native console backends.
//!
//! The native console is whatever the page's console printed to before
//! capture was installed. Capture always calls it first, so page output is
//! never suppressed.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{LogType, Value};
use console_format::format_args;

/// Console methods the capture layer wraps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConsoleMethod {
    Log,
    Info,
    Warn,
    Error,
    Debug,
    Table,
    Group,
    GroupCollapsed,
    GroupEnd,
}

impl ConsoleMethod {
    pub const ALL: [ConsoleMethod; 9] = [
        ConsoleMethod::Log,
        ConsoleMethod::Info,
        ConsoleMethod::Warn,
        ConsoleMethod::Error,
        ConsoleMethod::Debug,
        ConsoleMethod::Table,
        ConsoleMethod::Group,
        ConsoleMethod::GroupCollapsed,
        ConsoleMethod::GroupEnd,
    ];

    /// Property name on the console object.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleMethod::Log => "log",
            ConsoleMethod::Info => "info",
            ConsoleMethod::Warn => "warn",
            ConsoleMethod::Error => "error",
            ConsoleMethod::Debug => "debug",
            ConsoleMethod::Table => "table",
            ConsoleMethod::Group => "group",
            ConsoleMethod::GroupCollapsed => "groupCollapsed",
            ConsoleMethod::GroupEnd => "groupEnd",
        }
    }

    /// Entry type for the plain logging methods.
    pub fn log_type(&self) -> Option<LogType> {
        match self {
            ConsoleMethod::Log => Some(LogType::Log),
            ConsoleMethod::Info => Some(LogType::Info),
            ConsoleMethod::Warn => Some(LogType::Warn),
            ConsoleMethod::Error => Some(LogType::Error),
            ConsoleMethod::Debug => Some(LogType::Debug),
            _ => None,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            ConsoleMethod::Info => "[INFO] ",
            ConsoleMethod::Warn => "[WARN] ",
            ConsoleMethod::Error => "[ERROR] ",
            ConsoleMethod::Debug => "[DEBUG] ",
            _ => "",
        }
    }

    fn to_stderr(&self) -> bool {
        matches!(self, ConsoleMethod::Warn | ConsoleMethod::Error)
    }
}

/// The console the page had before capture.
pub trait NativeConsole: Send + Sync {
    fn call(&self, method: ConsoleMethod, args: &[Value]);
}

/// Prints to stdout/stderr with level prefixes and group indentation.
#[derive(Debug, Default)]
pub struct StdConsole {
    indent: AtomicUsize,
}

impl StdConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self, method: ConsoleMethod, text: &str) {
        let pad = "  ".repeat(self.indent.load(Ordering::Relaxed));
        if method.to_stderr() {
            eprintln!("{}{}{}", pad, method.prefix(), text);
        } else {
            println!("{}{}{}", pad, method.prefix(), text);
        }
    }
}

impl NativeConsole for StdConsole {
    fn call(&self, method: ConsoleMethod, args: &[Value]) {
        let text = format_args(args).plain_text();
        match method {
            ConsoleMethod::Group | ConsoleMethod::GroupCollapsed => {
                let marker = if method == ConsoleMethod::Group { "▼" } else { "▶" };
                let label = if text.is_empty() { "console.group" } else { &text };
                self.line(method, &format!("{} {}", marker, label));
                self.indent.fetch_add(1, Ordering::Relaxed);
            }
            ConsoleMethod::GroupEnd => {
                let _ = self
                    .indent
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
            }
            _ => self.line(method, &text),
        }
    }
}

/// One call seen by a [`MemoryConsole`].
#[derive(Clone, Debug, PartialEq)]
pub struct NativeCall {
    pub method: ConsoleMethod,
    pub text: String,
}

/// Records calls instead of printing them.
#[derive(Debug, Default)]
pub struct MemoryConsole {
    calls: Mutex<Vec<NativeCall>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NativeCall> {
        self.calls.lock().clone()
    }

    /// Recorded calls of one method.
    pub fn calls_to(&self, method: ConsoleMethod) -> Vec<NativeCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl NativeConsole for MemoryConsole {
    fn call(&self, method: ConsoleMethod, args: &[Value]) {
        let text = format_args(args).plain_text();
        self.calls.lock().push(NativeCall { method, text });
    }
}
