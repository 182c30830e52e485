//! Console capture for the monitored page context.
//!
//! A [`PageContext`] stands in for the page: it owns the console method
//! table, the global error hooks and the capturing `error` listeners.
//! [`CaptureSession::install`] wraps all of them so every call still reaches
//! the page's own console and handlers, and additionally posts a structured
//! [`bridge::LogEvent`] over a [`bridge::MessagePort`].

pub mod console;
pub mod error;
pub mod page;
pub mod session;

pub use console::{ConsoleMethod, MemoryConsole, NativeConsole, NativeCall, StdConsole};
pub use error::CaptureError;
pub use page::{ErrorEvent, EventTarget, ListenerId, PageConsole, PageContext};
pub use session::{CaptureHandle, CaptureSession, INSTALL_MARKER};
