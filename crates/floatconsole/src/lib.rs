//! Float Console - an in-page console overlay.
//!
//! This crate wires the console components together:
//! - Console capture inside the monitored page
//! - The page channel and tab-addressed control commands
//! - The bounded log buffer behind a single-writer queue
//! - The docked panel and the popup that controls it
//! - Keyboard shortcut and first-install handlers

pub mod background;
pub mod config;
pub mod engine;
pub mod popup;

pub use background::{Background, InstallReason};
pub use config::FloatConsoleConfig;
pub use engine::ConsoleEngine;
pub use popup::PopupController;

/// Float Console version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
