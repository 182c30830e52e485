//! Console panel.
//!
//! This crate turns the log buffer into what the user sees:
//! - Group reconstruction and type/text filtering
//! - Pinned-first sorting, clamping and auto-scroll
//! - Escaped HTML rendering and themes
//! - Settings and the external settings store
//! - The panel state machine, debounced filter input and notices

pub mod debounce;
pub mod filter;
pub mod grouping;
pub mod html;
pub mod notice;
pub mod panel;
pub mod settings;
pub mod storage;
pub mod theme;
pub mod view;

pub use debounce::Debouncer;
pub use filter::{LogFilter, LogTypeSet};
pub use grouping::{build_display, DisplayEntry, GroupNode};
pub use notice::{Notice, NoticeKind, Notices};
pub use panel::{ConsolePanel, PanelFrame, RowAction};
pub use settings::Settings;
pub use storage::{load_settings, MemorySettingsStore, SettingsError, SettingsStore};
pub use theme::UiTheme;
pub use view::{LogView, ViewFrame};
