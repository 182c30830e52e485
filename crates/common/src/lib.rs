//! Common types shared by the Float Console crates.
//!
//! - [`Value`]: values as they exist in the monitored page context
//! - [`LogType`]: the closed set of log entry kinds
//! - [`ConsoleError`]: the umbrella error type
//! - [`limits`]: hard caps that keep formatting bounded

pub mod error;
pub mod limits;
pub mod log_type;
pub mod time;
pub mod value;

pub use error::{ConsoleError, ConsoleResult};
pub use log_type::LogType;
pub use value::{Getter, JsArray, JsObject, Property, Thrown, Value};

/// Product name used in diagnostics.
pub const PRODUCT_NAME: &str = "Float Console";
