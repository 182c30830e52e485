//! Hard limits.
//!
//! These bound the work done per console call and the memory held by the
//! display side. They are constants, not configuration.

/// Serializer recursion cap.
pub const MAX_SERIALIZE_DEPTH: usize = 10;

/// Own keys serialized per object.
pub const MAX_OBJECT_KEYS: usize = 50;

/// Rows rendered in a table grid.
pub const MAX_TABLE_ROWS: usize = 100;

/// Table column width bounds.
pub const MIN_COLUMN_WIDTH: usize = 8;
pub const MAX_COLUMN_WIDTH: usize = 50;

/// Log buffer capacity.
pub const LOG_RETENTION_LIMIT: usize = 10_000;

/// Entries dropped when the buffer is full (10%).
pub const EVICTION_BATCH: usize = LOG_RETENTION_LIMIT / 10;

/// Accepted clock skew for inbound timestamps, in milliseconds.
pub const CLOCK_SKEW_TOLERANCE_MS: f64 = 1000.0;

/// Log font size bounds.
pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 24;
pub const DEFAULT_FONT_SIZE: u32 = 12;
