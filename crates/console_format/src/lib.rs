//! Console message formatting.
//!
//! Turns the argument list of a console call into display data:
//! - [`serialize`]: bounded, cycle-safe text for arbitrary page values
//! - [`format_args`]: `%c` styled span reconstruction
//! - [`render_table`]: fixed-width text grids for `console.table`

pub mod error;
pub mod format;
pub mod message;
pub mod serialize;
pub mod style;
pub mod table;

pub use error::FormatError;
pub use format::format_args;
pub use message::{Span, StyledMessage};
pub use serialize::{serialize, serialize_at};
pub use style::looks_like_css;
pub use table::{render_table, TableText};
