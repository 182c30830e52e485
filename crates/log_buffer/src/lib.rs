//! Bounded log storage for the display context.
//!
//! [`LogBuffer`] is the store itself; [`BufferWriter`] is the single-writer
//! queue that every mutation goes through once capture and display run on
//! separate tasks.

pub mod buffer;
pub mod entry;
pub mod writer;

pub use buffer::LogBuffer;
pub use entry::{EntryId, LogEntry};
pub use writer::{BufferChange, BufferWriter, SharedBuffer};
