//! Transport between the capture context and the display context.
//!
//! Two shapes cross the boundary:
//! - log events, broadcast fire-and-forget over the page channel inside a
//!   tagged envelope and validated on receipt
//! - control commands, addressed to a tab and acknowledged, sent with a
//!   bounded retry

pub mod channel;
pub mod command;
pub mod envelope;
pub mod error;
pub mod retry;
pub mod router;

pub use channel::{MessagePort, PageChannel, PageListener};
pub use command::{AckStatus, CommandAck, CommandParse, ControlCommand, DockPosition};
pub use envelope::{Inbound, LogEvent, LogMessage, ReceiverStats, Rejection};
pub use error::{BridgeError, BridgeResult};
pub use retry::RetryPolicy;
pub use router::{CommandBus, CommandInbox, IncomingCommand, TabId};
