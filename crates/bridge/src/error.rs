//! Transport errors.

use thiserror::Error;

use crate::router::TabId;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("No receiving end for tab {0}")]
    NoReceiver(TabId),

    #[error("Request was dropped without acknowledgment")]
    NoAcknowledgment,

    #[error("Timed out waiting for acknowledgment")]
    Timeout,

    #[error("Command rejected: {0}")]
    Rejected(String),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl From<BridgeError> for common::ConsoleError {
    fn from(err: BridgeError) -> Self {
        common::ConsoleError::transport(err.to_string())
    }
}
