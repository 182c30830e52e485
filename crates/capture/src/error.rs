//! Capture errors.

use thiserror::Error;

use bridge::BridgeError;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Console capture is already installed in this context")]
    AlreadyInstalled,

    #[error("Failed to post log message: {0}")]
    Post(#[from] BridgeError),
}

impl From<CaptureError> for common::ConsoleError {
    fn from(err: CaptureError) -> Self {
        common::ConsoleError::capture(err.to_string())
    }
}
