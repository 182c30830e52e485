//! Formatting errors.

use common::Thrown;
use thiserror::Error;

/// Errors raised while building display text.
///
/// These never escape a console call: callers replace the failed piece with
/// a fallback representation.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Value cannot be shown as a table: {0}")]
    UnsupportedTableShape(&'static str),

    #[error("Exception while reading value: {0}")]
    Thrown(#[from] Thrown),
}
