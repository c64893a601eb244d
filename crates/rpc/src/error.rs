//! Transport-level errors: framing and (de)serialization failures.
//!
//! These are distinct from [`crate::Status`], which classifies *application*
//! failures the coordinator produces; this enum only covers failures to
//! even get a [`crate::Message`] on or off the wire.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection closed")]
    Closed,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Decode(#[from] bincode::Error),
    #[error("unsupported protocol version {got}, expected {expected}")]
    VersionMismatch { got: u8, expected: u8 },
}
