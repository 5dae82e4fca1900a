//! Error types for the bridge.
//!
//! Malformed or absent *fields* inside an upstream chunk are never errors:
//! they degrade to defaults so a bad chunk cannot abort a session or lose
//! accumulated state. The only failures surfaced to the caller are
//! integration errors that should fail loudly at the call site.

use thiserror::Error;

/// Main error type for the translation layer.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// The caller handed over a payload that is not JSON where JSON was
    /// mandatory (a transport framing bug, not a stream-data condition).
    #[error("invalid upstream payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TranslateError>;
