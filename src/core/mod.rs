//! Shared infrastructure for the bridge.
//!
//! This module contains components used by both translators:
//! - Error handling
//! - Id generation
//! - The process-wide signature cache

pub mod error;
pub mod id;
pub mod signature_cache;

// Re-export commonly used types
pub use error::{Result, TranslateError};
pub use id::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use signature_cache::{derive_session_key, global_signature_cache, SignatureCache};
