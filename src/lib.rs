//! Gemini → Claude streaming bridge.
//!
//! This library translates the incremental JSON responses emitted by
//! Gemini-style backends into the Server-Sent Events contract expected by
//! Claude Code clients, with support for:
//!
//! - **Streaming translation**: a per-session state machine that opens and
//!   closes target content blocks (text, thinking, tool use) as the upstream
//!   content type changes mid-stream
//! - **Web-search grounding**: buffered grounding data emitted as a canonical
//!   tool-use / tool-result / citations / text block sequence
//! - **Signature correlation**: reasoning text and its cryptographic
//!   signature arrive in separate chunks and are rejoined through a
//!   process-wide cache
//! - **Usage accounting**: normalized prompt/output/cache token counts,
//!   identical between the streaming and non-streaming paths
//! - **Model-alias mapping**: sanitize-then-apply renaming of backend model
//!   ids, with one-to-many and fork support
//!
//! # Architecture
//!
//! The codebase is organized into three layers:
//!
//! - [`core`]: Shared infrastructure (errors, id generation, signature cache)
//! - [`translator`]: The streaming and non-streaming response translators
//! - [`mapping`]: The model-alias table utility
//!
//! The translators are synchronous, non-blocking transforms of in-memory
//! state: chunk delivery, backpressure, and cancellation belong to the
//! caller. Independent sessions may run fully in parallel; the signature
//! cache is the only shared resource.

pub mod core;
pub mod mapping;
pub mod translator;

// Re-export commonly used types for convenience
pub use crate::core::{
    derive_session_key, IdGenerator, Result, SequentialIdGenerator, SignatureCache,
    TranslateError, UuidIdGenerator,
};
pub use mapping::{apply_alias_entries, sanitize_alias_table, AliasEntry, ModelEntry};
pub use translator::{
    ContentBlock, Delta, MessageDocument, NonStreamTranslator, StreamFrame, StreamInput,
    StreamSession, StreamTranslator,
};
