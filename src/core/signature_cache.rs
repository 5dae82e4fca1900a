//! Process-wide cache correlating reasoning text with its signature.
//!
//! Gemini backends deliver the cryptographic signature for a thinking span
//! in a later chunk than the span's text. The streaming translator
//! accumulates the text, and once the signature arrives it records the pair
//! here so subsequent requests can replay signed thinking blocks.
//!
//! The cache is keyed by `(session key, reasoning text)`. Unrelated sessions
//! insert and look up concurrently without coordination; within one session
//! writes arrive from a single sequential chunk stream.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

static GLOBAL: Lazy<Arc<SignatureCache>> = Lazy::new(|| Arc::new(SignatureCache::new()));

/// The process-wide default cache instance.
pub fn global_signature_cache() -> Arc<SignatureCache> {
    GLOBAL.clone()
}

/// Derive a stable session key from the original inbound request payload.
///
/// The key is computed from the request the *client* sent, not the per-chunk
/// upstream payload, so it is identical across every chunk of one turn.
pub fn derive_session_key(original_request: &[u8]) -> String {
    hex::encode(Sha256::digest(original_request))
}

/// Concurrent `(session key, reasoning text) → signature` store.
pub struct SignatureCache {
    entries: DashMap<(String, String), String>,
}

impl SignatureCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Record the signature for a reasoning span.
    pub fn put(&self, session_key: &str, text: &str, signature: &str) {
        tracing::debug!(
            session_key,
            text_len = text.len(),
            "caching thinking signature"
        );
        self.entries.insert(
            (session_key.to_string(), fingerprint(text)),
            signature.to_string(),
        );
    }

    /// Look up the signature previously recorded for a reasoning span.
    pub fn get(&self, session_key: &str, text: &str) -> Option<String> {
        self.entries
            .get(&(session_key.to_string(), fingerprint(text)))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SignatureCache {
    fn default() -> Self {
        Self::new()
    }
}

// Reasoning spans can be arbitrarily long; store a digest instead of the
// text itself so cache keys stay bounded.
fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

// ============================================================================
// Tests
// ============================================================================
