//! Id generation for messages and content blocks.
//!
//! Tool-use ids must be unique across the whole process, not just one
//! session, because clients key tool results off them. The generator is
//! injected into the translators so tests can substitute a deterministic
//! implementation.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of unique identifiers for emitted protocol objects.
pub trait IdGenerator: Send + Sync {
    /// Fallback message id when the upstream chunk carries no `responseId`.
    fn message_id(&self) -> String;

    /// Id for a client-visible `tool_use` block.
    fn tool_use_id(&self, tool_name: &str) -> String;

    /// Id for a `server_tool_use` (web search) block.
    fn server_tool_use_id(&self) -> String;
}

/// Default generator backed by uuid v4.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn message_id(&self) -> String {
        format!("msg_{}", Uuid::new_v4().simple())
    }

    fn tool_use_id(&self, tool_name: &str) -> String {
        format!("{}-{}", tool_name, Uuid::new_v4().simple())
    }

    fn server_tool_use_id(&self) -> String {
        format!("srvtoolu_{}", Uuid::new_v4().simple())
    }
}

/// Deterministic generator for tests: ids carry a monotonically increasing
/// counter instead of random material.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn message_id(&self) -> String {
        format!("msg_{}", self.bump())
    }

    fn tool_use_id(&self, tool_name: &str) -> String {
        format!("{}-{}", tool_name, self.bump())
    }

    fn server_tool_use_id(&self) -> String {
        format!("srvtoolu_{}", self.bump())
    }
}

// ============================================================================
// Tests
// ============================================================================
