//! Per-turn streaming session state.
//!
//! One [`StreamSession`] exists per logical conversation turn. It is owned by
//! the caller but opaque outside this subsystem: every mutation happens in
//! the streaming translator. Invariants maintained across chunks:
//!
//! - `block_index` only ever increases
//! - at most one block is open between chunks
//! - `final_events_sent` flips false → true exactly once
//! - the reasoning accumulator is non-empty only while a thinking block is
//!   open
//! - web-search mode, once activated, stays active for the session

use crate::translator::usage::UsageTotals;
use crate::translator::web_search::WebSearchState;

/// Which kind of target block is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockKind {
    #[default]
    None,
    Text,
    Thinking,
    ToolUse,
}

/// Mutable state for one streaming turn.
#[derive(Debug, Default)]
pub struct StreamSession {
    /// Whether the session-open frame has been emitted.
    pub(crate) started: bool,
    /// Currently open block kind.
    pub(crate) block_kind: BlockKind,
    /// Index of the currently open (or next) block; monotonic.
    pub(crate) block_index: usize,
    /// Last finish reason reported by the upstream, if any.
    pub(crate) finish_reason: Option<String>,
    /// Normalized usage; `None` until usage metadata is first observed.
    pub(crate) usage: Option<UsageTotals>,
    /// Idempotence guard for the terminal frames.
    pub(crate) final_events_sent: bool,
    /// Forces the terminal stop reason to `tool_use`.
    pub(crate) tool_use_observed: bool,
    /// Whether any content frame has been emitted this turn.
    pub(crate) content_emitted: bool,
    /// Reasoning text accumulated since the last signature attach or block
    /// transition.
    pub(crate) reasoning_buffer: String,
    /// Signature-cache key derived from the original inbound request.
    pub(crate) session_key: String,
    /// Grounding sub-machine state; `Some` once web-search mode activates.
    pub(crate) web_search: Option<WebSearchState>,
}

impl StreamSession {
    /// Create the state for a fresh turn. `session_key` may be empty, in
    /// which case signature caching is disabled for the turn.
    pub fn new(session_key: String) -> Self {
        StreamSession {
            session_key,
            ..Default::default()
        }
    }

    /// Whether the terminal frames have been emitted.
    pub fn finalized(&self) -> bool {
        self.final_events_sent
    }

    /// Whether grounding mode is active.
    pub fn web_search_active(&self) -> bool {
        self.web_search.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
