//! Usage normalization.
//!
//! Upstream usage metadata reports cumulative totals per chunk, not deltas,
//! so each observation overwrites the previous one. Both translation paths
//! derive their final accounting from the same [`UsageTotals`] so the
//! numbers are bit-identical between streaming and non-streaming delivery.

use crate::translator::chunk::RawUsage;
use crate::translator::frame::UsagePayload;

/// Normalized token counts for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageTotals {
    /// Prompt tokens net of cached tokens. Deliberately unclamped: if the
    /// upstream reports more cached than prompt tokens, the negative value
    /// is passed through rather than silently corrected.
    pub prompt_tokens: i64,
    pub output_tokens: i64,
    pub reasoning_tokens: i64,
    pub total_tokens: i64,
    pub cached_tokens: i64,
}

impl UsageTotals {
    /// Normalize one upstream usage record.
    pub fn from_metadata(raw: &RawUsage) -> Self {
        let cached_tokens = raw.cached_tokens;
        let prompt_tokens = raw.prompt_tokens - cached_tokens;
        let mut output_tokens = raw.candidates_tokens;
        if output_tokens == 0 && raw.total_tokens > 0 {
            output_tokens = (raw.total_tokens - prompt_tokens - raw.thoughts_tokens).max(0);
        }
        UsageTotals {
            prompt_tokens,
            output_tokens,
            reasoning_tokens: raw.thoughts_tokens,
            total_tokens: raw.total_tokens,
            cached_tokens,
        }
    }

    /// Output tokens reported at finalize time: candidate plus reasoning
    /// tokens, falling back to `total − prompt` (clamped at zero) when both
    /// are zero but a total is known.
    pub fn final_output_tokens(&self) -> i64 {
        let output = self.output_tokens + self.reasoning_tokens;
        if output == 0 && self.total_tokens > 0 {
            return (self.total_tokens - self.prompt_tokens).max(0);
        }
        output
    }

    /// The usage object attached to the terminal frame / document. The
    /// cache-read field is present only when cached tokens were observed and
    /// nonzero.
    pub fn final_payload(&self) -> UsagePayload {
        UsagePayload {
            input_tokens: self.prompt_tokens,
            output_tokens: self.final_output_tokens(),
            cache_read_input_tokens: (self.cached_tokens > 0).then_some(self.cached_tokens),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
