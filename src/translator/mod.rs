//! Response translation between the Gemini chunk protocol and the Claude
//! Code streaming contract.
//!
//! # Architecture
//!
//! ```text
//! upstream chunk (JSON bytes)
//!     ↓
//! [chunk]      ← lenient parse into a typed intermediate representation
//!     ↓
//! [stream]     ← per-session state machine: block sequencing, finalize
//!     ↓
//! [frame]      ← discrete target-protocol frames, serialized to SSE
//! ```
//!
//! The streaming path ([`StreamTranslator`]) consumes one chunk at a time
//! together with a caller-owned [`StreamSession`] and returns the frames that
//! became ready. The one-shot path ([`NonStreamTranslator`]) consumes a
//! single complete document and returns a [`MessageDocument`]. Both share the
//! part classification in [`chunk`], the usage normalization in [`usage`],
//! and the grounding sub-machine in [`web_search`], so the final stop reason
//! and usage figures are identical between them.

pub mod chunk;
pub mod frame;
pub mod non_stream;
pub mod session;
pub mod stream;
pub mod usage;
pub mod web_search;

pub use chunk::{ContentPart, GroundingDelta, GroundingSupport, RawUsage, UpstreamChunk};
pub use frame::{
    Citation, ContentBlock, Delta, FinalDelta, MessageDocument, MessageStart, SearchResult,
    StreamFrame, UsagePayload,
};
pub use non_stream::NonStreamTranslator;
pub use session::{BlockKind, StreamSession};
pub use stream::{StreamInput, StreamTranslator};
pub use usage::UsageTotals;
pub use web_search::WebSearchState;
