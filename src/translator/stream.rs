//! Streaming translation state machine.
//!
//! [`StreamTranslator::translate_chunk`] consumes one upstream chunk (or the
//! terminal sentinel) together with a caller-owned [`StreamSession`] and
//! returns the target-protocol frames that became ready. Upstream chunk
//! boundaries do not align with target block boundaries, so the session
//! tracks which block is open and the translator closes/opens blocks as the
//! content kind changes mid-stream.
//!
//! The translator itself never blocks and holds no per-session state of its
//! own: independent sessions can be driven fully in parallel, provided each
//! session's chunks arrive in upstream order.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;

use crate::core::error::Result;
use crate::core::id::{IdGenerator, UuidIdGenerator};
use crate::core::signature_cache::{derive_session_key, global_signature_cache, SignatureCache};
use crate::translator::chunk::{ContentPart, UpstreamChunk};
use crate::translator::frame::{ContentBlock, Delta, FinalDelta, MessageStart, StreamFrame};
use crate::translator::session::{BlockKind, StreamSession};
use crate::translator::usage::UsageTotals;
use crate::translator::web_search::WebSearchState;

/// Model reported in the session-open frame when the first chunk carries
/// no `modelVersion`.
const FALLBACK_MODEL: &str = "claude-3-5-sonnet-20241022";

/// One unit of translator input.
#[derive(Debug, Clone)]
pub enum StreamInput {
    /// A raw upstream chunk payload (JSON bytes).
    Chunk(Bytes),
    /// The terminal sentinel: the upstream stream has ended.
    Done,
}

impl StreamInput {
    /// Classify a raw SSE data payload, recognizing the `[DONE]` sentinel.
    pub fn from_payload(payload: Bytes) -> Self {
        if payload.as_ref().trim_ascii() == b"[DONE]" {
            StreamInput::Done
        } else {
            StreamInput::Chunk(payload)
        }
    }
}

/// Stateless translator front-end; all per-turn state lives in the
/// [`StreamSession`] the caller owns.
pub struct StreamTranslator {
    ids: Arc<dyn IdGenerator>,
    cache: Arc<SignatureCache>,
}

impl StreamTranslator {
    /// Translator with the default id generator and the process-wide
    /// signature cache.
    pub fn new() -> Self {
        Self::with_parts(Arc::new(UuidIdGenerator), global_signature_cache())
    }

    /// Translator with injected collaborators (deterministic ids in tests,
    /// an isolated cache, …).
    pub fn with_parts(ids: Arc<dyn IdGenerator>, cache: Arc<SignatureCache>) -> Self {
        StreamTranslator { ids, cache }
    }

    /// Create the session state for one turn. The signature-cache key is
    /// derived from the *original* inbound request payload so it is stable
    /// across every chunk of the turn.
    pub fn begin_session(&self, original_request: &[u8]) -> StreamSession {
        StreamSession::new(derive_session_key(original_request))
    }

    /// Translate one unit of input, mutating the session in place.
    ///
    /// Returns the frames ready to send (possibly none). The only error is a
    /// payload that is not JSON at all; malformed fields inside valid JSON
    /// degrade to defaults and never abort the session.
    pub fn translate_chunk(
        &self,
        session: &mut StreamSession,
        input: StreamInput,
    ) -> Result<Vec<StreamFrame>> {
        match input {
            StreamInput::Done => Ok(self.finish(session)),
            StreamInput::Chunk(payload) => {
                let chunk = UpstreamChunk::from_slice(&payload)?;
                Ok(self.process_chunk(session, &chunk))
            }
        }
    }

    // ========================================================================
    // Chunk processing
    // ========================================================================

    fn process_chunk(&self, session: &mut StreamSession, chunk: &UpstreamChunk) -> Vec<StreamFrame> {
        let mut frames = Vec::new();

        // The session-open frame is emitted exactly once, seeded with
        // whatever identifying metadata the first chunk happens to carry.
        if !session.started {
            let provisional = chunk.provisional_usage.unwrap_or_default();
            let id = chunk
                .response_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| self.ids.message_id());
            let model = chunk
                .model_version
                .clone()
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| FALLBACK_MODEL.to_string());
            frames.push(StreamFrame::MessageStart {
                message: MessageStart::new(
                    id,
                    model,
                    provisional.prompt_tokens,
                    provisional.candidates_tokens,
                ),
            });
            session.started = true;
        }

        // Grounding data activates web-search mode for the rest of the
        // session and is merged chunk by chunk.
        if let Some(grounding) = &chunk.grounding {
            if session.web_search.is_none() {
                tracing::debug!("web search grounding mode activated");
                session.web_search = Some(WebSearchState::new(self.ids.server_tool_use_id()));
            }
            if let Some(state) = session.web_search.as_mut() {
                state.merge(grounding);
            }
        }

        let grounded = session.web_search.is_some();
        for part in &chunk.parts {
            match part {
                ContentPart::Reasoning { text, signature } => {
                    self.process_reasoning(session, &mut frames, text, signature.as_deref());
                }
                ContentPart::Text { text } if grounded => {
                    // Narrative text is deferred until the grounding blocks
                    // have been emitted.
                    if let Some(state) = session.web_search.as_mut() {
                        state.buffer_text(text);
                    }
                }
                ContentPart::Text { text } => {
                    self.process_text(session, &mut frames, text, chunk.finish_reason.is_some());
                }
                ContentPart::FunctionCall { .. } if grounded => {
                    // Grounded turns surface the search itself as the tool
                    // invocation; client-visible calls are not expected here.
                }
                ContentPart::FunctionCall { name, args } => {
                    self.process_function_call(session, &mut frames, name, args.as_ref());
                }
            }
        }

        if let Some(reason) = &chunk.finish_reason {
            session.finish_reason = Some(reason.clone());
        }
        if let Some(raw) = &chunk.usage {
            session.usage = Some(UsageTotals::from_metadata(raw));
        }

        if session.finish_reason.is_some() && session.usage.is_some() {
            self.finalize(session, &mut frames, false);
        }

        frames
    }

    fn process_reasoning(
        &self,
        session: &mut StreamSession,
        frames: &mut Vec<StreamFrame>,
        text: &str,
        signature: Option<&str>,
    ) {
        if let Some(signature) = signature {
            // The signature closes over all reasoning text accumulated since
            // the last attach; correlate the pair through the cache.
            if !session.session_key.is_empty() && !session.reasoning_buffer.is_empty() {
                self.cache
                    .put(&session.session_key, &session.reasoning_buffer, signature);
                session.reasoning_buffer.clear();
            }
            frames.push(StreamFrame::ContentBlockDelta {
                index: session.block_index,
                delta: Delta::SignatureDelta {
                    signature: signature.to_string(),
                },
            });
            session.content_emitted = true;
            return;
        }

        if session.block_kind == BlockKind::Thinking {
            session.reasoning_buffer.push_str(text);
            frames.push(StreamFrame::ContentBlockDelta {
                index: session.block_index,
                delta: Delta::ThinkingDelta {
                    thinking: text.to_string(),
                },
            });
            session.content_emitted = true;
            return;
        }

        self.close_open_block(session, frames);
        frames.push(StreamFrame::ContentBlockStart {
            index: session.block_index,
            content_block: ContentBlock::thinking(""),
        });
        frames.push(StreamFrame::ContentBlockDelta {
            index: session.block_index,
            delta: Delta::ThinkingDelta {
                thinking: text.to_string(),
            },
        });
        session.block_kind = BlockKind::Thinking;
        session.content_emitted = true;
        session.reasoning_buffer.clear();
        session.reasoning_buffer.push_str(text);
    }

    fn process_text(
        &self,
        session: &mut StreamSession,
        frames: &mut Vec<StreamFrame>,
        text: &str,
        chunk_has_finish: bool,
    ) {
        // An empty part on a finishing chunk carries nothing worth a block.
        if text.is_empty() && chunk_has_finish {
            return;
        }

        if session.block_kind == BlockKind::Text {
            frames.push(StreamFrame::ContentBlockDelta {
                index: session.block_index,
                delta: Delta::TextDelta {
                    text: text.to_string(),
                },
            });
            session.content_emitted = true;
            return;
        }

        // Empty text outside an open text block is a no-op; the upstream may
        // still finish the turn with more content.
        if text.is_empty() {
            return;
        }

        self.close_open_block(session, frames);
        frames.push(StreamFrame::ContentBlockStart {
            index: session.block_index,
            content_block: ContentBlock::text(""),
        });
        frames.push(StreamFrame::ContentBlockDelta {
            index: session.block_index,
            delta: Delta::TextDelta {
                text: text.to_string(),
            },
        });
        session.block_kind = BlockKind::Text;
        session.content_emitted = true;
    }

    fn process_function_call(
        &self,
        session: &mut StreamSession,
        frames: &mut Vec<StreamFrame>,
        name: &str,
        args: Option<&serde_json::Value>,
    ) {
        session.tool_use_observed = true;
        self.close_open_block(session, frames);

        frames.push(StreamFrame::ContentBlockStart {
            index: session.block_index,
            content_block: ContentBlock::ToolUse {
                id: self.ids.tool_use_id(name),
                name: name.to_string(),
                input: json!({}),
            },
        });
        if let Some(args) = args {
            // Arguments arrive whole, not incrementally: one atomic fragment.
            frames.push(StreamFrame::ContentBlockDelta {
                index: session.block_index,
                delta: Delta::InputJsonDelta {
                    partial_json: serde_json::to_string(args).unwrap_or_default(),
                },
            });
        }
        session.block_kind = BlockKind::ToolUse;
        session.content_emitted = true;
    }

    fn close_open_block(&self, session: &mut StreamSession, frames: &mut Vec<StreamFrame>) {
        if session.block_kind == BlockKind::None {
            return;
        }
        frames.push(StreamFrame::ContentBlockStop {
            index: session.block_index,
        });
        session.block_index += 1;
        if session.block_kind == BlockKind::Thinking {
            session.reasoning_buffer.clear();
        }
        session.block_kind = BlockKind::None;
    }

    // ========================================================================
    // Finalization
    // ========================================================================

    fn finish(&self, session: &mut StreamSession) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        // An all-empty turn produces nothing, not a synthesized close.
        if !session.content_emitted {
            return frames;
        }
        self.finalize(session, &mut frames, true);
        frames.push(StreamFrame::MessageStop);
        frames
    }

    fn finalize(&self, session: &mut StreamSession, frames: &mut Vec<StreamFrame>, force: bool) {
        if session.final_events_sent {
            return;
        }
        if session.usage.is_none() && !force {
            return;
        }
        if !session.content_emitted && session.web_search.is_none() {
            return;
        }

        self.close_open_block(session, frames);

        if let Some(state) = session.web_search.clone() {
            let mut index = session.block_index;
            state.emit_stream_blocks(&mut index, frames);
            session.block_index = index;
            session.content_emitted = true;
        }

        let stop_reason =
            resolve_stop_reason(session.tool_use_observed, session.finish_reason.as_deref());
        let totals = session.usage.unwrap_or_default();
        frames.push(StreamFrame::MessageDelta {
            delta: FinalDelta {
                stop_reason: stop_reason.to_string(),
                stop_sequence: None,
            },
            usage: totals.final_payload(),
        });
        session.final_events_sent = true;
    }
}

impl Default for StreamTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Map the upstream finish reason to the target stop reason. Tool use
/// anywhere in the turn wins outright.
pub(crate) fn resolve_stop_reason(tool_use: bool, finish_reason: Option<&str>) -> &'static str {
    if tool_use {
        return "tool_use";
    }
    match finish_reason {
        Some("MAX_TOKENS") => "max_tokens",
        // STOP, FINISH_REASON_UNSPECIFIED, UNKNOWN, anything else.
        _ => "end_turn",
    }
}

// ============================================================================
// Tests
// ============================================================================
